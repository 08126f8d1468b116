use super::reference::ReferenceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    Never,
    Always,
    OnCreate,
}

impl Required {
    pub fn applies(self, creating: bool) -> bool {
        match self {
            Required::Never => false,
            Required::Always => true,
            Required::OnCreate => creating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Choice(&'static [&'static str]),
}

/// Value computed at save time when the field is left blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derive {
    /// `MATUTINO` before noon, `VESPERTINO` after, from an `HH:MM` field.
    ShiftFromTime(&'static str),
}

/// Where a dependent collection's visible options come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    None,
    /// Whole catalog filtered by the named single-select picker.
    Picker(&'static str),
    /// Whole catalog filtered by every id of the named association.
    Association(&'static str),
    /// Fetched per selection of the named picker (cache scope = its id).
    ScopedByPicker(&'static str),
}

impl Cascade {
    pub fn parent(self) -> Option<&'static str> {
        match self {
            Cascade::None => None,
            Cascade::Picker(p) | Cascade::Association(p) | Cascade::ScopedByPicker(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Key in the server's entity JSON.
    pub inbound: &'static str,
    pub kind: FieldKind,
    pub required: Required,
    pub admin_only: bool,
    /// Display-only fields are loaded but never sent.
    pub write: bool,
    pub derive: Option<Derive>,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            inbound: name,
            kind: FieldKind::Text,
            required: Required::Never,
            admin_only: false,
            write: true,
            derive: None,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            kind: FieldKind::Integer,
            ..Self::text(name)
        }
    }

    pub const fn choice(name: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            kind: FieldKind::Choice(choices),
            ..Self::text(name)
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: Required::Always,
            ..self
        }
    }

    pub const fn required_on_create(self) -> Self {
        Self {
            required: Required::OnCreate,
            ..self
        }
    }

    pub const fn admin_only(self) -> Self {
        Self {
            admin_only: true,
            ..self
        }
    }

    pub const fn display_only(self) -> Self {
        Self {
            write: false,
            ..self
        }
    }

    pub const fn derived(self, derive: Derive) -> Self {
        Self {
            derive: Some(derive),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PickerSpec {
    pub name: &'static str,
    /// Payload key.
    pub wire: &'static str,
    /// Key of the referenced id in the server's entity JSON.
    pub inbound: &'static str,
    pub kind: ReferenceKind,
    pub cascade: Cascade,
    pub required: Required,
    pub admin_only: bool,
    /// Preselect the first option when a new screen opens.
    pub default_first: bool,
    /// Entity keys used to build a pinned option when the loaded id is
    /// missing from the collection.
    pub pin_display: &'static [&'static str],
}

impl PickerSpec {
    pub const fn new(
        name: &'static str,
        wire: &'static str,
        kind: ReferenceKind,
    ) -> Self {
        Self {
            name,
            wire,
            inbound: wire,
            kind,
            cascade: Cascade::None,
            required: Required::Always,
            admin_only: false,
            default_first: false,
            pin_display: &[],
        }
    }

    pub const fn inbound(self, inbound: &'static str) -> Self {
        Self { inbound, ..self }
    }

    pub const fn cascade(self, cascade: Cascade) -> Self {
        Self { cascade, ..self }
    }

    pub const fn required_on_create(self) -> Self {
        Self {
            required: Required::OnCreate,
            ..self
        }
    }

    pub const fn admin_only(self) -> Self {
        Self {
            admin_only: true,
            ..self
        }
    }

    pub const fn default_first(self) -> Self {
        Self {
            default_first: true,
            ..self
        }
    }

    pub const fn pinned_from(self, keys: &'static [&'static str]) -> Self {
        Self {
            pin_display: keys,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssociationSpec {
    pub name: &'static str,
    pub wire: &'static str,
    /// Array key in the entity JSON, e.g. `subjects`.
    pub inbound: &'static str,
    /// Id key inside each array element, e.g. `subjectId`.
    pub inbound_id: &'static str,
    pub kind: ReferenceKind,
    pub cascade: Cascade,
    pub admin_only: bool,
}

impl AssociationSpec {
    pub const fn new(
        name: &'static str,
        wire: &'static str,
        kind: ReferenceKind,
        inbound: &'static str,
        inbound_id: &'static str,
    ) -> Self {
        Self {
            name,
            wire,
            inbound,
            inbound_id,
            kind,
            cascade: Cascade::None,
            admin_only: false,
        }
    }

    pub const fn cascade(self, cascade: Cascade) -> Self {
        Self { cascade, ..self }
    }

    pub const fn admin_only(self) -> Self {
        Self {
            admin_only: true,
            ..self
        }
    }
}

/// Everything the generic controller needs to drive one REST resource.
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub name: &'static str,
    pub path: &'static str,
    /// Singular noun used in user-facing messages.
    pub noun: &'static str,
    pub fields: &'static [FieldSpec],
    pub pickers: &'static [PickerSpec],
    pub associations: &'static [AssociationSpec],
    /// Keys projected from list rows.
    pub columns: &'static [&'static str],
    /// `(query key, picker)`: the list is filtered by that picker's value.
    pub list_filter: Option<(&'static str, &'static str)>,
    /// Entities are loaded from the cached list rows instead of `GET path/id`.
    pub load_from_list: bool,
    /// Non-admin sessions edit their own record through `path/me`.
    pub self_endpoint: bool,
    pub admin_only_delete: bool,
    /// On update, blank values are left out of the payload.
    pub omit_blank_on_update: bool,
    /// Read-only child rows shown with the loaded entity.
    pub details: Option<&'static str>,
    /// Reference kinds whose cached copies go stale when this resource changes.
    pub invalidates: &'static [ReferenceKind],
}

impl ResourceDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn picker(&self, name: &str) -> Option<&PickerSpec> {
        self.pickers.iter().find(|p| p.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationSpec> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Reference kinds loaded as whole catalogs for this screen.
    pub fn catalog_kinds(&self, is_admin: bool) -> Vec<ReferenceKind> {
        let mut out: Vec<ReferenceKind> = Vec::new();
        let pickers = self.pickers.iter().map(|p| (p.kind, p.cascade));
        let assocs = self.associations.iter().map(|a| (a.kind, a.cascade));
        for (kind, cascade) in pickers.chain(assocs) {
            if matches!(cascade, Cascade::ScopedByPicker(_)) {
                continue;
            }
            if kind.admin_only() && !is_admin {
                continue;
            }
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
        out
    }
}
