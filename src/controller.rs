use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::forms::cache::ReferenceCache;
use crate::forms::cascade::{reselect, visible_options, visible_options_any};
use crate::forms::descriptor::{AssociationSpec, Cascade, FieldKind, PickerSpec, ResourceDescriptor};
use crate::forms::error::FormError;
use crate::forms::label::PickerOption;
use crate::forms::payload;
use crate::forms::reconcile::{self, AssociationSet, Projection};
use crate::forms::reference::{json_int, json_text, ReferenceEntity, ReferenceKind};
use crate::forms::state::{FormMode, FormState, FormStatus};
use crate::resources::Screen;
use crate::session::Role;
use crate::transport::{Method, Transport};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: &'static str,
    pub value: String,
    pub required: bool,
    pub numeric: bool,
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<&'static [&'static str]>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerView {
    pub name: &'static str,
    pub options: Vec<PickerOption>,
    pub selected: Option<i64>,
    pub selected_label: Option<String>,
    pub required: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationView {
    pub name: &'static str,
    pub options: Vec<PickerOption>,
    #[serde(flatten)]
    pub projection: Projection,
    pub editable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub screen: &'static str,
    pub mode: FormMode,
    pub status: FormStatus,
    pub entity_id: Option<i64>,
    pub dirty: bool,
    pub fields: Vec<FieldView>,
    pub pickers: Vec<PickerView>,
    pub associations: Vec<AssociationView>,
    pub rows: Vec<Value>,
    pub details: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    pub id: i64,
    /// The mutation went through but reloading the screen afterwards failed.
    pub refresh_error: Option<String>,
}

/// One open screen: its descriptor, reference cache, list rows and edit session.
pub struct ModuleController {
    desc: &'static ResourceDescriptor,
    role: Role,
    cache: ReferenceCache,
    form: FormState,
    rows: Vec<Value>,
    pinned: BTreeMap<&'static str, Vec<ReferenceEntity>>,
    details: Vec<Value>,
}

fn unknown(what: &'static str, name: &str) -> FormError {
    FormError::Unknown {
        what,
        name: name.to_string(),
    }
}

impl ModuleController {
    pub fn new(screen: Screen, role: Role) -> Self {
        Self {
            desc: screen.descriptor(),
            role,
            cache: ReferenceCache::new(),
            form: FormState::new(),
            rows: Vec::new(),
            pinned: BTreeMap::new(),
            details: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Non-admin self screens have no list; they edit `path/me`.
    fn shows_list(&self) -> bool {
        self.is_admin() || !self.desc.self_endpoint
    }

    pub fn open(&mut self, t: &mut dyn Transport) -> Result<(), FormError> {
        debug!(screen = self.desc.name, role = ?self.role, "opening screen");
        self.refresh(t)
    }

    /// Retries whatever reference scopes are still missing, then reloads the
    /// list (or the own record on a self screen that has none yet).
    pub fn refresh(&mut self, t: &mut dyn Transport) -> Result<(), FormError> {
        self.ensure_references(t)?;
        self.seed_defaults();
        if self.shows_list() {
            self.reload_list(t)
        } else if self.form.entity_id().is_none() {
            self.load_self(t)
        } else {
            Ok(())
        }
    }

    /// Loads every reference scope the current form needs; cached scopes
    /// cost nothing.
    pub fn ensure_references(&mut self, t: &mut dyn Transport) -> Result<(), FormError> {
        for kind in self.desc.catalog_kinds(self.is_admin()) {
            self.cache.load(t, kind, None)?;
        }
        for (kind, key) in self.scoped_needs() {
            self.cache.load(t, kind, Some(key))?;
        }
        Ok(())
    }

    /// Loads the scopes keyed by `parent` for a value it is about to take.
    fn preload_scopes(
        &mut self,
        t: &mut dyn Transport,
        parent: &str,
        key: i64,
    ) -> Result<(), FormError> {
        let pickers = self.desc.pickers.iter().map(|p| (p.kind, p.cascade));
        let assocs = self.desc.associations.iter().map(|a| (a.kind, a.cascade));
        let kinds: Vec<ReferenceKind> = pickers
            .chain(assocs)
            .filter(|(_, c)| matches!(c, Cascade::ScopedByPicker(p) if *p == parent))
            .map(|(kind, _)| kind)
            .collect();
        for kind in kinds {
            self.cache.load(t, kind, Some(key))?;
        }
        Ok(())
    }

    fn scoped_needs(&self) -> Vec<(ReferenceKind, i64)> {
        let pickers = self.desc.pickers.iter().map(|p| (p.kind, p.cascade));
        let assocs = self.desc.associations.iter().map(|a| (a.kind, a.cascade));
        pickers
            .chain(assocs)
            .filter_map(|(kind, cascade)| match cascade {
                Cascade::ScopedByPicker(parent) => self.form.pick(parent).map(|k| (kind, k)),
                _ => None,
            })
            .collect()
    }

    pub fn invalidate(&mut self, kinds: &[ReferenceKind]) {
        for kind in kinds {
            self.cache.invalidate(*kind, None);
        }
    }

    fn seed_defaults(&mut self) {
        let desc = self.desc;
        for p in desc.pickers.iter().filter(|p| p.default_first) {
            if self.form.pick(p.name).is_none() {
                let first = self.picker_options(p).first().map(|e| e.id);
                self.form.seed_pick(p.name, first);
            }
        }
    }

    pub fn reload_list(&mut self, t: &mut dyn Transport) -> Result<(), FormError> {
        if !self.shows_list() {
            self.rows.clear();
            return Ok(());
        }
        let mut query = Vec::new();
        if let Some((key, picker)) = self.desc.list_filter {
            if let Some(k) = self.form.pick(picker) {
                query.push((key.to_string(), k.to_string()));
            }
        }
        match t.get(self.desc.path, &query)? {
            Value::Array(rows) => {
                self.rows = rows;
                Ok(())
            }
            _ => Err(FormError::InvalidResponse(format!(
                "{} list is not an array",
                self.desc.name
            ))),
        }
    }

    pub fn load(&mut self, t: &mut dyn Transport, id: i64) -> Result<(), FormError> {
        let desc = self.desc;
        let data = if desc.load_from_list {
            self.rows
                .iter()
                .find(|r| r.get("id").and_then(json_int) == Some(id))
                .cloned()
                .ok_or(FormError::NotFound {
                    noun: desc.noun,
                    id,
                })?
        } else {
            t.get(&format!("{}/{}", desc.path, id), &[])?
        };
        self.apply_entity(t, &data)
    }

    pub fn load_self(&mut self, t: &mut dyn Transport) -> Result<(), FormError> {
        let data = t.get(&format!("{}/me", self.desc.path), &[])?;
        self.apply_entity(t, &data)
    }

    fn apply_entity(&mut self, t: &mut dyn Transport, data: &Value) -> Result<(), FormError> {
        let desc = self.desc;
        let id = data
            .get("id")
            .and_then(json_int)
            .ok_or_else(|| FormError::InvalidResponse(format!("{} without id", desc.noun)))?;

        let fields = desc
            .fields
            .iter()
            .map(|f| (f.name.to_string(), json_text(data.get(f.inbound))))
            .collect();
        let picks = desc
            .pickers
            .iter()
            .map(|p| (p.name.to_string(), data.get(p.inbound).and_then(json_int)))
            .collect();
        let associations = desc
            .associations
            .iter()
            .map(|a| {
                let ids = data
                    .get(a.inbound)
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|it| it.get(a.inbound_id).and_then(json_int))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                (a.name.to_string(), AssociationSet::from_ids(ids))
            })
            .collect();

        self.form.load(id, fields, picks, associations);
        self.details = desc
            .details
            .and_then(|key| data.get(key))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(screen = desc.name, id, "entity loaded");

        let refs = self.ensure_references(t);
        self.pinned.clear();
        for p in desc.pickers.iter().filter(|p| !p.pin_display.is_empty()) {
            self.pin_missing(p, data);
        }
        refs
    }

    /// Keeps a loaded reference selectable when its collection omits it (the
    /// unassigned-user list never contains the user already assigned).
    fn pin_missing(&mut self, p: &'static PickerSpec, data: &Value) {
        let Some(id) = self.form.pick(p.name) else {
            return;
        };
        if self.picker_options(p).iter().any(|e| e.id == id) {
            return;
        }
        let display = p
            .pin_display
            .iter()
            .map(|k| json_text(data.get(*k)))
            .collect();
        self.pinned.entry(p.name).or_default().push(ReferenceEntity {
            id,
            display,
            cascade_key: None,
        });
    }

    pub fn new_form(&mut self) {
        let keep = self
            .desc
            .list_filter
            .map(|(_, picker)| (picker, self.form.pick(picker)));
        self.form.reset();
        self.details.clear();
        self.pinned.clear();
        if let Some((picker, value)) = keep {
            self.form.seed_pick(picker, value);
        }
        self.seed_defaults();
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        let desc = self.desc;
        let spec = desc.field(name).ok_or_else(|| unknown("field", name))?;
        if !spec.write {
            return Err(FormError::Forbidden(format!("{name} is read-only")));
        }
        self.ensure_editable(spec.name, spec.admin_only)?;
        self.form.set_field(spec.name, value)
    }

    pub fn select(
        &mut self,
        t: &mut dyn Transport,
        picker: &str,
        id: Option<i64>,
    ) -> Result<(), FormError> {
        let desc = self.desc;
        let spec = desc.picker(picker).ok_or_else(|| unknown("picker", picker))?;
        self.ensure_editable(spec.name, spec.admin_only)?;
        // every load happens before the form changes, so a failed load
        // leaves parent and dependents as they were
        self.ensure_references(t)?;
        if let Some(id) = id {
            if !self.picker_options(spec).iter().any(|e| e.id == id) {
                return Err(FormError::NotVisible {
                    relation: spec.name.to_string(),
                    id,
                });
            }
            self.preload_scopes(t, spec.name, id)?;
        }
        self.form.set_pick(spec.name, id)?;
        self.cascade_from(spec.name)?;
        if desc.list_filter.is_some_and(|(_, p)| p == spec.name) {
            self.reload_list(t)?;
        }
        Ok(())
    }

    pub fn toggle(
        &mut self,
        t: &mut dyn Transport,
        relation: &str,
        id: i64,
        selected: bool,
    ) -> Result<bool, FormError> {
        let desc = self.desc;
        let spec = desc
            .association(relation)
            .ok_or_else(|| unknown("relation", relation))?;
        self.ensure_editable(spec.name, spec.admin_only)?;
        self.ensure_references(t)?;
        self.ensure_visible(spec, &[id])?;
        let changed = self
            .form
            .edit_association(spec.name, |set| reconcile::toggle(set, id, selected))?;
        self.cascade_from(spec.name)?;
        Ok(changed)
    }

    /// Replaces what is selected among the visible options of `relation`.
    pub fn set_selection(
        &mut self,
        t: &mut dyn Transport,
        relation: &str,
        ids: &[i64],
    ) -> Result<bool, FormError> {
        let desc = self.desc;
        let spec = desc
            .association(relation)
            .ok_or_else(|| unknown("relation", relation))?;
        self.ensure_editable(spec.name, spec.admin_only)?;
        self.ensure_references(t)?;
        self.ensure_visible(spec, ids)?;
        let visible: Vec<ReferenceEntity> = self
            .association_options(spec)
            .into_iter()
            .cloned()
            .collect();
        let visible_refs: Vec<&ReferenceEntity> = visible.iter().collect();
        let changed = self.form.edit_association(spec.name, |set| {
            reconcile::apply_visible_selection(set, &visible_refs, ids)
        })?;
        self.cascade_from(spec.name)?;
        Ok(changed)
    }

    /// Re-derives dependent single-select pickers after `parent` changed.
    fn cascade_from(&mut self, parent: &str) -> Result<(), FormError> {
        let desc = self.desc;
        for dep in desc.pickers.iter().filter(|p| p.cascade.parent() == Some(parent)) {
            let visible = self.picker_options(dep);
            let next = reselect(self.form.pick(dep.name), &visible);
            self.form.set_pick(dep.name, next)?;
            self.cascade_from(dep.name)?;
        }
        Ok(())
    }

    pub fn save(&mut self, t: &mut dyn Transport) -> Result<MutationOutcome, FormError> {
        let desc = self.desc;
        let body = Value::Object(payload::build(desc, &self.form, self.is_admin())?);
        self.form.begin_save()?;

        let current = self.form.entity_id();
        let result = match current {
            None => t.request(Method::Post, desc.path, &[], Some(&body)),
            Some(id) => t.request(Method::Put, &format!("{}/{}", desc.path, id), &[], Some(&body)),
        };
        let saved = result.map_err(FormError::from).and_then(|resp| {
            resp.get("id")
                .and_then(json_int)
                .or(current)
                .ok_or_else(|| FormError::InvalidResponse(format!("saved {} without id", desc.noun)))
        });
        let id = match saved {
            Ok(id) => id,
            Err(e) => {
                warn!(screen = desc.name, error = %e, "save failed");
                self.form.save_failed();
                return Err(e);
            }
        };

        self.form.save_succeeded(id);
        info!(screen = desc.name, id, created = current.is_none(), "saved");
        let refresh_error = self.refresh_after_mutation(t, Some(id)).err();
        Ok(MutationOutcome {
            id,
            refresh_error: refresh_error.map(|e| e.to_string()),
        })
    }

    pub fn delete(&mut self, t: &mut dyn Transport) -> Result<MutationOutcome, FormError> {
        let desc = self.desc;
        if desc.admin_only_delete && !self.is_admin() {
            return Err(FormError::Forbidden(format!(
                "only an administrator can delete a {}",
                desc.noun
            )));
        }
        let Some(id) = self.form.entity_id() else {
            return Err(FormError::NoSelection(format!("select a {}", desc.noun)));
        };
        t.request(Method::Delete, &format!("{}/{}", desc.path, id), &[], None)?;
        info!(screen = desc.name, id, "deleted");

        self.new_form();
        let refresh_error = self.refresh_after_mutation(t, None).err();
        Ok(MutationOutcome {
            id,
            refresh_error: refresh_error.map(|e| e.to_string()),
        })
    }

    fn refresh_after_mutation(
        &mut self,
        t: &mut dyn Transport,
        reload: Option<i64>,
    ) -> Result<(), FormError> {
        let kinds = self.desc.invalidates;
        self.invalidate(kinds);
        self.ensure_references(t)?;
        self.reload_list(t)?;
        if let Some(id) = reload {
            self.load(t, id)?;
        }
        Ok(())
    }

    fn ensure_editable(&self, name: &str, admin_only: bool) -> Result<(), FormError> {
        if admin_only && !self.is_admin() {
            return Err(FormError::Forbidden(format!(
                "{name} can only be changed by an administrator"
            )));
        }
        Ok(())
    }

    fn ensure_visible(&self, spec: &AssociationSpec, ids: &[i64]) -> Result<(), FormError> {
        let visible = self.association_options(spec);
        match ids.iter().find(|id| !visible.iter().any(|e| e.id == **id)) {
            Some(id) => Err(FormError::NotVisible {
                relation: spec.name.to_string(),
                id: *id,
            }),
            None => Ok(()),
        }
    }

    fn cascade_options(&self, kind: ReferenceKind, cascade: Cascade) -> Vec<&ReferenceEntity> {
        let catalog = || self.cache.get(kind, None).unwrap_or(&[]);
        match cascade {
            Cascade::None => catalog().iter().collect(),
            Cascade::Picker(parent) => visible_options(catalog(), self.form.pick(parent)),
            Cascade::Association(parent) => {
                let parents = self
                    .form
                    .association(parent)
                    .map(AssociationSet::ids)
                    .unwrap_or(&[]);
                visible_options_any(catalog(), parents)
            }
            Cascade::ScopedByPicker(parent) => match self.form.pick(parent) {
                Some(k) => visible_options(self.cache.get(kind, Some(k)).unwrap_or(&[]), Some(k)),
                None => Vec::new(),
            },
        }
    }

    fn picker_options(&self, p: &PickerSpec) -> Vec<&ReferenceEntity> {
        let mut out = self.cascade_options(p.kind, p.cascade);
        if let Some(extra) = self.pinned.get(p.name) {
            for e in extra {
                if !out.iter().any(|o| o.id == e.id) {
                    out.push(e);
                }
            }
        }
        out
    }

    fn association_options(&self, a: &AssociationSpec) -> Vec<&ReferenceEntity> {
        self.cascade_options(a.kind, a.cascade)
    }

    pub fn view(&self) -> FormView {
        let desc = self.desc;
        let admin = self.is_admin();
        let creating = self.form.entity_id().is_none();
        let empty = AssociationSet::default();

        let fields = desc
            .fields
            .iter()
            .map(|f| FieldView {
                name: f.name,
                value: self.form.field(f.name).to_string(),
                required: f.required.applies(creating),
                numeric: f.kind == FieldKind::Integer,
                editable: f.write && (admin || !f.admin_only),
                choices: match f.kind {
                    FieldKind::Choice(c) => Some(c),
                    _ => None,
                },
            })
            .collect();

        let pickers = desc
            .pickers
            .iter()
            .map(|p| {
                let options: Vec<PickerOption> = self
                    .picker_options(p)
                    .into_iter()
                    .map(PickerOption::from)
                    .collect();
                let selected = self.form.pick(p.name);
                let selected_label = options
                    .iter()
                    .find(|o| Some(o.id) == selected)
                    .map(|o| o.label.clone());
                PickerView {
                    name: p.name,
                    options,
                    selected,
                    selected_label,
                    required: p.required.applies(creating),
                    editable: admin || !p.admin_only,
                }
            })
            .collect();

        let associations = desc
            .associations
            .iter()
            .map(|a| {
                let visible = self.association_options(a);
                let set = self.form.association(a.name).unwrap_or(&empty);
                AssociationView {
                    name: a.name,
                    projection: reconcile::reconcile(set, &visible),
                    options: visible.into_iter().map(PickerOption::from).collect(),
                    editable: admin || !a.admin_only,
                }
            })
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let projected = desc
                    .columns
                    .iter()
                    .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                    .collect();
                Value::Object(projected)
            })
            .collect();

        FormView {
            screen: desc.name,
            mode: self.form.mode(),
            status: self.form.status(),
            entity_id: self.form.entity_id(),
            dirty: self.form.is_dirty(),
            fields,
            pickers,
            associations,
            rows,
            details: self.details.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    fn backend() -> RecordingTransport {
        let mut t = RecordingTransport::default();
        t.respond(
            "GET /careers",
            json!([
                { "id": 1, "name": "CS", "semesters": 9 },
                { "id": 2, "name": "Law", "semesters": 10 }
            ]),
        )
        .respond(
            "GET /subjects",
            json!([
                { "id": 10, "name": "Algo", "careerId": 1, "careerName": "CS" },
                { "id": 11, "name": "Torts", "careerId": 2, "careerName": "Law" },
                { "id": 12, "name": "Compilers", "careerId": 1, "careerName": "CS" }
            ]),
        )
        .respond(
            "GET /subjects?careerId=1",
            json!([
                { "id": 10, "name": "Algo", "credits": 8, "semester": 1, "careerId": 1 },
                { "id": 12, "name": "Compilers", "credits": 6, "semester": 5, "careerId": 1 }
            ]),
        )
        .respond(
            "GET /subjects?careerId=2",
            json!([{ "id": 11, "name": "Torts", "credits": 5, "semester": 2, "careerId": 2 }]),
        )
        .respond(
            "GET /users/unassigned?role=TEACHER&entity=teachers",
            json!([{ "id": 71, "email": "new@school.mx", "username": "new" }]),
        )
        .respond(
            "GET /users/unassigned?role=STUDENT&entity=students",
            json!([{ "id": 81, "email": "kid@school.mx", "username": "kid" }]),
        )
        .respond(
            "GET /teachers",
            json!([{ "id": 7, "name": "Ada", "email": "ada@school.mx", "degree": "MAESTRIA" }]),
        )
        .respond(
            "GET /teachers/7",
            json!({
                "id": 7, "name": "Ada", "email": "ada@school.mx", "degree": "MAESTRIA",
                "user_id": 70,
                "careers": [{ "careerId": 1 }, { "careerId": 2 }],
                "subjects": [{ "subjectId": 10 }, { "subjectId": 11 }]
            }),
        )
        .respond("GET /teachers/me", json!({
            "id": 7, "name": "Ada", "email": "ada@school.mx", "degree": "MAESTRIA",
            "user_id": 70,
            "careers": [{ "careerId": 1 }],
            "subjects": [{ "subjectId": 10 }]
        }))
        .respond("PUT /teachers/7", json!({ "id": 7 }))
        .respond(
            "GET /students",
            json!([{ "id": 3, "name": "Luis", "email": "luis@school.mx", "status": "ACTIVE" }]),
        )
        .respond(
            "GET /students/3",
            json!({
                "id": 3, "name": "Luis", "email": "luis@school.mx", "status": "ACTIVE",
                "dateOfBirth": "2001-02-03", "userId": 80, "careerId": 1,
                "subjects": [{ "subjectId": 10 }]
            }),
        )
        .respond("PUT /students/3", json!({ "id": 3 }))
        .respond("GET /classrooms", json!([{ "id": 4, "name": "A-101", "building": "A" }]))
        .respond(
            "GET /schedules",
            json!([{ "id": 2, "time": "08:00", "shift": "MATUTINO" }]),
        )
        .respond("GET /groups", json!([]))
        .respond(
            "GET /groups/5",
            json!({
                "id": 5, "name": "G1", "careerId": 1, "subjectId": 10, "teacherId": 7,
                "classroomId": 4, "scheduleId": 2, "semester": 1, "maxStudents": 30,
                "students": [{ "studentId": 3, "name": "Luis", "status": "ACTIVE" }]
            }),
        );
        t
    }

    fn assoc<'a>(view: &'a FormView, name: &str) -> &'a AssociationView {
        view.associations
            .iter()
            .find(|a| a.name == name)
            .expect("association view")
    }

    fn picker<'a>(view: &'a FormView, name: &str) -> &'a PickerView {
        view.pickers.iter().find(|p| p.name == name).expect("picker view")
    }

    fn option_ids(options: &[PickerOption]) -> Vec<i64> {
        options.iter().map(|o| o.id).collect()
    }

    #[test]
    fn teacher_keeps_subjects_of_unfocused_careers_on_save() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Teachers, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 7).expect("load");

        let v = c.view();
        let subjects = assoc(&v, "subjects");
        assert_eq!(option_ids(&subjects.options), vec![10, 11, 12]);
        assert_eq!(subjects.projection.selected_ids, vec![10, 11]);
        assert_eq!(subjects.projection.selected_indices, vec![0, 1]);

        // focus career 1 only: subject 11 leaves the list but stays associated
        c.toggle(&mut t, "careers", 2, false).expect("toggle career");
        let v = c.view();
        let subjects = assoc(&v, "subjects");
        assert_eq!(option_ids(&subjects.options), vec![10, 12]);
        assert_eq!(subjects.projection.selected_ids, vec![10]);
        assert_eq!(subjects.projection.hidden_selected_ids, vec![11]);

        c.save(&mut t).expect("save");
        let body = t.last_body(Method::Put).expect("put body");
        assert_eq!(body["subjectIds"], json!([10, 11]));
        assert_eq!(body["careerIds"], json!([1]));
        assert_eq!(body["userId"], json!(70));
        assert_eq!(c.form().status(), FormStatus::Editing);
    }

    #[test]
    fn assigned_user_is_pinned_into_unassigned_options() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Teachers, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 7).expect("load");
        let v = c.view();
        let user = picker(&v, "user");
        assert_eq!(option_ids(&user.options), vec![71, 70]);
        assert_eq!(user.selected_label.as_deref(), Some("70 - ada@school.mx"));
    }

    #[test]
    fn deleting_without_selection_never_calls_transport() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Students, Role::Admin);
        c.open(&mut t).expect("open");
        let calls = t.calls.len();
        let err = c.delete(&mut t).expect_err("nothing selected");
        assert_eq!(err.code(), "no_selection");
        assert_eq!(err.to_string(), "select a student");
        assert_eq!(t.calls.len(), calls);
    }

    #[test]
    fn student_career_change_refilters_and_caches_scopes() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Students, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 3).expect("load");
        assert_eq!(t.count("GET /subjects?careerId=1"), 1);

        c.select(&mut t, "career", Some(2)).expect("career 2");
        let v = c.view();
        let subjects = assoc(&v, "subjects");
        assert_eq!(option_ids(&subjects.options), vec![11]);
        assert!(subjects.projection.selected_ids.is_empty());
        assert_eq!(subjects.projection.hidden_selected_ids, vec![10]);

        c.toggle(&mut t, "subjects", 11, true).expect("pick torts");
        c.select(&mut t, "career", Some(1)).expect("back to career 1");
        assert_eq!(t.count("GET /subjects?careerId=1"), 1);
        assert_eq!(t.count("GET /subjects?careerId=2"), 1);
        let v = c.view();
        assert_eq!(assoc(&v, "subjects").projection.selected_ids, vec![10]);

        c.save(&mut t).expect("save");
        let body = t.last_body(Method::Put).expect("put body");
        assert_eq!(body["subjects"], json!([10, 11]));
        assert_eq!(body["careerId"], json!(1));
        assert_eq!(body["userId"], json!(80));
    }

    #[test]
    fn toggling_an_invisible_option_is_rejected() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Students, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 3).expect("load");
        let err = c.toggle(&mut t, "subjects", 11, true).expect_err("torts is career 2");
        assert_eq!(err.code(), "not_visible");
        assert!(!c.form().is_dirty());
    }

    #[test]
    fn group_subject_follows_career_without_stale_ids() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        c.open(&mut t).expect("open");
        assert!(picker(&c.view(), "subject").options.is_empty());

        c.select(&mut t, "career", Some(1)).expect("career 1");
        assert_eq!(c.form().pick("subject"), Some(10));
        c.select(&mut t, "subject", Some(12)).expect("compilers");

        c.select(&mut t, "career", Some(2)).expect("career 2");
        assert_eq!(c.form().pick("subject"), None);
        assert_eq!(option_ids(&picker(&c.view(), "subject").options), vec![11]);

        c.select(&mut t, "career", Some(1)).expect("career 1 again");
        assert_eq!(c.form().pick("subject"), Some(10));
    }

    #[test]
    fn invalid_group_is_rejected_before_any_request() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        c.open(&mut t).expect("open");
        c.set_field("semester", "2").expect("field");
        let calls = t.calls.len();
        let status = c.form().status();

        let err = c.save(&mut t).expect_err("name missing");
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(t.calls.len(), calls);
        assert_eq!(c.form().status(), status);
    }

    #[test]
    fn failed_update_leaves_form_dirty_for_retry() {
        let mut t = backend();
        t.fail("PUT /groups/5", 500, "database unavailable");
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 5).expect("load");
        assert_eq!(c.view().details.len(), 1);
        c.set_field("name", "G1-B").expect("field");

        let err = c.save(&mut t).expect_err("server error");
        assert_eq!(err.code(), "transport_failed");
        assert_eq!(c.form().status(), FormStatus::Dirty);
        assert_eq!(c.form().field("name"), "G1-B");
        assert_eq!(c.form().entity_id(), Some(5));

        t.respond("PUT /groups/5", json!({ "id": 5 }));
        c.save(&mut t).expect("retry");
        assert_eq!(c.form().status(), FormStatus::Editing);
    }

    #[test]
    fn reference_failure_is_reported_and_retryable() {
        let mut t = backend();
        t.fail("GET /teachers", 503, "busy");
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        let err = c.open(&mut t).expect_err("teachers down");
        assert_eq!(err.code(), "transport_failed");
        assert_eq!(option_ids(&picker(&c.view(), "career").options), vec![1, 2]);
        assert!(picker(&c.view(), "teacher").options.is_empty());

        t.respond("GET /teachers", json!([{ "id": 7, "name": "Ada" }]));
        c.ensure_references(&mut t).expect("retry");
        assert_eq!(option_ids(&picker(&c.view(), "teacher").options), vec![7]);
        assert_eq!(t.count("GET /careers"), 1);
    }

    #[test]
    fn teacher_session_edits_own_record_only() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Teachers, Role::Teacher);
        c.open(&mut t).expect("open");
        assert_eq!(c.form().entity_id(), Some(7));
        assert_eq!(t.count("GET /teachers"), 0);
        assert_eq!(t.count_path(Method::Get, "/users/unassigned"), 0);

        let err = c.toggle(&mut t, "subjects", 10, false).expect_err("admin only");
        assert_eq!(err.code(), "forbidden");
        let err = c.delete(&mut t).expect_err("admin only");
        assert_eq!(err.code(), "forbidden");

        c.set_field("degree", "DOCTORADO").expect("degree");
        c.save(&mut t).expect("save");
        let body = t.last_body(Method::Put).expect("put body");
        assert_eq!(body, &json!({ "name": "Ada", "degree": "DOCTORADO" }));
    }

    #[test]
    fn subjects_list_follows_career_filter() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Subjects, Role::Admin);
        c.open(&mut t).expect("open");
        assert_eq!(c.form().pick("career"), Some(1));
        assert!(!c.form().is_dirty());
        assert_eq!(c.rows().len(), 2);

        c.select(&mut t, "career", Some(2)).expect("career 2");
        assert_eq!(c.rows().len(), 1);

        c.load(&mut t, 11).expect("load from list");
        assert_eq!(c.form().field("credits"), "5");
        let err = c.load(&mut t, 99).expect_err("not listed");
        assert_eq!(err.code(), "not_found");

        c.new_form();
        assert_eq!(c.form().pick("career"), Some(2));
        assert_eq!(c.form().entity_id(), None);
    }

    #[test]
    fn invalidation_refetches_on_next_touch() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        c.open(&mut t).expect("open");
        c.invalidate(&[ReferenceKind::Careers]);
        assert!(picker(&c.view(), "career").options.is_empty());
        c.ensure_references(&mut t).expect("reload");
        assert_eq!(t.count("GET /careers"), 2);
        assert_eq!(t.count("GET /teachers"), 1);
    }

    #[test]
    fn edits_reload_kinds_dropped_by_another_screen() {
        let mut t = backend();
        let mut groups = ModuleController::new(Screen::Groups, Role::Admin);
        groups.open(&mut t).expect("open");
        groups.invalidate(&[ReferenceKind::Careers]);
        groups.select(&mut t, "career", Some(1)).expect("careers reloaded");
        assert_eq!(groups.form().pick("subject"), Some(10));
        assert_eq!(t.count("GET /careers"), 2);

        let mut teachers = ModuleController::new(Screen::Teachers, Role::Admin);
        teachers.open(&mut t).expect("open");
        teachers.load(&mut t, 7).expect("load");
        teachers.invalidate(&[ReferenceKind::Subjects]);
        assert!(teachers
            .toggle(&mut t, "subjects", 12, true)
            .expect("subjects reloaded"));
        teachers.invalidate(&[ReferenceKind::Subjects]);
        teachers
            .set_selection(&mut t, "subjects", &[10])
            .expect("subjects reloaded again");
        let v = teachers.view();
        assert_eq!(assoc(&v, "subjects").projection.selected_ids, vec![10]);
    }

    #[test]
    fn failed_reload_during_select_leaves_form_untouched() {
        let mut t = backend();
        let mut c = ModuleController::new(Screen::Groups, Role::Admin);
        c.open(&mut t).expect("open");
        c.select(&mut t, "career", Some(1)).expect("career 1");
        c.select(&mut t, "subject", Some(12)).expect("compilers");
        let status = c.form().status();

        c.invalidate(&[ReferenceKind::Teachers]);
        t.fail("GET /teachers", 503, "busy");
        let err = c.select(&mut t, "career", Some(2)).expect_err("teachers down");
        assert_eq!(err.code(), "transport_failed");
        assert_eq!(c.form().pick("career"), Some(1));
        assert_eq!(c.form().pick("subject"), Some(12));
        assert_eq!(c.form().status(), status);
    }

    #[test]
    fn failed_scope_load_keeps_previous_career() {
        let mut t = backend();
        t.fail("GET /subjects?careerId=2", 503, "busy");
        let mut c = ModuleController::new(Screen::Students, Role::Admin);
        c.open(&mut t).expect("open");
        c.load(&mut t, 3).expect("load");

        let err = c.select(&mut t, "career", Some(2)).expect_err("scope down");
        assert_eq!(err.code(), "transport_failed");
        assert_eq!(c.form().pick("career"), Some(1));
        assert!(!c.form().is_dirty());
        let v = c.view();
        assert_eq!(assoc(&v, "subjects").projection.selected_ids, vec![10]);
    }
}
