use std::collections::BTreeMap;

use serde::Serialize;

use super::error::FormError;
use super::reconcile::AssociationSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    New,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormStatus {
    New,
    Editing,
    Dirty,
    Saving,
}

/// One single-entity edit session.
#[derive(Debug, Clone)]
pub struct FormState {
    status: FormStatus,
    entity_id: Option<i64>,
    fields: BTreeMap<String, String>,
    picks: BTreeMap<String, Option<i64>>,
    associations: BTreeMap<String, AssociationSet>,
    dirty: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        Self {
            status: FormStatus::New,
            entity_id: None,
            fields: BTreeMap::new(),
            picks: BTreeMap::new(),
            associations: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Replaces the session with a freshly loaded entity.
    pub fn load(
        &mut self,
        entity_id: i64,
        fields: BTreeMap<String, String>,
        picks: BTreeMap<String, Option<i64>>,
        associations: BTreeMap<String, AssociationSet>,
    ) {
        *self = Self {
            status: FormStatus::Editing,
            entity_id: Some(entity_id),
            fields,
            picks,
            associations,
            dirty: false,
        };
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn mode(&self) -> FormMode {
        if self.entity_id.is_some() {
            FormMode::Editing
        } else {
            FormMode::New
        }
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn entity_id(&self) -> Option<i64> {
        self.entity_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn pick(&self, name: &str) -> Option<i64> {
        self.picks.get(name).copied().flatten()
    }

    pub fn association(&self, name: &str) -> Option<&AssociationSet> {
        self.associations.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), FormError> {
        self.ensure_idle()?;
        if self.field(name) != value {
            self.fields.insert(name.to_string(), value.to_string());
            self.touch();
        }
        Ok(())
    }

    pub fn set_pick(&mut self, name: &str, id: Option<i64>) -> Result<(), FormError> {
        self.ensure_idle()?;
        if self.pick(name) != id {
            self.picks.insert(name.to_string(), id);
            self.touch();
        }
        Ok(())
    }

    /// Screen defaults: set without marking the form dirty.
    pub fn seed_pick(&mut self, name: &str, id: Option<i64>) {
        self.picks.insert(name.to_string(), id);
    }

    /// Runs `f` on the named association; the form turns dirty only if `f`
    /// reports a change.
    pub fn edit_association<F>(&mut self, name: &str, f: F) -> Result<bool, FormError>
    where
        F: FnOnce(&mut AssociationSet) -> bool,
    {
        self.ensure_idle()?;
        let changed = f(self.associations.entry(name.to_string()).or_default());
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    pub fn begin_save(&mut self) -> Result<(), FormError> {
        self.ensure_idle()?;
        self.status = FormStatus::Saving;
        Ok(())
    }

    /// Save accepted by the server: the session is now bound to `id`.
    pub fn save_succeeded(&mut self, id: i64) {
        self.entity_id = Some(id);
        self.status = FormStatus::Editing;
        self.dirty = false;
    }

    pub fn save_failed(&mut self) {
        self.status = FormStatus::Dirty;
        self.dirty = true;
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.status = FormStatus::Dirty;
    }

    fn ensure_idle(&self) -> Result<(), FormError> {
        if self.status == FormStatus::Saving {
            return Err(FormError::SaveInProgress);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> FormState {
        let mut f = FormState::new();
        f.load(
            7,
            BTreeMap::from([("name".to_string(), "Ada".to_string())]),
            BTreeMap::from([("career".to_string(), Some(1))]),
            BTreeMap::from([("subjects".to_string(), AssociationSet::from_ids([10, 11]))]),
        );
        f
    }

    #[test]
    fn lifecycle_new_editing_dirty_saving_editing() {
        let mut f = FormState::new();
        assert_eq!((f.mode(), f.status()), (FormMode::New, FormStatus::New));

        f = loaded();
        assert_eq!((f.mode(), f.status()), (FormMode::Editing, FormStatus::Editing));
        assert!(!f.is_dirty());

        f.set_field("name", "Ada L.").expect("edit");
        assert_eq!(f.status(), FormStatus::Dirty);

        f.begin_save().expect("save");
        assert_eq!(f.status(), FormStatus::Saving);
        assert!(matches!(f.set_field("name", "x"), Err(FormError::SaveInProgress)));
        assert!(matches!(f.begin_save(), Err(FormError::SaveInProgress)));

        f.save_succeeded(7);
        assert_eq!(f.status(), FormStatus::Editing);
        assert!(!f.is_dirty());
    }

    #[test]
    fn failed_save_returns_to_dirty_and_reset_to_new() {
        let mut f = FormState::new();
        f.set_field("name", "G1").expect("edit");
        f.begin_save().expect("save");
        f.save_failed();
        assert_eq!((f.mode(), f.status()), (FormMode::New, FormStatus::Dirty));
        assert_eq!(f.field("name"), "G1");

        f.reset();
        assert_eq!(f.status(), FormStatus::New);
        assert_eq!(f.field("name"), "");
    }

    #[test]
    fn unchanged_edits_do_not_dirty() {
        let mut f = loaded();
        f.set_field("name", "Ada").expect("edit");
        f.set_pick("career", Some(1)).expect("pick");
        let changed = f
            .edit_association("subjects", |s| s.insert(10))
            .expect("assoc");
        assert!(!changed);
        assert!(!f.is_dirty());

        f.set_pick("career", Some(2)).expect("pick");
        assert!(f.is_dirty());
        assert_eq!(f.pick("career"), Some(2));
    }
}
