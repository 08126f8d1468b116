use chrono::{NaiveTime, Timelike};
use serde_json::{Map, Value};

use super::descriptor::{Derive, FieldKind, ResourceDescriptor};
use super::error::ValidationError;
use super::state::FormState;

/// Validates the form and assembles the create/update body. Only inputs the
/// session may edit are written.
pub fn build(
    desc: &ResourceDescriptor,
    form: &FormState,
    is_admin: bool,
) -> Result<Map<String, Value>, ValidationError> {
    let creating = form.entity_id().is_none();
    if creating && desc.self_endpoint && !is_admin {
        return Err(ValidationError::new(desc.noun, "is not loaded"));
    }
    let mut out = Map::new();

    for f in desc.fields.iter().filter(|f| f.write && (is_admin || !f.admin_only)) {
        let mut value = form.field(f.name).trim().to_string();
        if value.is_empty() {
            if let Some(derive) = f.derive {
                value = derive_value(derive, form)?.unwrap_or_default();
            }
        }
        if value.is_empty() {
            if f.required.applies(creating) {
                return Err(ValidationError::required(f.name));
            }
            if !(desc.omit_blank_on_update && !creating) {
                out.insert(f.name.to_string(), Value::Null);
            }
            continue;
        }
        let v = match f.kind {
            FieldKind::Integer => value
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ValidationError::numeric(f.name))?,
            FieldKind::Text | FieldKind::Choice(_) => Value::String(value),
        };
        out.insert(f.name.to_string(), v);
    }

    for p in desc.pickers.iter().filter(|p| is_admin || !p.admin_only) {
        match form.pick(p.name) {
            Some(id) => {
                out.insert(p.wire.to_string(), Value::from(id));
            }
            None if p.required.applies(creating) => {
                return Err(ValidationError::required(p.name));
            }
            None => {}
        }
    }

    for a in desc.associations.iter().filter(|a| is_admin || !a.admin_only) {
        let ids: Vec<Value> = form
            .association(a.name)
            .map(|s| s.ids().iter().copied().map(Value::from).collect())
            .unwrap_or_default();
        out.insert(a.wire.to_string(), Value::Array(ids));
    }

    Ok(out)
}

fn derive_value(derive: Derive, form: &FormState) -> Result<Option<String>, ValidationError> {
    match derive {
        Derive::ShiftFromTime(source) => {
            let raw = form.field(source).trim();
            if raw.is_empty() {
                return Ok(None);
            }
            let time = NaiveTime::parse_from_str(raw, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
                .map_err(|_| ValidationError::new(source, "must be HH:MM"))?;
            let shift = if time.hour() < 12 { "MATUTINO" } else { "VESPERTINO" };
            Ok(Some(shift.to_string()))
        }
    }
}
