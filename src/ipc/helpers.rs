use serde_json::Value;

use crate::controller::ModuleController;
use crate::forms::error::FormError;
use crate::forms::label;
use crate::forms::reference::json_int;
use crate::ipc::error::{err, form_err};
use crate::ipc::types::{AppState, Request};
use crate::resources::Screen;
use crate::transport::Transport;

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn screen_param(req: &Request) -> Result<Screen, Value> {
    let name = required_str(req, "screen")?;
    Screen::parse(name.trim())
        .ok_or_else(|| err(&req.id, "bad_params", format!("unknown screen: {}", name), None))
}

/// The open controller for `params.screen` plus the transport it talks through.
pub fn open_screen<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a mut ModuleController, &'a mut dyn Transport), Value> {
    let screen = screen_param(req)?;
    let AppState {
        screens, transport, ..
    } = state;
    let controller = screens.get_mut(&screen).ok_or_else(|| {
        err(
            &req.id,
            "screen_not_open",
            format!("screen {} is not open", screen.as_str()),
            None,
        )
    })?;
    Ok((controller, &mut **transport))
}

/// Reads a reference either as `params.<id_key>` or as an encoded
/// `params.<label_key>`. An explicit null means "no selection".
pub fn reference_id(req: &Request, id_key: &str, label_key: &str) -> Result<Option<i64>, Value> {
    if let Some(v) = req.params.get(id_key) {
        if v.is_null() {
            return Ok(None);
        }
        return json_int(v).map(Some).ok_or_else(|| {
            err(&req.id, "bad_params", format!("{} must be an integer", id_key), None)
        });
    }
    match req.params.get(label_key) {
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => label::decode(s)
            .map(Some)
            .map_err(|e| form_err(&req.id, &FormError::from(e))),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string", label_key),
            None,
        )),
        None => Err(err(
            &req.id,
            "bad_params",
            format!("missing {} or {}", id_key, label_key),
            None,
        )),
    }
}

pub fn reference_ids(req: &Request) -> Result<Vec<i64>, Value> {
    if let Some(ids) = req.params.get("ids").and_then(|v| v.as_array()) {
        return ids
            .iter()
            .map(|v| {
                json_int(v).ok_or_else(|| err(&req.id, "bad_params", "ids must be integers", None))
            })
            .collect();
    }
    let Some(labels) = req.params.get("labels").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "missing ids or labels", None));
    };
    let labels: Vec<&str> = labels
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| err(&req.id, "bad_params", "labels must be strings", None))
        })
        .collect::<Result<_, _>>()?;
    label::decode_all(labels).map_err(|e| form_err(&req.id, &FormError::from(e)))
}
