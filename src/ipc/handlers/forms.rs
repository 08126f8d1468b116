use serde_json::{json, Value};
use tracing::warn;

use crate::controller::{ModuleController, MutationOutcome};
use crate::forms::error::FormError;
use crate::ipc::error::{err, form_err, ok};
use crate::ipc::helpers::{open_screen, reference_id, reference_ids, required_str, screen_param};
use crate::ipc::types::{AppState, Request};
use crate::resources::Screen;
use crate::transport::Transport;

type Outcome = Result<Value, Value>;

fn view_of(req: &Request, controller: &ModuleController, r: Result<(), FormError>) -> Value {
    match r {
        Ok(()) => ok(&req.id, json!(controller.view())),
        Err(e) => form_err(&req.id, &e),
    }
}

fn with_screen<F>(state: &mut AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&mut ModuleController, &mut dyn Transport) -> Outcome,
{
    let (controller, transport) = match open_screen(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match f(controller, transport) {
        Ok(v) | Err(v) => v,
    }
}

fn handle_view(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, t| {
        // kinds invalidated by another screen come back before rendering
        if let Err(e) = c.ensure_references(t) {
            warn!(error = %e, "reference reload failed; view shows what is cached");
        }
        Ok(ok(&req.id, json!(c.view())))
    })
}

fn handle_new(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, _| {
        c.new_form();
        Ok(ok(&req.id, json!(c.view())))
    })
}

fn handle_load(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, t| {
        let id = reference_id(req, "id", "label")?
            .ok_or_else(|| err(&req.id, "bad_params", "id must not be null", None))?;
        let r = c.load(t, id);
        Ok(view_of(req, c, r))
    })
}

fn handle_set_field(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, _| {
        let field = required_str(req, "field")?;
        let value = match req.params.get("value") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(err(&req.id, "bad_params", "value must be a string", None)),
        };
        let r = c.set_field(&field, &value);
        Ok(view_of(req, c, r))
    })
}

fn handle_select(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, t| {
        let picker = required_str(req, "picker")?;
        let id = reference_id(req, "id", "label")?;
        let r = c.select(t, &picker, id);
        Ok(view_of(req, c, r))
    })
}

fn handle_toggle(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, t| {
        let relation = required_str(req, "relation")?;
        let id = reference_id(req, "id", "label")?
            .ok_or_else(|| err(&req.id, "bad_params", "id must not be null", None))?;
        let selected = req
            .params
            .get("selected")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| err(&req.id, "bad_params", "missing selected", None))?;
        let r = c.toggle(t, &relation, id, selected).map(|_| ());
        Ok(view_of(req, c, r))
    })
}

fn handle_set_selection(state: &mut AppState, req: &Request) -> Value {
    with_screen(state, req, |c, t| {
        let relation = required_str(req, "relation")?;
        let ids = reference_ids(req)?;
        let r = c.set_selection(t, &relation, &ids).map(|_| ());
        Ok(view_of(req, c, r))
    })
}

fn mutation_result(req: &Request, c: &ModuleController, outcome: &MutationOutcome) -> Value {
    ok(
        &req.id,
        json!({
            "id": outcome.id,
            "refreshError": outcome.refresh_error,
            "view": c.view(),
        }),
    )
}

/// Other open screens drop the reference kinds the mutated resource feeds.
fn broadcast_invalidation(state: &mut AppState, from: Screen) {
    let kinds = from.descriptor().invalidates;
    for (screen, controller) in state.screens.iter_mut() {
        if *screen != from {
            controller.invalidate(kinds);
        }
    }
}

fn handle_mutation(state: &mut AppState, req: &Request, delete: bool) -> Value {
    let resp = with_screen(state, req, |c, t| {
        let r = if delete { c.delete(t) } else { c.save(t) };
        Ok(match r {
            Ok(outcome) => mutation_result(req, c, &outcome),
            Err(e) => form_err(&req.id, &e),
        })
    });
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        if let Ok(screen) = screen_param(req) {
            broadcast_invalidation(state, screen);
        }
    }
    resp
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "form.view" => Some(handle_view(state, req)),
        "form.new" => Some(handle_new(state, req)),
        "form.load" => Some(handle_load(state, req)),
        "form.setField" => Some(handle_set_field(state, req)),
        "form.select" => Some(handle_select(state, req)),
        "form.toggle" => Some(handle_toggle(state, req)),
        "form.setSelection" => Some(handle_set_selection(state, req)),
        "form.save" => Some(handle_mutation(state, req, false)),
        "form.delete" => Some(handle_mutation(state, req, true)),
        _ => None,
    }
}
