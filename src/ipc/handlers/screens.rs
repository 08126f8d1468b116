use serde_json::json;
use tracing::info;

use crate::controller::ModuleController;
use crate::ipc::error::{err, form_err, ok};
use crate::ipc::helpers::{open_screen, screen_param};
use crate::ipc::types::{AppState, Request};
use crate::resources::menu;

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let screen = match screen_param(req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let Some(role) = state.session.role() else {
        return err(&req.id, "not_authenticated", "log in first", None);
    };
    if !menu(role).contains(&screen) {
        return err(
            &req.id,
            "forbidden",
            format!("screen {} is not available to this role", screen.as_str()),
            None,
        );
    }

    // reopening keeps nothing from the previous session
    state
        .screens
        .insert(screen, ModuleController::new(screen, role));
    let (controller, transport) = match open_screen(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    info!(screen = screen.as_str(), "screen opened");
    // the screen stays open on failure so a refresh can retry
    match controller.open(transport) {
        Ok(()) => ok(&req.id, json!(controller.view())),
        Err(e) => form_err(&req.id, &e),
    }
}

fn handle_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let screen = match screen_param(req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let closed = state.screens.remove(&screen).is_some();
    ok(&req.id, json!({ "closed": closed }))
}

fn handle_refresh(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (controller, transport) = match open_screen(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match controller.refresh(transport) {
        Ok(()) => ok(&req.id, json!(controller.view())),
        Err(e) => form_err(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (controller, transport) = match open_screen(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match controller.reload_list(transport) {
        Ok(()) => ok(&req.id, json!({ "rows": controller.view().rows })),
        Err(e) => form_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "screen.open" => Some(handle_open(state, req)),
        "screen.close" => Some(handle_close(state, req)),
        "screen.refresh" => Some(handle_refresh(state, req)),
        "screen.list" => Some(handle_list(state, req)),
        _ => None,
    }
}
