use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::resources::menu;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "apiBaseUrl": state.api_base_url,
            "authenticated": state.session.is_authenticated(),
        }),
    )
}

fn handle_menu_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(role) = state.session.role() else {
        return err(&req.id, "not_authenticated", "log in first", None);
    };
    let screens: Vec<&str> = menu(role).iter().map(|s| s.as_str()).collect();
    ok(&req.id, json!({ "role": role, "screens": screens }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "menu.list" => Some(handle_menu_list(state, req)),
        _ => None,
    }
}
