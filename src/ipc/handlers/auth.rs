use serde_json::json;
use tracing::{info, warn};

use crate::forms::error::FormError;
use crate::ipc::error::{err, form_err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::session::SessionUser;
use crate::transport::Method;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let username = match required_str(req, "username") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let body = json!({ "username": username, "password": password });
    let resp = match state
        .transport
        .request(Method::Post, "/auth/login", &[], Some(&body))
    {
        Ok(v) => v,
        Err(e) => {
            warn!(%username, status = e.status, "login rejected");
            return form_err(&req.id, &FormError::from(e));
        }
    };

    let token = resp.get("token").and_then(|v| v.as_str()).map(str::to_string);
    let user = resp.get("user").and_then(SessionUser::from_json);
    let (Some(token), Some(user)) = (token, user) else {
        return err(
            &req.id,
            "transport_failed",
            "login response lacks token or user",
            None,
        );
    };

    state.screens.clear();
    state.transport.set_token(Some(token.clone()));
    state.session.token = Some(token);
    state.session.user = Some(user.clone());
    info!(user_id = user.id, role = ?user.role, "logged in");
    ok(&req.id, json!({ "user": user }))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.screens.clear();
    state.session.clear();
    state.transport.set_token(None);
    info!("logged out");
    ok(&req.id, json!({}))
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user = state.session.user.as_ref();
    ok(
        &req.id,
        json!({
            "authenticated": state.session.is_authenticated(),
            "role": user.map(|u| u.role),
            "userId": state.session.current_user_id(),
            "username": user.map(|u| u.username.as_str()),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "session.get" => Some(handle_session_get(state, req)),
        _ => None,
    }
}
