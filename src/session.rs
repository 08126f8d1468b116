use serde::Serialize;
use serde_json::Value;

use crate::forms::reference::{json_int, json_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "TEACHER" => Some(Role::Teacher),
            "STUDENT" => Some(Role::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub role: Role,
    pub username: String,
    pub email: String,
}

impl SessionUser {
    /// Reads the `user` object of a login response.
    pub fn from_json(user: &Value) -> Option<SessionUser> {
        let id = user.get("id").and_then(json_int)?;
        let role = user.get("role").and_then(|v| v.as_str()).and_then(Role::parse)?;
        Some(SessionUser {
            id,
            role,
            username: json_text(user.get("username")),
            email: json_text(user.get("email")),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }
}
