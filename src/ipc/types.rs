use std::collections::BTreeMap;

use serde::Deserialize;

use crate::controller::ModuleController;
use crate::resources::Screen;
use crate::session::Session;
use crate::transport::Transport;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub api_base_url: String,
    pub transport: Box<dyn Transport>,
    pub session: Session,
    pub screens: BTreeMap<Screen, ModuleController>,
}

impl AppState {
    pub fn new(api_base_url: String, transport: Box<dyn Transport>) -> Self {
        Self {
            api_base_url,
            transport,
            session: Session::default(),
            screens: BTreeMap::new(),
        }
    }
}
