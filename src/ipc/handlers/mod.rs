pub mod auth;
pub mod core;
pub mod forms;
pub mod screens;
