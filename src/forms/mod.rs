//! Relational form engine shared by every screen: label codec, per-screen
//! reference cache, cascade filtering, association reconciliation, the edit
//! session and payload validation.

pub mod cache;
pub mod cascade;
pub mod descriptor;
pub mod error;
pub mod label;
pub mod payload;
pub mod reconcile;
pub mod reference;
pub mod state;
