//! Domain logic for the script host service.
//!
//! Nothing in this crate knows about HTTP. The `api` crate maps these types
//! onto routes and responses.

pub mod catalog;
pub mod error;
pub mod scripting;
