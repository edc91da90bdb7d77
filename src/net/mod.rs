//! Backend access: wire types, the HTTP gateway, and typed endpoints.

pub mod api;
pub mod client;
pub mod error;
pub mod types;
