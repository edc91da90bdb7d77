//! # salesdesk
//!
//! Client for the daily sales-report service: session lifecycle, the
//! bearer-authenticated HTTP gateway, route guards, and typed calls for the
//! branch, daily-report, and user resources.
//!
//! The `salesdesk` binary is a thin command-line front end over this crate.

pub mod app;
pub mod config;
pub mod navigation;
pub mod net;
pub mod routes;
pub mod state;
