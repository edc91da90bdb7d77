//! Client-side session state.
//!
//! DESIGN
//! ======
//! `store` owns what is persisted between runs; `session` owns what the
//! current process believes about the signed-in user.

pub mod session;
pub mod store;
