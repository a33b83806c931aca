//! API Module
//!
//! HTTP handlers, shared state and routing for the audit service REST API.
//! See [`create_router`] for the endpoint table.

pub mod handlers;
pub mod routes;
pub mod state;

pub use handlers::*;
pub use routes::create_router;
pub use state::AppState;
