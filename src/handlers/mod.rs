//! HTTP API Handlers
//!
//! Modular organization of the REST API: route table, shared state, the
//! three analysis endpoints with their response normalizers, and health
//! infrastructure.

// Core modules
pub mod router;
pub mod state;
pub mod types;

// Analysis endpoints
pub mod analyze;
pub mod normalize;

// Health and infrastructure
pub mod health;

// Re-export commonly used items
pub use router::{build_router, AppState};
pub use state::ServiceState;
pub use types::*;
