//! HTTP control surface
//!
//! Stands in for the page's buttons and status line:
//! - POST /session/start - Start a new exchange
//! - POST /session/cancel - Cancel the current exchange
//! - POST /session/acknowledge - Dismiss an error
//! - GET /session - Session snapshot
//! - GET /avatar - Current avatar frame
//! - GET /avatar/variants - Available avatar variants
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::VariantInfo;
pub use routes::create_router;
pub use state::AppState;
