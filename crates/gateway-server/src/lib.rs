//! # Gateway Server
//!
//! HTTP façade for the invoice agent.
//!
//! - `GET /` health
//! - `POST /api/invoice/chat`
//! - `POST /api/invoice/new-thread`
//! - `GET /api/invoice/thread/:thread_id/messages`
//!
//! Every error body is `{"success": false, "error": ...}`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{Server, ServerConfig, ServerError};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
