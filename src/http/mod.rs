//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id, request span)
//!     → client.rs (GET /v1/config, /v1/preview, /health)
//!       or admin routes (documents, previews, environments)
//!     → ConfigService
//!     → response.rs (error → status + JSON body)
//!     → Send to client
//! ```

pub mod client;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
