//! UI configuration control plane library.
//!
//! Versioned UI configuration documents move through draft, preview and
//! production. Preview codes share a version for a limited time, and each
//! deployment environment has one atomically switched current version with
//! a publish history for rollback.

// Core lifecycle engine
pub mod clock;
pub mod document;
pub mod error;
pub mod preview;
pub mod publish;
pub mod serving;
pub mod store;
pub mod validation;

// Surfaces
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ServiceConfig;
pub use document::{DocumentStatus, UiConfigDocument};
pub use error::{ControlPlaneError, ControlPlaneResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use serving::ConfigService;
