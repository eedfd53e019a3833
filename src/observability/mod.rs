//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! HTTP layer adds:
//!     → x-request-id on every request and response
//!     → TraceLayer spans carrying method, path and request id
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;
