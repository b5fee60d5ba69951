//! docvault-server-common: Shared server infrastructure for the docvault handlers.
//!
//! Provides structured error codes following the `SYS_{SERVICE}_{ERROR}` pattern,
//! unified error response types, and structured log initialization.

pub mod error;
pub mod telemetry;

pub use error::{ErrorBody, ErrorCode, ErrorDetail, ErrorResponse, ServiceError};
pub use telemetry::{init_telemetry, TelemetryConfig};
