//! GrowthOS Telemetry - Logging for the funnel simulator.
//!
//! Wraps `tracing-subscriber` setup behind a small [`LogConfig`] builder.
//!
//! # Example
//!
//! ```rust,no_run
//! use growthos_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), growthos_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("tokio_tungstenite=warn");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
