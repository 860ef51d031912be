//! GrowthOS Config - Layered configuration for the funnel simulator.
//!
//! Configuration is assembled in this order, later layers winning:
//!
//! 1. Embedded `defaults.toml`
//! 2. The file passed to [`load`], or `~/.growthos/config.toml` if present
//! 3. `GROWTHOS_*` environment variables
//!
//! The merged tree is deserialized into [`Config`] and validated.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), growthos_config::ConfigError> {
//! let config = growthos_config::load(None)?;
//! println!("listening on {}", config.server.bind);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod env;
mod error;
mod loader;
mod types;
mod validate;

pub use env::ENV_PREFIX;
pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_with_env};
pub use types::{Config, LoggingSection, RevenueSection, ServerSection, SimulationSection};
pub use validate::validate;
