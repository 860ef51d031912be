//! GrowthOS Engine - Real-time scenario engine for the funnel simulator.
//!
//! This crate provides:
//! - [`ScenarioCatalog`], the scripted conversations and retention check-ins
//! - [`FunnelContext`], the owned application state shared by every run
//! - [`CommandGateway`], which turns observer commands into scenario runs
//!
//! # Architecture
//!
//! Each lead's script runs as its own tokio task. Runs suspend only between
//! steps; each step takes the context lock, confirms the run's ticket is
//! still current, then mutates the lead, updates metrics and
//! publishes on the [`growthos_events::EventBus`] before releasing it. A
//! reset cancels the current token and bumps the generation, so every run
//! started earlier stops at its next resumption.
//!
//! # Example
//!
//! ```rust,no_run
//! use growthos_core::Mode;
//! use growthos_engine::{CommandGateway, FunnelContext, ScenarioCatalog};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = growthos_config::Config::default();
//! let ctx = FunnelContext::from_config(&config, ScenarioCatalog::builtin()?);
//! let gateway = CommandGateway::new(ctx);
//!
//! let run = gateway.start_lead(Mode::Automated).await?;
//! let outcome = run.join.await?;
//! assert!(outcome.is_completed());
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

mod catalog;
mod command;
mod context;
mod delay;
mod error;
mod gateway;
mod generator;
mod metrics;
mod scenario;
mod store;

pub use catalog::{
    ConversationScript, ConversationStep, Outcome, RetentionScript, RetentionStep,
    ScenarioCatalog,
};
pub use command::{Command, CommandError};
pub use context::{EngineSettings, FunnelContext};
pub use delay::DelayPolicy;
pub use error::{EngineError, EngineResult};
pub use gateway::{CommandGateway, CommandOutcome, IgnoreReason, RunHandle};
pub use generator::{generate_lead, random_name, random_phone};
pub use metrics::MetricsAggregator;
pub use scenario::RunOutcome;
pub use store::LeadStore;
