//! Prelude module - commonly used types for convenient import.
//!
//! Use `use growthos_engine::prelude::*;` to import all essential types.

// Errors
pub use crate::{EngineError, EngineResult};

// Catalog
pub use crate::{Outcome, ScenarioCatalog};

// Runtime
pub use crate::{
    Command, CommandGateway, CommandOutcome, EngineSettings, FunnelContext, IgnoreReason,
    RunHandle, RunOutcome,
};
