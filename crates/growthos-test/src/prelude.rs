//! Prelude module - commonly used test helpers.
//!
//! Use `use growthos_test::prelude::*;` to import all helpers.

pub use crate::fixtures::{
    fast_catalog, init_test_logging, test_context, test_context_with, test_gateway,
};
pub use crate::mocks::{FailingObserver, RecordingObserver};
