//! GrowthOS Test - Shared test utilities for the funnel simulator.
//!
//! This crate provides observer doubles and pre-built contexts that can be
//! used across GrowthOS crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! growthos-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use growthos_core::Mode;
//! use growthos_test::{RecordingObserver, test_gateway};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_booking() {
//!     let gateway = test_gateway();
//!     let recorder = RecordingObserver::attach(gateway.context().bus());
//!
//!     let run = gateway.start_lead(Mode::Automated).await.unwrap();
//!     run.join.await.unwrap();
//!
//!     assert!(recorder.event_types().contains(&"stage_change"));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
