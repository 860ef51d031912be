//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the simulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Observer-facing WebSocket server.
    pub server: ServerSection,
    /// Scenario timing.
    pub simulation: SimulationSection,
    /// Monetary values applied by scripted outcomes.
    pub revenue: RevenueSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ServerSection
// ---------------------------------------------------------------------------

/// WebSocket server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Socket address to listen on.
    pub bind: String,
    /// Request path observers connect to.
    pub ws_path: String,
    /// Outbound queue length per observer. An observer that falls this far
    /// behind is disconnected.
    pub observer_buffer: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_owned(),
            ws_path: "/ws".to_owned(),
            observer_buffer: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationSection
// ---------------------------------------------------------------------------

/// Scenario timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Upper bound on any single delay in a compressed script.
    pub max_step_delay_ms: u64,
    /// Spacing between retention check-ins.
    pub retention_interval_ms: u64,
    /// Multiplier applied to every delay after compression.
    pub time_scale: f64,
    /// Scenario catalog file replacing the built-in scripts.
    pub catalog_path: Option<PathBuf>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            max_step_delay_ms: 3000,
            retention_interval_ms: 2000,
            time_scale: 1.0,
            catalog_path: None,
        }
    }
}

impl SimulationSection {
    /// Delay cap as a [`Duration`].
    #[must_use]
    pub fn max_step_delay(&self) -> Duration {
        Duration::from_millis(self.max_step_delay_ms)
    }

    /// Retention spacing as a [`Duration`].
    #[must_use]
    pub fn retention_interval(&self) -> Duration {
        Duration::from_millis(self.retention_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// RevenueSection
// ---------------------------------------------------------------------------

/// Monetary values, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSection {
    /// Value assigned to a lead when it books.
    pub booking_value: u64,
    /// Value added when a retained lead is upsold.
    pub upsell_value: u64,
    /// Value counted as lost when a lead goes elsewhere.
    pub expected_value: u64,
}

impl Default for RevenueSection {
    fn default() -> Self {
        Self {
            booking_value: 2800,
            upsell_value: 1500,
            expected_value: 2800,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["growthos_engine=debug"]`).
    pub directives: Vec<String>,
    /// Output target: `"stderr"`, `"stdout"`, or `"file"`.
    pub target: String,
    /// Directory for daily-rotated log files. Required when `target` is
    /// `"file"`.
    pub directory: Option<PathBuf>,
    /// Prefix each line with a timestamp.
    pub timestamps: bool,
    /// Colorize console output. Always off for file output.
    pub ansi: bool,
    /// Include source file and line.
    pub file_info: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            target: "stderr".to_owned(),
            directory: None,
            timestamps: true,
            ansi: true,
            file_info: false,
        }
    }
}
