//! Pre-built catalogs and contexts.

use std::collections::BTreeMap;

use growthos_config::Config;
use growthos_core::{Mode, Sender};
use growthos_engine::{
    CommandGateway, ConversationScript, ConversationStep, EngineSettings, FunnelContext, Outcome,
    RetentionScript, RetentionStep, ScenarioCatalog,
};
use growthos_events::EventBus;

fn step(delay_secs: u64, sender: Sender, text: &str, outcome: Outcome) -> ConversationStep {
    ConversationStep {
        delay_secs,
        sender,
        text: text.to_owned(),
        outcome,
    }
}

/// A short catalog: three automated steps ending in a booking, two legacy
/// steps ending in a loss, and three retention check-ins.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn fast_catalog() -> ScenarioCatalog {
    let conversations = BTreeMap::from([
        (
            Mode::Automated,
            ConversationScript {
                compress: false,
                steps: vec![
                    step(1, Sender::Patient, "Hi, can I book?", Outcome::None),
                    step(1, Sender::Ai, "Sure, Tuesday at 10?", Outcome::None),
                    step(1, Sender::Ai, "You're booked.", Outcome::Book),
                ],
            },
        ),
        (
            Mode::Legacy,
            ConversationScript {
                compress: true,
                steps: vec![
                    step(3600, Sender::Clinic, "Sorry for the wait.", Outcome::None),
                    step(1, Sender::System, "Lead went elsewhere", Outcome::Lose),
                ],
            },
        ),
    ]);
    let retention = RetentionScript {
        steps: vec![
            RetentionStep {
                day: 7,
                text: "How is week one?".to_owned(),
                outcome: Outcome::None,
            },
            RetentionStep {
                day: 28,
                text: "One month in!".to_owned(),
                outcome: Outcome::Retain,
            },
            RetentionStep {
                day: 35,
                text: "Upgrade available".to_owned(),
                outcome: Outcome::Upsell,
            },
        ],
    };
    ScenarioCatalog::new(conversations, retention).unwrap()
}

/// Context over the built-in catalog with default settings.
///
/// # Panics
///
/// Panics if the built-in catalog is broken.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_context() -> FunnelContext {
    test_context_with(ScenarioCatalog::builtin().unwrap(), &Config::default())
}

/// Context over `catalog` with settings from `config`.
#[must_use]
pub fn test_context_with(catalog: ScenarioCatalog, config: &Config) -> FunnelContext {
    FunnelContext::new(catalog, EventBus::new(), EngineSettings::from_config(config))
}

/// Gateway over [`test_context`].
#[must_use]
pub fn test_gateway() -> CommandGateway {
    CommandGateway::new(test_context())
}

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call
/// repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
