//! Run-time delay policy.

use std::time::Duration;

use growthos_config::SimulationSection;

/// Maps scripted delays to real waits.
///
/// Compressed scripts have each step capped at `max_step_delay`; every delay
/// is then multiplied by `time_scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayPolicy {
    /// Cap for steps of compressed scripts.
    pub max_step_delay: Duration,
    /// Wait before each retention check-in.
    pub retention_interval: Duration,
    /// Multiplier applied last.
    pub time_scale: f64,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::from_section(&SimulationSection::default())
    }
}

impl DelayPolicy {
    /// Build from the `[simulation]` config section.
    #[must_use]
    pub fn from_section(section: &SimulationSection) -> Self {
        Self {
            max_step_delay: section.max_step_delay(),
            retention_interval: section.retention_interval(),
            time_scale: section.time_scale,
        }
    }

    /// Real wait for a conversation step scripted at `scripted_secs`.
    #[must_use]
    pub fn conversation_delay(&self, scripted_secs: u64, compress: bool) -> Duration {
        let scripted = Duration::from_secs(scripted_secs);
        let delay = if compress {
            scripted.min(self.max_step_delay)
        } else {
            scripted
        };
        self.scale(delay)
    }

    /// Real wait before each retention check-in.
    #[must_use]
    pub fn retention_delay(&self) -> Duration {
        self.scale(self.retention_interval)
    }

    fn scale(&self, delay: Duration) -> Duration {
        if (self.time_scale - 1.0).abs() < f64::EPSILON {
            return delay;
        }
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.time_scale)
            .unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = DelayPolicy::default();
        assert_eq!(policy.max_step_delay, Duration::from_secs(3));
        assert_eq!(policy.retention_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_uncompressed_delay_kept() {
        let policy = DelayPolicy::default();
        assert_eq!(policy.conversation_delay(2, false), Duration::from_secs(2));
        assert_eq!(policy.conversation_delay(86_400, false), Duration::from_secs(86_400));
    }

    #[test]
    fn test_compressed_delay_capped() {
        let policy = DelayPolicy::default();
        assert_eq!(policy.conversation_delay(1, true), Duration::from_secs(1));
        assert_eq!(policy.conversation_delay(172_800, true), Duration::from_secs(3));
    }

    #[test]
    fn test_time_scale() {
        let policy = DelayPolicy {
            time_scale: 0.5,
            ..DelayPolicy::default()
        };
        assert_eq!(policy.conversation_delay(4, false), Duration::from_secs(2));
        assert_eq!(policy.conversation_delay(86_400, true), Duration::from_millis(1500));
        assert_eq!(policy.retention_delay(), Duration::from_secs(1));
    }
}
