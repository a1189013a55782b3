//! Preview timing configuration.

use std::time::Duration;

/// Phase durations for the live preview.
///
/// | Field            | Default  |
/// |------------------|----------|
/// | `entering`       | 600 ms   |
/// | `exiting`        | 400 ms   |
/// | `fixed_hold`     | 4000 ms  |
/// | `speech_ceiling` | 12000 ms |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub entering: Duration,
    pub exiting: Duration,
    /// Hold length when the slide is not narrated.
    pub fixed_hold: Duration,
    /// Upper bound on a narrated hold. Fires even if synthesis hangs or
    /// playback never reports its end.
    pub speech_ceiling: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            entering: Duration::from_millis(600),
            exiting: Duration::from_millis(400),
            fixed_hold: Duration::from_millis(4000),
            speech_ceiling: Duration::from_millis(12000),
        }
    }
}

impl PlaybackConfig {
    /// Length of one un-narrated slide: entering + hold + exiting.
    pub fn fixed_cycle(&self) -> Duration {
        self.entering + self.fixed_hold + self.exiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_is_five_seconds() {
        assert_eq!(PlaybackConfig::default().fixed_cycle(), Duration::from_secs(5));
    }
}
