use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the dialog stays visible after an error before auto-closing.
///
/// Deliberately longer than the success delay so the user has time to read
/// the error text. Not configurable; the success delay is (see
/// [`DialogOptions::auto_close_delay_ms`]).
pub const ERROR_CLOSE_DELAY: Duration = Duration::from_millis(5000);

/// Default auto-close delay after a successful run, in milliseconds.
pub const DEFAULT_AUTO_CLOSE_DELAY_MS: u64 = 800;

/// Configuration surface for [`TaskDialog`](crate::ui::TaskDialog).
///
/// Controls only the success-path auto-close behavior; the error-display
/// delay is fixed ([`ERROR_CLOSE_DELAY`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogOptions {
    /// Close the dialog automatically after all tasks complete
    pub auto_close: bool,

    /// Delay before auto-closing on success, in milliseconds
    pub auto_close_delay_ms: u64,
}

impl DialogOptions {
    /// Success auto-close delay as a [`Duration`].
    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_millis(self.auto_close_delay_ms)
    }
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            auto_close: true,
            auto_close_delay_ms: DEFAULT_AUTO_CLOSE_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DialogOptions::default();
        assert!(options.auto_close);
        assert_eq!(options.auto_close_delay_ms, 800);
        assert_eq!(options.auto_close_delay(), Duration::from_millis(800));
    }

    #[test]
    fn test_error_delay_longer_than_success_delay() {
        let options = DialogOptions::default();
        assert!(ERROR_CLOSE_DELAY > options.auto_close_delay());
    }

    #[test]
    fn test_serde_round_trip() {
        let options = DialogOptions {
            auto_close: false,
            auto_close_delay_ms: 1500,
        };

        let json = serde_json::to_string(&options).unwrap();
        let loaded: DialogOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_serde_missing_fields_use_defaults() {
        let loaded: DialogOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, DialogOptions::default());
    }
}
