//! Centralized configuration for Bounce.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;
use std::time::Duration;

use crate::BounceError;

/// Central configuration for all Bounce components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct BounceConfig {
    pub clock: ClockConfig,
    pub display: DisplayConfig,
    pub server: ServerConfig,
}

/// Time-reference polling configuration.
///
/// Controls where viewers fetch server time from and how often they
/// re-synchronise.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Endpoint returning `{"epoch": .., "time": ..}`
    pub timer_url: String,
    /// Minimum delay between sync attempts
    pub sync_interval: Duration,
    /// Upper bound of the random delay added to `sync_interval`
    pub sync_jitter: Duration,
    /// HTTP request timeout for a single sync attempt
    pub request_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            timer_url: "http://127.0.0.1:8000/timer".to_string(),
            sync_interval: Duration::from_secs(20),
            sync_jitter: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            user_agent: "bounce/0.1.0",
        }
    }
}

/// Logical canvas and logo geometry shared by every viewer.
///
/// Viewers must agree on these values, otherwise the same tick maps to
/// different positions.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Logical canvas width in pixels
    pub canvas_width: u32,
    /// Logical canvas height in pixels
    pub canvas_height: u32,
    /// Simulation ticks per second of synchronised time
    pub ticks_per_second: f64,
    /// Number of logos cycled through on wall hits
    pub logo_count: u32,
    /// Logo width in pixels
    pub logo_width: u32,
    /// Logo height in pixels
    pub logo_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 640,
            canvas_height: 360,
            ticks_per_second: 60.0,
            logo_count: 1,
            logo_width: 100,
            logo_height: 50,
        }
    }
}

/// Time-reference and static asset server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Directory holding index.html, simulation.js and logos/
    pub static_dir: PathBuf,
    /// Cache lifetime advertised for static assets
    pub asset_max_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            static_dir: PathBuf::from("www"),
            asset_max_age: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl BounceConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BOUNCE_TIMER_URL") {
            config.clock.timer_url = url;
        }

        if let Ok(rate) = std::env::var("BOUNCE_TICKS_PER_SECOND") {
            if let Ok(value) = rate.parse::<f64>() {
                config.display.ticks_per_second = value;
            }
        }

        if let Ok(host) = std::env::var("BOUNCE_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("BOUNCE_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                config.server.port = value;
            }
        }

        if let Ok(dir) = std::env::var("BOUNCE_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir);
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            clock: ClockConfig {
                sync_interval: Duration::from_millis(10),
                sync_jitter: Duration::from_millis(5),
                request_timeout: Duration::from_secs(2),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Rejects settings that would make viewers disagree or crash.
    ///
    /// # Errors
    ///
    /// - `BounceError::Configuration` - If the tick rate is not a positive finite number,
    ///   there are no logos, or the timer URL does not parse
    pub fn validate(&self) -> Result<(), BounceError> {
        let rate = self.display.ticks_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(BounceError::Configuration {
                reason: format!("ticks_per_second must be positive, got {rate}"),
            });
        }

        if self.display.logo_count == 0 {
            return Err(BounceError::Configuration {
                reason: "logo_count must be at least 1".to_string(),
            });
        }

        url::Url::parse(&self.clock.timer_url).map_err(|e| BounceError::Configuration {
            reason: format!("invalid timer URL {}: {e}", self.clock.timer_url),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BounceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clock.sync_interval, Duration::from_secs(20));
        assert_eq!(config.clock.sync_jitter, Duration::from_secs(5));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_validate_rejects_bad_tick_rate() {
        let mut config = BounceConfig::default();
        config.display.ticks_per_second = 0.0;
        assert!(matches!(
            config.validate(),
            Err(BounceError::Configuration { .. })
        ));

        config.display.ticks_per_second = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_logos_and_bad_url() {
        let mut config = BounceConfig::default();
        config.display.logo_count = 0;
        assert!(config.validate().is_err());

        let mut config = BounceConfig::default();
        config.clock.timer_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("BOUNCE_PORT", "9001");
            std::env::set_var("BOUNCE_TICKS_PER_SECOND", "abc");
            std::env::set_var("BOUNCE_TIMER_URL", "http://10.0.0.5:8000/timer");
        }

        let config = BounceConfig::from_env();

        assert_eq!(config.server.port, 9001);
        assert_eq!(config.clock.timer_url, "http://10.0.0.5:8000/timer");
        // Unparsable values leave the default in place.
        assert_eq!(config.display.ticks_per_second, 60.0);
        assert!(config.validate().is_ok());

        // Cleanup
        unsafe {
            std::env::remove_var("BOUNCE_PORT");
            std::env::remove_var("BOUNCE_TICKS_PER_SECOND");
            std::env::remove_var("BOUNCE_TIMER_URL");
        }
    }

    #[test]
    fn test_testing_profile_syncs_quickly() {
        let config = BounceConfig::for_testing();
        assert!(config.clock.sync_interval < Duration::from_secs(1));
        assert_eq!(config.display.canvas_width, 640);
    }
}
