//! Engine configuration loaded from environment variables.

use std::time::Duration;

/// Bounds for the playback tick; values outside are clamped.
const TICK_MS_MIN: u64 = 100;
const TICK_MS_MAX: u64 = 5000;

/// Configuration for one engine instance.
///
/// All fields have defaults suitable for local development; override via
/// environment variables (a `.env` file is honored).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the transition-classification service.
    pub inference_api_url: String,
    /// Base URL of the record persistence service.
    pub records_api_url: String,
    /// Deadline for one inference run, in seconds.
    pub inference_timeout_secs: u64,
    /// Playback advance interval, in milliseconds.
    pub playback_tick_ms: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `INFERENCE_API_URL`      | `http://127.0.0.1:8500`  |
    /// | `RECORDS_API_URL`        | `http://127.0.0.1:8600`  |
    /// | `INFERENCE_TIMEOUT_SECS` | `30`                     |
    /// | `PLAYBACK_TICK_MS`       | `600` (clamped 100-5000) |
    pub fn from_env() -> Self {
        // Pick up a local .env first; missing files are fine.
        dotenvy::dotenv().ok();

        let inference_api_url = std::env::var("INFERENCE_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8500".into());

        let records_api_url =
            std::env::var("RECORDS_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8600".into());

        let inference_timeout_secs: u64 = std::env::var("INFERENCE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("INFERENCE_TIMEOUT_SECS must be a valid u64");

        let playback_tick_ms: u64 = std::env::var("PLAYBACK_TICK_MS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("PLAYBACK_TICK_MS must be a valid u64");

        Self {
            inference_api_url,
            records_api_url,
            inference_timeout_secs,
            playback_tick_ms: playback_tick_ms.clamp(TICK_MS_MIN, TICK_MS_MAX),
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    pub fn playback_tick(&self) -> Duration {
        Duration::from_millis(self.playback_tick_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inference_api_url: "http://127.0.0.1:8500".into(),
            records_api_url: "http://127.0.0.1:8600".into(),
            inference_timeout_secs: 30,
            playback_tick_ms: 600,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
