//! Where server and local time come from.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ClockSyncError;
use crate::config::ClockConfig;

/// Payload of the time-reference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeReference {
    /// Server process start, milliseconds since the Unix epoch.
    pub epoch: i64,
    /// Server's current time, milliseconds since the Unix epoch.
    pub time: i64,
}

impl TimeReference {
    /// Parses the JSON body returned by the time endpoint.
    ///
    /// # Errors
    ///
    /// - `ClockSyncError::MalformedPayload` - If the body is not `{"epoch": int, "time": int}`
    pub fn from_json(body: &[u8]) -> Result<Self, ClockSyncError> {
        serde_json::from_slice(body).map_err(|e| ClockSyncError::MalformedPayload {
            reason: e.to_string(),
        })
    }
}

/// Source of server time references.
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Fetches the current time reference.
    ///
    /// # Errors
    ///
    /// - `ClockSyncError` - If the reference could not be obtained or parsed
    async fn fetch(&self) -> Result<TimeReference, ClockSyncError>;
}

#[async_trait]
impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    async fn fetch(&self) -> Result<TimeReference, ClockSyncError> {
        (**self).fetch().await
    }
}

/// Local wall clock in milliseconds since the Unix epoch.
pub trait LocalClock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Local clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Time source polling an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTimeSource {
    url: Url,
    client: reqwest::Client,
}

impl HttpTimeSource {
    /// Creates a client for the configured timer URL.
    ///
    /// # Errors
    ///
    /// - `ClockSyncError::InvalidUrl` - If the timer URL does not parse
    /// - `ClockSyncError::Request` - If the HTTP client cannot be built
    pub fn new(config: &ClockConfig) -> Result<Self, ClockSyncError> {
        let url = Url::parse(&config.timer_url).map_err(|e| ClockSyncError::InvalidUrl {
            url: config.timer_url.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl TimeSource for HttpTimeSource {
    async fn fetch(&self) -> Result<TimeReference, ClockSyncError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClockSyncError::HttpStatus {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        TimeReference::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_reference() {
        let reference = TimeReference::from_json(br#"{"epoch":1000,"time":5000}"#).unwrap();
        assert_eq!(
            reference,
            TimeReference {
                epoch: 1000,
                time: 5000,
            }
        );
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let reference =
            TimeReference::from_json(br#"{"time":2,"epoch":1,"server":"x"}"#).unwrap();
        assert_eq!(reference.epoch, 1);
        assert_eq!(reference.time, 2);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        let bodies: [&[u8]; 4] = [
            b"not json",
            br#"{"epoch":1000}"#,
            br#"{"epoch":"1000","time":5000}"#,
            br#"{"epoch":1000.5,"time":5000}"#,
        ];
        for body in bodies {
            assert!(matches!(
                TimeReference::from_json(body),
                Err(ClockSyncError::MalformedPayload { .. })
            ));
        }
    }

    #[test]
    fn test_http_source_rejects_bad_url() {
        let config = ClockConfig {
            timer_url: "::nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTimeSource::new(&config),
            Err(ClockSyncError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
