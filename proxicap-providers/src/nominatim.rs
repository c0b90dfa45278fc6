//! Nominatim reverse-geocoding client with a local request quota

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use proxicap_core::{ConfigError, GeocodeError, ReverseGeocodeResponse, ReverseGeocoder};
use reqwest::{Client, StatusCode};

use crate::build_client;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const PROVIDER_ID: &str = "nominatim";

/// Connection settings for a Nominatim instance.
#[derive(Debug, Clone, PartialEq)]
pub struct NominatimConfig {
    /// Instance root, without the `/reverse` path.
    pub base_url: String,
    /// Sent on every request; the public instance rejects anonymous clients.
    pub user_agent: String,
    pub timeout: Duration,
    /// Local quota. The public instance allows one request per second.
    pub requests_per_second: u32,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "ProxiCap-Wearable/1.0".to_string(),
            timeout: Duration::from_secs(10),
            requests_per_second: 1,
        }
    }
}

impl NominatimConfig {
    pub fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url.trim_end_matches('/'))
    }
}

/// Reverse geocoder backed by the Nominatim HTTP API.
///
/// Requests over the local quota fail fast with [`GeocodeError::Throttled`]
/// instead of waiting, so an ingest never queues behind the limiter.
pub struct NominatimGeocoder {
    client: Client,
    reverse_url: String,
    limiter: DirectRateLimiter,
}

impl NominatimGeocoder {
    pub fn new(config: &NominatimConfig) -> Result<Self, ConfigError> {
        let client = build_client(
            Client::builder()
                .timeout(config.timeout)
                .user_agent(config.user_agent.clone()),
            "PROXICAP_GEOCODE_USER_AGENT",
        )?;
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            reverse_url: config.reverse_url(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeResponse, GeocodeError> {
        if self.limiter.check().is_err() {
            tracing::warn!(provider = PROVIDER_ID, "Local geocode quota exhausted");
            return Err(GeocodeError::Throttled {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let lat = lat.to_string();
        let lon = lon.to_string();
        let response = self
            .client
            .get(&self.reverse_url)
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| GeocodeError::Transport {
            reason: format!("Failed to read response body: {}", e),
        })?;
        ReverseGeocodeResponse::from_json(&body)
    }
}

impl std::fmt::Debug for NominatimGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimGeocoder")
            .field("reverse_url", &self.reverse_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxicap_test_utils::{kingsway_mall_body, StubServer};

    fn geocoder_for(stub: &StubServer) -> NominatimGeocoder {
        let config = NominatimConfig {
            base_url: stub.base_url().to_string(),
            timeout: Duration::from_secs(2),
            ..NominatimConfig::default()
        };
        NominatimGeocoder::new(&config).expect("client builds")
    }

    #[test]
    fn test_reverse_url_joins_cleanly() {
        let config = NominatimConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..NominatimConfig::default()
        };
        assert_eq!(config.reverse_url(), "http://localhost:8080/reverse");
        assert_eq!(
            NominatimConfig::default().reverse_url(),
            "https://nominatim.openstreetmap.org/reverse"
        );
    }

    #[tokio::test]
    async fn test_second_call_in_same_second_is_throttled() {
        // Port 9 (discard) on localhost: the first call fails in transport,
        // the second never leaves the process.
        let config = NominatimConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            ..NominatimConfig::default()
        };
        let geocoder = NominatimGeocoder::new(&config).expect("client builds");

        let first = geocoder.reverse(53.5, -113.5).await;
        assert!(!matches!(first, Err(GeocodeError::Throttled { .. })));

        let second = geocoder.reverse(53.5, -113.5).await;
        assert_eq!(
            second,
            Err(GeocodeError::Throttled {
                provider: "nominatim".to_string()
            })
        );
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let config = NominatimConfig {
            requests_per_second: 0,
            ..NominatimConfig::default()
        };
        assert!(NominatimGeocoder::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_reverse_sends_query_and_user_agent() {
        let stub = StubServer::start(200, kingsway_mall_body())
            .await
            .expect("stub binds");
        let geocoder = geocoder_for(&stub);

        let response = geocoder.reverse(53.558, -113.504).await.expect("resolves");
        assert_eq!(response.place_name(), "Kingsway Mall");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method(), "GET");
        assert_eq!(
            request.target(),
            "/reverse?format=json&lat=53.558&lon=-113.504&addressdetails=1"
        );
        assert!(request.request_line.ends_with("HTTP/1.1"));
        assert_eq!(request.header("user-agent"), Some("ProxiCap-Wearable/1.0"));
    }

    #[tokio::test]
    async fn test_non_200_maps_to_status_error() {
        let stub = StubServer::start(429, r#"{"error":"Too Many Requests"}"#)
            .await
            .expect("stub binds");
        let geocoder = geocoder_for(&stub);

        let err = geocoder.reverse(53.5, -113.5).await.unwrap_err();
        assert_eq!(err, GeocodeError::Status { status: 429 });
        assert_eq!(err.placeholder(), proxicap_core::GEOCODE_LIMIT_REACHED);
    }

    #[tokio::test]
    async fn test_unparseable_200_maps_to_parse_error() {
        let stub = StubServer::start(200, "<html>maintenance</html>")
            .await
            .expect("stub binds");
        let geocoder = geocoder_for(&stub);

        let err = geocoder.reverse(53.5, -113.5).await.unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }), "got {err:?}");
        assert_eq!(stub.requests().len(), 1);
    }
}
