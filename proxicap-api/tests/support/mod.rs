//! Shared harness for router tests: a relay wired to scripted mocks.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use proxicap_api::{create_router, AppState, RelayConfig};
use proxicap_test_utils::{kingsway_mall_body, ManualClock, MockGeocoder, MockNotifier};
use tower::ServiceExt;

pub struct TestRelay {
    pub app: Router,
    pub state: AppState,
    pub geocoder: Arc<MockGeocoder>,
    pub notifier: Arc<MockNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestRelay {
    pub fn new() -> Self {
        Self::with(
            RelayConfig::default(),
            MockGeocoder::always(kingsway_mall_body()),
            MockNotifier::new(),
        )
    }

    pub fn with(config: RelayConfig, geocoder: MockGeocoder, notifier: MockNotifier) -> Self {
        let geocoder = Arc::new(geocoder);
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::starting_now());
        let state = AppState::new(&config, geocoder.clone(), notifier.clone(), clock.clone());
        Self {
            app: create_router(state.clone()),
            state,
            geocoder,
            notifier,
            clock,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: impl Into<Body>) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request builds");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    pub async fn post(&self, payload: serde_json::Value) -> TestResponse {
        self.send(Method::POST, "/update", payload.to_string()).await
    }

    pub async fn get(&self) -> TestResponse {
        self.send(Method::GET, "/update", Body::empty()).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_cors_headers(&self) -> bool {
        self.header("access-control-allow-origin") == Some("*")
            && self.header("access-control-allow-headers") == Some("Content-Type")
            && self.header("access-control-allow-methods") == Some("GET,POST,OPTIONS")
    }
}
