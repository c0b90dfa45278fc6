//! Property tests for the ingest path through the full router.

mod support;

use axum::http::{Method, StatusCode};
use proptest::prelude::*;
use proxicap_test_utils::{arb_device_payload, arb_malformed_body, device_payload};
use support::TestRelay;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime builds")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any well-formed payload is accepted and the public view never
    /// carries coordinates.
    #[test]
    fn prop_valid_payloads_are_accepted_and_redacted(payload in arb_device_payload()) {
        let rt = runtime();
        let (status, snapshot) = rt.block_on(async {
            let relay = TestRelay::new();
            let response = relay.post(payload.clone()).await;
            (response.status, relay.get().await.json())
        });

        prop_assert_eq!(status, StatusCode::OK);
        prop_assert_eq!(&snapshot["status"], &payload["status"]);
        prop_assert!(snapshot.get("lat").is_none());
        prop_assert!(snapshot.get("lon").is_none());
        prop_assert!(snapshot["address"].is_string());
    }

    /// Malformed bodies are rejected without touching the stored snapshot
    /// or calling the geocoder again.
    #[test]
    fn prop_malformed_bodies_leave_state_untouched(body in arb_malformed_body()) {
        let rt = runtime();
        let (status, text, before, after, calls) = rt.block_on(async {
            let relay = TestRelay::new();
            relay.post(device_payload("Normal", Some(53.5), Some(-113.5))).await;
            let before = relay.get().await.json();

            let response = relay.send(Method::POST, "/update", body.clone()).await;
            let after = relay.get().await.json();
            (response.status, response.text(), before, after, relay.geocoder.calls())
        });

        prop_assert_eq!(status, StatusCode::BAD_REQUEST);
        prop_assert_eq!(text, "Invalid JSON");
        prop_assert_eq!(before, after);
        prop_assert_eq!(calls, 1);
    }
}
