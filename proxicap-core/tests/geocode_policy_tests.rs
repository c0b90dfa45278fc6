//! Property-Based Tests for the Free-Tier Protector
//!
//! **Property: No Lookup Within the Movement Threshold**
//!
//! For any cached coordinate and any reading within the threshold on both
//! axes, the policy reuses the cached address; outside it on either axis, it
//! does not.

use proptest::prelude::*;
use proxicap_core::{
    CacheEntry, GeocodePolicy, ReverseGeocodeResponse, DEFAULT_MOVEMENT_THRESHOLD_DEG,
};

fn cached_at(lat: f64, lon: f64) -> CacheEntry {
    CacheEntry {
        address: "Kingsway Mall".to_string(),
        lat,
        lon,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_within_threshold_reuses(
        lat in -80.0f64..80.0,
        lon in -170.0f64..170.0,
        dlat in -0.00049f64..0.00049,
        dlon in -0.00049f64..0.00049,
    ) {
        let policy = GeocodePolicy::default();
        let cached = cached_at(lat, lon);
        prop_assert_eq!(
            policy.reusable(Some(&cached), lat + dlat, lon + dlon),
            Some("Kingsway Mall")
        );
    }

    #[test]
    fn prop_outside_threshold_looks_up(
        lat in -80.0f64..80.0,
        lon in -170.0f64..170.0,
        offset in 0.00051f64..1.0,
        on_lat_axis in any::<bool>(),
    ) {
        let policy = GeocodePolicy::default();
        let cached = cached_at(lat, lon);
        let (new_lat, new_lon) = if on_lat_axis {
            (lat + offset, lon)
        } else {
            (lat, lon - offset)
        };
        prop_assert_eq!(policy.reusable(Some(&cached), new_lat, new_lon), None);
    }

    #[test]
    fn prop_mall_always_wins(
        road in "[A-Za-z ]{1,20}",
        number in "[0-9]{1,4}",
        display in "[A-Za-z, ]{0,30}",
    ) {
        let body = serde_json::json!({
            "display_name": display,
            "address": {"mall": "Kingsway Mall", "road": road, "house_number": number}
        })
        .to_string();
        let response = ReverseGeocodeResponse::from_json(&body)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(response.place_name(), "Kingsway Mall");
    }

    #[test]
    fn prop_place_name_never_empty(
        display in proptest::option::of("[A-Za-z, ]{0,30}"),
        road in proptest::option::of("[A-Za-z ]{0,10}"),
    ) {
        let body = serde_json::json!({
            "display_name": display,
            "address": {"road": road}
        })
        .to_string();
        let response = ReverseGeocodeResponse::from_json(&body)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(!response.place_name().trim().is_empty());
    }
}

#[test]
fn test_threshold_constant() {
    assert_eq!(GeocodePolicy::default().movement_threshold_deg, DEFAULT_MOVEMENT_THRESHOLD_DEG);
}
