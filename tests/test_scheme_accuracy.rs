use geofence_phe::{
    classify_results, encode_location, evaluate_registry, generate_keypair, haversine_distance,
    EncryptionContext, GeofenceCenter, GeofenceRegistry, GeofenceStatus, Scheme,
};
use rand::thread_rng;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const RADIUS_M: f64 = 1000.0;
const KEY_BITS: u64 = 512;

fn west_cork_center() -> GeofenceCenter {
    GeofenceCenter::from_degrees(-9.724087, 51.573037)
}

fn classify_point(
    scheme: Scheme,
    latitude: f64,
    longitude: f64,
    keys: &geofence_phe::PaillierKeyPair,
    registry: &GeofenceRegistry,
) -> Vec<geofence_phe::ClassificationResult> {
    let context = EncryptionContext::new(keys.public().clone());
    let terms = encode_location(scheme, latitude, longitude, &context).unwrap();
    let values = evaluate_registry(scheme, &terms, &context, registry).unwrap();
    classify_results(scheme, &values, keys.private(), RADIUS_M, EARTH_RADIUS_M).unwrap()
}

#[test]
fn both_schemes_agree_with_the_plaintext_baseline() {
    let keys = generate_keypair(KEY_BITS);
    let center = west_cork_center();
    let registry = GeofenceRegistry::new(vec![center], RADIUS_M, EARTH_RADIUS_M);
    let mut rng = thread_rng();
    let points =
        geofence_phe::test_utils::generate_user_points(&center, RADIUS_M, EARTH_RADIUS_M, 5, &mut rng);

    for (lat, lon) in points.inside.iter().chain(&points.outside).chain(&points.edge) {
        let truth = haversine_distance(*lat, *lon, center.latitude(), center.longitude(), EARTH_RADIUS_M)
            <= RADIUS_M;
        for scheme in [Scheme::Reference, Scheme::Proposed] {
            let results = classify_point(scheme, *lat, *lon, &keys, &registry);
            let expected =
                if truth { GeofenceStatus::Inside } else { GeofenceStatus::Outside };
            assert_eq!(
                results[0].status,
                expected,
                "{} scheme disagrees with baseline at ({lat}, {lon})",
                scheme.name(),
            );
        }
    }
}

#[test]
fn user_at_the_center_is_inside_with_a_near_zero_proxy() {
    let keys = generate_keypair(KEY_BITS);
    let center = west_cork_center();
    let registry = GeofenceRegistry::new(vec![center], RADIUS_M, EARTH_RADIUS_M);

    for scheme in [Scheme::Reference, Scheme::Proposed] {
        let results = classify_point(scheme, center.latitude(), center.longitude(), &keys, &registry);
        assert_eq!(results[0].status, GeofenceStatus::Inside);
        assert!(
            results[0].distance_proxy.abs() < 1e-12,
            "{} proxy {}",
            scheme.name(),
            results[0].distance_proxy,
        );
    }
}

#[test]
fn round_trip_against_the_own_location_is_under_a_meter() {
    let keys = generate_keypair(KEY_BITS);
    let center = west_cork_center();
    let registry = GeofenceRegistry::new(vec![center], RADIUS_M, EARTH_RADIUS_M);

    for scheme in [Scheme::Reference, Scheme::Proposed] {
        let results = classify_point(scheme, center.latitude(), center.longitude(), &keys, &registry);
        let distance = match scheme {
            Scheme::Reference => {
                let v = results[0].distance_proxy;
                EARTH_RADIUS_M * 2.0 * v.sqrt().atan2((1.0 - v).sqrt())
            }
            Scheme::Proposed => {
                2.0 * EARTH_RADIUS_M * (results[0].distance_proxy / 2.0).sqrt().asin()
            }
        };
        assert!(distance < 1.0, "{} decoded to {distance} m", scheme.name());
    }
}

#[test]
fn half_a_degree_of_latitude_away_is_outside() {
    let keys = generate_keypair(KEY_BITS);
    let center = west_cork_center();
    let registry = GeofenceRegistry::new(vec![center], RADIUS_M, EARTH_RADIUS_M);
    let offset_lat = center.latitude() + 0.5f64.to_radians();

    for scheme in [Scheme::Reference, Scheme::Proposed] {
        let results = classify_point(scheme, offset_lat, center.longitude(), &keys, &registry);
        assert_eq!(results[0].status, GeofenceStatus::Outside, "{}", scheme.name());
    }
}

#[test]
fn results_follow_registry_order() {
    let keys = generate_keypair(KEY_BITS);
    let near = west_cork_center();
    let far_north = GeofenceCenter::from_degrees(-9.724087, 52.1);
    let far_east = GeofenceCenter::from_degrees(-9.1, 51.573037);
    let registry =
        GeofenceRegistry::new(vec![far_north, near, far_east], RADIUS_M, EARTH_RADIUS_M);

    let results =
        classify_point(Scheme::Proposed, near.latitude(), near.longitude(), &keys, &registry);
    let statuses: Vec<GeofenceStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [GeofenceStatus::Outside, GeofenceStatus::Inside, GeofenceStatus::Outside]
    );
}
