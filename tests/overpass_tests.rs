use citystep::models::{RoadType, RoutePoint};
use citystep::services::{AttributeProvider, OverpassRoadTypeProvider};

mod common;

#[tokio::test]
async fn test_overpass_road_type_on_pedestrian_street() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let provider = OverpassRoadTypeProvider::new();

    // Old Arbat, a pedestrian street
    let start = RoutePoint::new(55.7497, 37.5913).unwrap();
    let end = RoutePoint::new(55.7492, 37.5896).unwrap();

    let result = provider.lookup(&start, &end).await;

    assert!(result.is_ok(), "Overpass query should succeed");
    let road_type = result.unwrap();
    assert!(
        road_type <= RoadType::Residential,
        "Expected a walkable road type, got {:?}",
        road_type
    );
}

#[tokio::test]
async fn test_overpass_result_is_cached() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let provider = OverpassRoadTypeProvider::new();
    let start = RoutePoint::new(55.7539, 37.6208).unwrap();
    let end = RoutePoint::new(55.7530, 37.6190).unwrap();

    let first = provider.lookup(&start, &end).await.unwrap();
    let second = provider.lookup(&start, &end).await.unwrap();

    assert_eq!(first, second);
}
