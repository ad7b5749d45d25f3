//! Integration tests for grid classification and dimension resolution over
//! in-memory zarr stores.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chunk_store::{
    ChunkedArrayStore, DatasetLocator, MemoryBackend, StaticBackendResolver, StoreBackend,
    StoreConfig, StoreError,
};
use chrono::{TimeZone, Utc};
use geo_common::report::CollectingErrorReporter;
use geo_common::ErrorReporter;
use grid_processor::{
    read_time_axis, selection_for, DimensionPresets, DimensionRangeResolver, GridTopologyClassifier,
    GridType, TopologyConfig,
};
use serde_json::json;
use test_utils::{
    curvilinear_mesh, reduced_gaussian_cells, regular_axes, scattered_cells, ArraySpec, ZarrFixture,
};

const STORE: &str = "memory://model.zarr";

fn locator(dataset: &str) -> DatasetLocator {
    DatasetLocator::new(STORE, dataset)
}

fn store_with(fixture: ZarrFixture) -> Arc<ChunkedArrayStore> {
    let backend = Arc::new(MemoryBackend::from_files(fixture.into_files()));
    let resolver = StaticBackendResolver::new().with_backend(STORE, backend);
    Arc::new(ChunkedArrayStore::new(StoreConfig::default(), Arc::new(resolver)).unwrap())
}

fn classifier_for(
    store: Arc<ChunkedArrayStore>,
) -> (GridTopologyClassifier, Arc<CollectingErrorReporter>) {
    let reporter = Arc::new(CollectingErrorReporter::new());
    let classifier = GridTopologyClassifier::new(
        store,
        reporter.clone() as Arc<dyn ErrorReporter>,
        TopologyConfig::default(),
    );
    (classifier, reporter)
}

/// A group `data` holding `var` on the given dimensions, filled with zeros.
fn variable_group(shape: &[usize], dims: &[&str], attrs: serde_json::Value) -> ZarrFixture {
    let len: usize = shape.iter().product();
    let mut spec = ArraySpec::new(shape).dims(dims);
    if let Some(map) = attrs.as_object() {
        for (k, v) in map {
            spec = spec.attr(k, v.clone());
        }
    }
    ZarrFixture::new()
        .group("data", json!({}))
        .array("data/var", spec, &vec![0.0f32; len], Some(f32::NAN))
}

fn coordinate(fixture: ZarrFixture, path: &str, shape: &[usize], values: &[f64]) -> ZarrFixture {
    let dims: Vec<String> = (0..shape.len()).map(|i| format!("d{}", i)).collect();
    let dims: Vec<&str> = dims.iter().map(String::as_str).collect();
    fixture.array(path, ArraySpec::new(shape).dims(&dims), values, None)
}

/// Backend that refuses every request.
struct OfflineBackend;

#[async_trait]
impl StoreBackend for OfflineBackend {
    async fn get(&self, key: &str) -> chunk_store::Result<Option<Bytes>> {
        Err(StoreError::transport(format!("connection reset reading {}", key)))
    }

    async fn list_dir(&self, _prefix: &str) -> chunk_store::Result<Vec<String>> {
        Err(StoreError::transport("connection reset"))
    }
}

// ============================================================================
// Probe precedence
// ============================================================================

#[tokio::test]
async fn test_triangular_wins_over_everything_else() {
    // the grid group carries connectivity; the variable also looks regular
    let fixture = variable_group(&[2, 4, 8], &["time", "lat", "lon"], json!({}))
        .group("grid", json!({}))
        .array(
            "grid/vertex_of_cell",
            ArraySpec::new(&[3, 4]).dims(&["nv", "cell"]),
            &[0i32, 1, 2, 3, 1, 2, 3, 4, 2, 3, 4, 5],
            None,
        );
    let (classifier, reporter) = classifier_for(store_with(fixture));

    let result = classifier
        .classify_detailed(&locator("grid"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::Triangular);
    assert_eq!(result.probe, Some("triangular"));
    assert!(reporter.messages().is_empty());
}

#[tokio::test]
async fn test_healpix_grid_mapping() {
    let fixture = variable_group(&[3, 48], &["time", "cell"], json!({"grid_mapping": "crs"}))
        .array(
            "data/crs",
            ArraySpec::new(&[1])
                .dims(&["crs"])
                .attr("grid_mapping_name", json!("healpix"))
                .attr("healpix_nside", json!(2)),
            &[0i32],
            None,
        );
    let (classifier, _) = classifier_for(store_with(fixture));

    let grid_type = classifier
        .classify(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(grid_type, GridType::Healpix);
}

#[tokio::test]
async fn test_rotated_pole_mapping_in_grid_source() {
    // the mapping variable lives next to the grid, not the variable
    let fixture = variable_group(
        &[2, 4, 8],
        &["time", "rlat", "rlon"],
        json!({"grid_mapping": "rotated_pole: rlat rlon"}),
    )
    .group("grid", json!({}))
    .array(
        "grid/rotated_pole",
        ArraySpec::new(&[1])
            .dims(&["one"])
            .attr("grid_mapping_name", json!("rotated_latitude_longitude"))
            .attr("grid_north_pole_latitude", json!(39.25))
            .attr("grid_north_pole_longitude", json!(-162.0)),
        &[0i32],
        None,
    );
    let (classifier, _) = classifier_for(store_with(fixture));

    let result = classifier
        .classify_detailed(&locator("grid"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::RegularRotated);
    assert_eq!(result.probe, Some("grid_mapping"));
}

#[tokio::test]
async fn test_unknown_grid_mapping_falls_through() {
    let fixture = variable_group(&[4, 8], &["lat", "lon"], json!({}))
        .array(
            "data/crs",
            ArraySpec::new(&[1])
                .dims(&["one"])
                .attr("grid_mapping_name", json!("latitude_longitude")),
            &[0i32],
            None,
        );
    let (classifier, _) = classifier_for(store_with(fixture));

    let result = classifier
        .classify_detailed(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::Regular);
    assert_eq!(result.probe, Some("axis_names"));
}

// ============================================================================
// Coordinate signatures
// ============================================================================

#[tokio::test]
async fn test_curvilinear_from_declared_coordinates() {
    let (lat, lon) = curvilinear_mesh(6, 8);
    let fixture = variable_group(
        &[2, 6, 8],
        &["time", "y", "x"],
        json!({"coordinates": "latitude longitude"}),
    );
    let fixture = coordinate(fixture, "data/latitude", &[6, 8], &lat);
    let fixture = coordinate(fixture, "data/longitude", &[6, 8], &lon);
    let (classifier, _) = classifier_for(store_with(fixture));

    let result = classifier
        .classify_detailed(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::Curvilinear);
    assert_eq!(result.probe, Some("coordinate_shape"));
}

#[tokio::test]
async fn test_gaussian_reduced_cells() {
    let (lat, lon) = reduced_gaussian_cells(&[4, 8, 12, 12, 8, 4]);
    let n = lat.len();
    let fixture = variable_group(&[2, n], &["time", "values"], json!({}))
        .group("grid", json!({}));
    let fixture = coordinate(fixture, "grid/lat", &[n], &lat);
    let fixture = coordinate(fixture, "grid/lon", &[n], &lon);
    let (classifier, _) = classifier_for(store_with(fixture));

    let grid_type = classifier
        .classify(&locator("grid"), &locator("data"), "var")
        .await;
    assert_eq!(grid_type, GridType::GaussianReduced);
}

#[tokio::test]
async fn test_irregular_cells_with_icon_style_names() {
    let (lat, lon) = scattered_cells(64);
    let fixture = variable_group(&[64], &["ncells"], json!({}));
    let fixture = coordinate(fixture, "data/clat", &[64], &lat);
    let fixture = coordinate(fixture, "data/clon", &[64], &lon);
    let (classifier, _) = classifier_for(store_with(fixture));

    let grid_type = classifier
        .classify(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(grid_type, GridType::Irregular);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_no_matching_signature_is_reported() {
    // separable 1-D axes under unrecognised dimension names
    let (lat, lon) = regular_axes(4, 8);
    let fixture = variable_group(&[4, 8], &["y", "x"], json!({}));
    let fixture = coordinate(fixture, "data/lat", &[4], &lat);
    let fixture = coordinate(fixture, "data/lon", &[8], &lon);
    let (classifier, reporter) = classifier_for(store_with(fixture));

    let result = classifier
        .classify_detailed(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::Error);
    assert_eq!(result.diagnostic.as_deref(), Some("no matching grid type found"));

    let messages = reporter.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].ends_with("no matching grid type found"), "{}", messages[0]);
}

#[tokio::test]
async fn test_missing_coordinates_are_an_error() {
    let fixture = variable_group(&[10], &["cell"], json!({}));
    let (classifier, reporter) = classifier_for(store_with(fixture));

    let grid_type = classifier
        .classify(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(grid_type, GridType::Error);
    assert_eq!(reporter.messages().len(), 1);
}

#[tokio::test]
async fn test_transport_failure_yields_error_tag() {
    let resolver = StaticBackendResolver::new().with_backend(STORE, Arc::new(OfflineBackend));
    let store = Arc::new(ChunkedArrayStore::new(StoreConfig::default(), Arc::new(resolver)).unwrap());
    let (classifier, reporter) = classifier_for(store);

    let result = classifier
        .classify_detailed(&locator("grid"), &locator("data"), "var")
        .await;
    assert_eq!(result.grid_type, GridType::Error);
    assert!(result.diagnostic.unwrap().contains("connection reset"));
    assert_eq!(reporter.messages().len(), 1);
    assert_eq!(classifier.memoized().await, 0);
}

// ============================================================================
// Memoization
// ============================================================================

#[tokio::test]
async fn test_successful_classification_is_memoized() {
    let fixture = variable_group(&[4, 8], &["latitude", "longitude"], json!({}));
    let (classifier, _) = classifier_for(store_with(fixture));

    let first = classifier
        .classify_detailed(&locator("data"), &locator("data"), "var")
        .await;
    let second = classifier
        .classify_detailed(&locator("data"), &locator("data"), "var")
        .await;
    assert_eq!(first, second);
    assert_eq!(classifier.memoized().await, 1);

    classifier.forget().await;
    assert_eq!(classifier.memoized().await, 0);
}

#[tokio::test]
async fn test_errors_are_not_memoized() {
    let fixture = variable_group(&[10], &["cell"], json!({}));
    let (classifier, reporter) = classifier_for(store_with(fixture));

    for _ in 0..2 {
        let grid_type = classifier
            .classify(&locator("data"), &locator("data"), "var")
            .await;
        assert_eq!(grid_type, GridType::Error);
    }
    assert_eq!(reporter.messages().len(), 2);
    assert_eq!(classifier.memoized().await, 0);
}

// ============================================================================
// Dimension resolution end to end
// ============================================================================

fn climate_store() -> Arc<ChunkedArrayStore> {
    let tas: Vec<f32> = (0..6)
        .flat_map(|t| (0..4).flat_map(move |y| (0..8).map(move |x| (t * 100 + y * 10 + x) as f32)))
        .collect();
    let fixture = ZarrFixture::new()
        .group("atm", json!({}))
        .array(
            "atm/tas",
            ArraySpec::new(&[6, 4, 8]).chunks(&[1, 4, 4]).dims(&["time", "lat", "lon"]),
            &tas,
            Some(f32::NAN),
        )
        .array(
            "atm/time",
            ArraySpec::new(&[6])
                .dims(&["time"])
                .attr("units", json!("hours since 2024-01-01 00:00:00"))
                .attr("calendar", json!("proleptic_gregorian")),
            &[0.0f64, 6.0, 12.0, 18.0, 24.0, 30.0],
            None,
        )
        .consolidate("atm");
    store_with(fixture)
}

#[tokio::test]
async fn test_resolve_classify_and_read_a_slice() {
    let store = climate_store();
    let source = locator("atm");
    let (classifier, _) = classifier_for(store.clone());

    let grid_type = classifier.classify(&source, &source, "tas").await;
    assert_eq!(grid_type, GridType::Regular);

    let mut resolver =
        DimensionRangeResolver::with_presets(DimensionPresets::new().with_start("time", 4));
    let handle = store.resolve_variable(&source, "tas").await.unwrap();
    let resolution = resolver.resolve_variable(&handle, grid_type, false).unwrap();
    assert_eq!(resolution.indices, vec![Some(4), None, None]);

    let slice = store
        .read_selection(&source, "tas", &selection_for(&resolution.indices))
        .await
        .unwrap();
    assert_eq!(slice.shape, vec![4, 8]);
    assert_eq!(slice.get_f64(0), Some(400.0));
    assert_eq!(slice.get_f64(31), Some(437.0));
}

#[tokio::test]
async fn test_time_axis_labels() {
    let store = climate_store();
    let times = read_time_axis(&store, &locator("atm"), "time").await.unwrap();
    assert_eq!(times.len(), 6);
    assert_eq!(times[0], Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(times[5], Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap());
}

#[tokio::test]
async fn test_time_axis_without_units_is_rejected() {
    let store = climate_store();
    assert!(read_time_axis(&store, &locator("atm"), "tas").await.is_err());
}
