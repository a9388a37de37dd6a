use anyhow::Result;
use geocode_csv::adapters::google::GeocoderSettings;
use geocode_csv::{
    EtlEngine, FieldMapping, FixedIntervalGate, GeocodeConfig, GeocodeError, GeocodePipeline,
    GoogleGeocoder, LocalStorage, PipelineSettings,
};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";

fn mit_response() -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "results": [{
            "address_components": [
                {"long_name": "77", "short_name": "77", "types": ["street_number"]},
                {"long_name": "Massachusetts Avenue", "short_name": "Massachusetts Ave", "types": ["route"]},
                {"long_name": "Cambridge", "short_name": "Cambridge", "types": ["locality", "political"]},
                {"long_name": "Massachusetts", "short_name": "MA", "types": ["administrative_area_level_1", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]},
                {"long_name": "02139", "short_name": "02139", "types": ["postal_code"]}
            ],
            "formatted_address": "77 Massachusetts Ave, Cambridge, MA 02139, USA",
            "geometry": {"location": {"lat": 42.3601, "lng": -71.0942}},
            "types": ["street_address"]
        }]
    })
}

fn build_engine(
    server: &MockServer,
    dir: &TempDir,
    mapping: FieldMapping,
) -> Result<EtlEngine<GeocodePipeline<LocalStorage, GoogleGeocoder, FixedIntervalGate>>> {
    let geocoder = GoogleGeocoder::new(GeocoderSettings {
        endpoint: server.url(GEOCODE_PATH),
        api_key: Some("test-key".to_string()),
        region: None,
        timeout: Duration::from_secs(5),
    })?;

    let settings = PipelineSettings {
        source: "addresses.csv".to_string(),
        destination: GeocodeConfig::default().output_path_for("addresses.csv")?,
        mapping,
        overwrite: true,
        show_progress: false,
    };

    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let limiter = FixedIntervalGate::new(Duration::from_millis(5));
    Ok(EtlEngine::new(GeocodePipeline::new(
        storage, geocoder, limiter, settings,
    )))
}

#[tokio::test]
async fn test_end_to_end_with_mock_geocoder() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "name,street,city,state\n\
         MIT,77 Massachusetts Avenue,Cambridge,MA\n\
         Nowhere,1 Nowhere Road,Atlantis,XX\n",
    )?;

    let server = MockServer::start_async().await;
    let mit_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(GEOCODE_PATH)
                .query_param("address", "77 Massachusetts Avenue, Cambridge, MA")
                .query_param("key", "test-key");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(mit_response());
        })
        .await;
    let nowhere_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(GEOCODE_PATH)
                .query_param("address", "1 Nowhere Road, Atlantis, XX");
            then.status(200)
                .json_body(serde_json::json!({"status": "ZERO_RESULTS", "results": []}));
        })
        .await;

    let engine = build_engine(&server, &temp_dir, FieldMapping::default())?;
    let outcome = engine.run().await?;

    mit_mock.assert_async().await;
    nowhere_mock.assert_async().await;
    assert_eq!(outcome.output_path, "addresses_geocoded.csv");
    assert_eq!(outcome.summary.total, 2);
    assert_eq!(outcome.summary.geocodable, 1);
    assert_eq!(
        outcome.summary.to_string(),
        "Imported 2 records. 1 (50.00%) were geocodable."
    );

    let output = temp_dir.path().join("addresses_geocoded.csv");
    let mut reader = csv::Reader::from_path(&output)?;
    let headers = reader.headers()?.clone();
    assert_eq!(headers.len(), 4 + 13);
    assert_eq!(&headers[4], "geocodable");

    let records: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(records.len(), 2);

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
    assert_eq!(&records[0][column("name")], "MIT");
    assert_eq!(&records[0][column("geocodable")], "true");
    assert_eq!(&records[0][column("g_latitude")], "42.3601");
    assert_eq!(&records[0][column("g_longitude")], "-71.0942");
    assert_eq!(&records[0][column("g_postal_code")], "02139");
    assert_eq!(&records[0][column("g_county")], "");
    assert_eq!(
        &records[0][column("g_formatted_address")],
        "77 Massachusetts Ave, Cambridge, MA 02139, USA"
    );

    assert_eq!(&records[1][column("name")], "Nowhere");
    assert_eq!(&records[1][column("geocodable")], "false");
    assert!(records[1].iter().skip(column("g_latitude")).all(str::is_empty));

    Ok(())
}

#[tokio::test]
async fn test_provider_outage_does_not_stop_the_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "street,city,state\n\
         77 Massachusetts Avenue,Cambridge,MA\n\
         1 Main St,Springfield,IL\n\
         2 Main St,Springfield,IL\n",
    )?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(GEOCODE_PATH);
            then.status(503);
        })
        .await;

    let engine = build_engine(&server, &temp_dir, FieldMapping::default())?;
    let outcome = engine.run().await?;

    api_mock.assert_hits_async(3).await;
    assert_eq!(outcome.summary.total, 3);
    assert_eq!(outcome.summary.geocodable, 0);
    assert!(temp_dir.path().join("addresses_geocoded.csv").exists());

    Ok(())
}

#[tokio::test]
async fn test_missing_required_column_aborts_without_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "stp_address,cty_name,stp_state\n\
         77 Massachusetts Avenue,Cambridge,MA\n\
         1 Main St\n\
         2 Main St,Springfield,IL\n",
    )?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(GEOCODE_PATH);
            then.status(200).json_body(mit_response());
        })
        .await;

    let mapping = FieldMapping {
        street_key: "stp_address".to_string(),
        city_key: "cty_name".to_string(),
        state_key: "stp_state".to_string(),
        ..Default::default()
    };
    let engine = build_engine(&server, &temp_dir, mapping)?;
    let err = engine.run().await.unwrap_err();

    match err {
        GeocodeError::MissingField { row, column, .. } => {
            assert_eq!(row, 2);
            assert_eq!(column, "cty_name");
        }
        other => panic!("unexpected error: {other}"),
    }
    api_mock.assert_hits_async(1).await;
    assert!(!temp_dir.path().join("addresses_geocoded.csv").exists());

    Ok(())
}

#[tokio::test]
async fn test_existing_output_is_kept_when_overwrite_disabled() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("addresses.csv"),
        "street,city,state\n77 Massachusetts Avenue,Cambridge,MA\n",
    )?;
    std::fs::write(temp_dir.path().join("addresses_geocoded.csv"), "previous run")?;

    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(GEOCODE_PATH);
            then.status(200).json_body(mit_response());
        })
        .await;

    let geocoder = GoogleGeocoder::new(GeocoderSettings {
        endpoint: server.url(GEOCODE_PATH),
        ..Default::default()
    })?;
    let settings = PipelineSettings {
        source: "addresses.csv".to_string(),
        destination: "addresses_geocoded.csv".to_string(),
        mapping: FieldMapping::default(),
        overwrite: false,
        show_progress: false,
    };
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let engine = EtlEngine::new(GeocodePipeline::new(
        storage,
        geocoder,
        FixedIntervalGate::new(Duration::from_millis(5)),
        settings,
    ));

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, GeocodeError::OutputExists { .. }));
    api_mock.assert_hits_async(0).await;
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("addresses_geocoded.csv"))?,
        "previous run"
    );

    Ok(())
}
