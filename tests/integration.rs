use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// 2013-07-16T00:00:00Z
const T0: i64 = 1_373_932_800_000;
const MINUTE_MS: i64 = 60_000;

fn sample_history() -> String {
    // Newest first, as exports are ordered
    format!(
        r#"{{"locations":[
  {{"timestampMs":"{}","latitudeE7":407128000,"longitudeE7":-740060000,"accuracy":10,"speed":2,"altitude":15}},
  {{"timestampMs":"{}","latitudeE7":407130000,"longitudeE7":-740065000,"accuracy":12}},
  {{"timestampMs":"{}","latitudeE7":407135000,"longitudeE7":-740070000}},
  {{"timestampMs":"{}","latitudeE7":407140000,"longitudeE7":-740075000,"altitude":20}}
]}}"#,
        T0 + 40 * MINUTE_MS,
        T0 + 39 * MINUTE_MS,
        T0 + 10 * MINUTE_MS,
        T0 + 9 * MINUTE_MS,
    )
}

fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("history.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_json_example_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        r#"{"locations":[{"timestampMs":"1000000","latitudeE7":407128000,"longitudeE7":-740060000}]}"#,
    );
    let output = dir.path().join("out.json");

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .arg("-f")
        .arg("json")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let json = fs::read_to_string(&output).unwrap();
    assert!(json.contains("\"latitude\": 40.7128"), "{json}");
    assert!(json.contains("\"longitude\": -74.006"), "{json}");
    assert!(json.contains("\"timestampMs\": 1000000"), "{json}");
}

#[test]
fn test_default_format_is_kml_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input).assert().success();

    let kml = fs::read_to_string(dir.path().join("history.kml")).unwrap();
    assert_eq!(kml.matches("<Placemark>").count(), 4);
    assert!(kml.contains("<coordinates>-74.006,40.7128</coordinates>"));
    assert!(kml.contains("<Data name=\"altitude\">"));
}

#[test]
fn test_js_output_uses_variable() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-f", "js", "-v", "myHistory"])
        .assert()
        .success();

    let js = fs::read_to_string(dir.path().join("history.js")).unwrap();
    assert!(js.starts_with("window.myHistory = {"));
    assert!(js.ends_with("};"));
}

#[test]
fn test_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-f", "csv", "--utc"])
        .assert()
        .success();

    let csv = fs::read_to_string(dir.path().join("history.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Time,Location");
    assert_eq!(lines[1], "2013-07-16 00:40:00,40.7128 -74.006");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_gpx_waypoints_are_valid_gpx() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input).args(["-f", "gpx"]).assert().success();

    let output = fs::read(dir.path().join("history.gpx")).unwrap();
    let gpx_result: Result<gpx::Gpx, _> = gpx::read(output.as_slice());
    assert!(gpx_result.is_ok(), "Output should be valid GPX");

    let gpx = gpx_result.unwrap();
    assert_eq!(gpx.waypoints.len(), 4);
    assert_eq!(gpx.waypoints[0].elevation, Some(15.0));
    assert_eq!(
        gpx.waypoints[0].description.as_deref(),
        Some("2013-07-16 00:40:00 (Accuracy: 10, Speed: 2)")
    );
    for waypoint in &gpx.waypoints {
        assert!(waypoint.time.is_some(), "Each waypoint should have a time");
    }
}

#[test]
fn test_gpx_tracks_split_on_gap() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-f", "gpxtracks"])
        .assert()
        .success();

    let output = fs::read(dir.path().join("history.gpxtracks")).unwrap();
    let gpx: gpx::Gpx = gpx::read(output.as_slice()).unwrap();

    // 39 -> 10 minutes is a 29 minute gap
    assert_eq!(gpx.tracks.len(), 2, "Should have two tracks");
    for track in &gpx.tracks {
        assert_eq!(track.segments.len(), 1);
        assert_eq!(track.segments[0].points.len(), 2);
    }
}

#[test]
fn test_date_range_filters_records() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        r#"{"locations":[
  {"timestampMs":"1373932800000","latitudeE7":1,"longitudeE7":1},
  {"timestampMs":"1373760000000","latitudeE7":2,"longitudeE7":2},
  {"timestampMs":"1373587200000","latitudeE7":3,"longitudeE7":3}
]}"#,
    );

    // 2013-07-14T00:00Z ..= 2013-07-16T00:00Z keeps the first two
    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-f", "csv", "--utc", "-s", "2013/07/14", "-e", "2013/07/16"])
        .assert()
        .success();

    let csv = fs::read_to_string(dir.path().join("history.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("0.0000001 0.0000001"));
    assert!(csv.contains("0.0000002 0.0000002"));
    assert!(!csv.contains("0.0000003"));
}

#[test]
fn test_empty_locations_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, r#"{"locations":[]}"#);

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No data found"));

    assert!(!dir.path().join("history.kml").exists());
}

#[test]
fn test_same_input_and_output_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("different files"));

    assert_eq!(fs::read_to_string(&input).unwrap(), sample_history());
}

#[test]
fn test_invalid_json_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "{ not json");

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("decoding json"));

    assert!(!dir.path().join("history.kml").exists());
}

#[test]
fn test_malformed_record_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        r#"{"locations":[{"timestampMs":"1","latitudeE7":1}]}"#,
    );

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-f", "gpx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("longitudeE7"));

    assert!(!dir.path().join("history.gpx").exists());
}

#[test]
fn test_invalid_date_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input)
        .args(["-s", "2013/07/01", "-e", "July 31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid end date format"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error opening input file"));
}

#[test]
fn test_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, &sample_history());

    let mut cmd = cargo_bin_cmd!("lhconvert");
    cmd.arg(&input).args(["-f", "shp"]).assert().failure().code(2);
}
