use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn halilit_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("halilit");
    path
}

fn write_json(path: &Path, value: serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    write_json(
        &data_dir.join("index.json"),
        json!({
            "build_timestamp": "2025-01-20T10:00:00Z",
            "version": "3.7",
            "total_products": 3,
            "total_verified": 1,
            "brands": [
                { "id": "roland", "name": "Roland", "product_count": 2, "data_file": "roland.json" },
                { "id": "nord", "name": "Nord", "product_count": 1, "data_file": "nord.json" }
            ]
        }),
    );
    write_json(
        &data_dir.join("roland.json"),
        json!({
            "brand_identity": { "id": "roland", "name": "Roland", "website": "https://roland.com" },
            "products": [
                { "id": "r1", "name": "Juno-X", "category": "Synthesizers", "verified": true },
                { "id": "r2", "name": "TD-17", "category": "V-Drums" }
            ]
        }),
    );
    write_json(
        &data_dir.join("nord.json"),
        json!({
            "brand_identity": { "id": "nord", "name": "Nord" },
            "products": [{ "id": "n1", "name": "Piano 5", "category": "Digital Piano" }]
        }),
    );
    write_json(
        &data_dir.join("search_index.json"),
        json!([
            { "id": "r1", "label": "Juno-X", "brand": "roland", "category": "Synthesizers",
              "keywords": ["synth", "analog"] },
            { "id": "r2", "label": "TD-17", "brand": "roland", "category": "V-Drums" },
            { "id": "n1", "label": "Piano 5", "brand": "nord", "category": "Digital Piano" }
        ]),
    );

    let config_content = format!(
        r#"[data]
base = "{root}/data"

[search]
threshold = 0.4
default_limit = 10

[server]
bind = "127.0.0.1:7341"

[subjective]
path = "{root}/state/subjective.json"
"#,
        root = root.display()
    );
    let config_path = root.join("halilit.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_halilit(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = halilit_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run halilit binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_brands_lists_index() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_halilit(&config_path, &["brands"]);
    assert!(success, "brands failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("roland"));
    assert!(stdout.contains("Nord"));
}

#[test]
fn test_stats_reports_totals() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_halilit(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("brands:          2"));
    assert!(stdout.contains("version:         3.7"));
}

#[test]
fn test_brand_shows_consolidated_categories() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_halilit(&config_path, &["brand", "roland"]);
    assert!(success, "brand failed: {}", stderr);
    assert!(stdout.contains("Juno-X"));
    assert!(stdout.contains("keys/synthesizers"));
    assert!(stdout.contains("drums/electronic-drums"));
}

#[test]
fn test_unknown_brand_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_halilit(&config_path, &["brand", "acme"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_category_across_brands() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) = run_halilit(&config_path, &["category", "keys"]);
    assert!(success);
    assert!(stdout.contains("r1"));
    assert!(stdout.contains("n1"));
    assert!(!stdout.contains("TD-17"));
    assert!(stdout.contains("2 products in 'keys'"));

    let (stdout, _, success) =
        run_halilit(&config_path, &["category", "keys", "--brand", "nord"]);
    assert!(success);
    assert!(stdout.contains("Piano 5"));
    assert!(!stdout.contains("Juno-X"));
}

#[test]
fn test_search_finds_product() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_halilit(&config_path, &["search", "juno"]);
    assert!(success, "search failed: {}", stderr);
    assert!(stdout.starts_with("1. "));
    assert!(stdout.contains("Juno-X"));
}

#[test]
fn test_search_with_brand_filter() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, _, success) =
        run_halilit(&config_path, &["search", "piano", "--brand", "roland"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_galaxies_needs_no_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, _, success) = run_halilit(&missing, &["galaxies"]);
    assert!(success);
    assert!(stdout.contains("keys"));
    assert!(stdout.contains("synthesizers"));
}

#[test]
fn test_data_flag_without_config() {
    let (tmp, _) = setup_test_env();
    let data = tmp.path().join("data");
    let missing = tmp.path().join("nope.toml");
    let output = Command::new(halilit_binary())
        .arg("--config")
        .arg(&missing)
        .arg("--data")
        .arg(&data)
        .arg("brands")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("roland"));
}

#[test]
fn test_validate_passes_then_fails() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_halilit(&config_path, &["validate"]);
    assert!(success, "validate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("All 4 files valid."));

    write_json(
        &tmp.path().join("data/nord.json"),
        json!({ "brand_identity": { "name": "Nord" }, "products": [] }),
    );
    let (stdout, stderr, success) = run_halilit(&config_path, &["validate"]);
    assert!(!success);
    assert!(stdout.contains("FAIL  nord.json"));
    assert!(stdout.contains("OK    roland.json"));
    assert!(stderr.contains("1 of 4 files failed validation"));
}

#[test]
fn test_note_persists_subjective_fields() {
    let (tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_halilit(
        &config_path,
        &[
            "note", "nord", "n1", "--rating", "5", "--tag", "stage", "--notes", "Lovely action",
        ],
    );
    assert!(success, "note failed: {}", stderr);
    assert!(stdout.contains("rating: 5"));

    let stored = fs::read_to_string(tmp.path().join("state/subjective.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(value["nord/n1"]["rating"], 5);
    assert_eq!(value["nord/n1"]["tags"][0], "stage");

    // catalog files are never touched
    let nord = fs::read_to_string(tmp.path().join("data/nord.json")).unwrap();
    assert!(!nord.contains("Lovely"));
}

#[test]
fn test_no_rating_drops_rating_and_keeps_tags() {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_halilit(
        &config_path,
        &["note", "roland", "r1", "--rating", "4", "--tag", "studio"],
    );
    assert!(success, "note failed: {}", stderr);

    let (stdout, stderr, success) =
        run_halilit(&config_path, &["note", "roland", "r1", "--no-rating"]);
    assert!(success, "note --no-rating failed: {}", stderr);
    assert!(stdout.contains("rating: -"));
    assert!(stdout.contains("tags:   studio"));

    let stored = fs::read_to_string(tmp.path().join("state/subjective.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert!(value["roland/r1"]["rating"].is_null());
    assert_eq!(value["roland/r1"]["tags"][0], "studio");

    let (_, _, success) = run_halilit(
        &config_path,
        &["note", "roland", "r1", "--rating", "3", "--no-rating"],
    );
    assert!(!success);
}

#[test]
fn test_note_rejects_bad_rating_and_unknown_product() {
    let (_tmp, config_path) = setup_test_env();
    let (_, _, success) = run_halilit(&config_path, &["note", "nord", "n1", "--rating", "9"]);
    assert!(!success);

    let (_, stderr, success) = run_halilit(&config_path, &["note", "nord", "zz", "--tag", "x"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_halilit(&tmp.path().join("nope.toml"), &["brands"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
