use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn passage_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("passage");
    path
}

const SHORT_BOOK: &str = "Ron ate breakfast.\n\nHarry used his wand.";

fn long_book() -> String {
    let mut text = String::new();
    for _ in 0..150 {
        text.push_str("The castle corridors were quiet at night.\n\n");
    }
    text.push_str("Hagrid kept a dragon egg by the fire.\n\n");
    for _ in 0..10 {
        text.push_str("The castle corridors were quiet at night.\n\n");
    }
    text
}

fn setup_test_env(config_extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::write(root.join("short.txt"), SHORT_BOOK).unwrap();
    fs::write(root.join("long.txt"), long_book()).unwrap();

    let config_content = format!(
        r#"[chunking]
chunk_size = 20

[model]
api_key_env = "PASSAGE_TEST_MISSING_KEY"

[logging]
level = "warn"
{}
"#,
        config_extra
    );

    let config_path = root.join("passage.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_passage(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = passage_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .current_dir(config_path.parent().unwrap())
        .env_remove("RUST_LOG")
        .env_remove("PASSAGE_TEST_MISSING_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run passage binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_chunk_reports_stats_and_shows_chunk() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_passage(&config_path, &["chunk", "short.txt", "--show", "2"]);
    assert!(success, "chunk failed: {}", stderr);
    assert!(stdout.contains("total chunks:  2"), "stdout: {}", stdout);
    assert!(stdout.contains("--- chunk 2 of 2 ---"));
    assert!(stdout.contains("Harry used his wand."));
}

#[test]
fn test_chunk_size_flag_overrides_config() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _stderr, success) =
        run_passage(&config_path, &["chunk", "short.txt", "--chunk-size", "2000"]);
    assert!(success);
    assert!(stdout.contains("total chunks:  1"), "stdout: {}", stdout);
}

#[test]
fn test_chunk_show_out_of_range() {
    let (_tmp, config_path) = setup_test_env("");

    let (_stdout, stderr, success) = run_passage(&config_path, &["chunk", "short.txt", "--show", "9"]);
    assert!(!success);
    assert!(stderr.contains("--show must be between 1 and 2"), "stderr: {}", stderr);
}

#[test]
fn test_chunk_missing_book() {
    let (_tmp, config_path) = setup_test_env("");

    let (_stdout, stderr, success) = run_passage(&config_path, &["chunk", "nope.txt"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read book"), "stderr: {}", stderr);
}

#[test]
fn test_search_small_book_is_lexical() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) =
        run_passage(&config_path, &["search", "short.txt", "wand", "--json"]);
    assert!(success, "search failed: {}", stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["strategy"], "lexical");
    assert_eq!(json["total_chunks"], 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["chunk"], 2);
    assert_eq!(results[0]["text"], "Harry used his wand.");
}

#[test]
fn test_search_large_book_is_vector() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_passage(
        &config_path,
        &["search", "long.txt", "dragon egg", "--chunk-size", "200", "--json"],
    );
    assert!(success, "search failed: {}", stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["strategy"], "vector");
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["text"].as_str().unwrap().contains("dragon egg"));
    assert!(results[0]["score"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _stderr, success) = run_passage(&config_path, &["search", "short.txt", "zzz"]);
    assert!(success);
    assert!(stdout.contains("strategy=lexical"));
    assert!(stdout.contains("No results."));
}

#[test]
fn test_characters_needs_no_config() {
    let binary = passage_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg("/nonexistent/passage.toml")
        .arg("characters")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Hermione Granger"));
    assert!(stdout.contains("Sirius Black"));
}

#[test]
fn test_invalid_chunk_size_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("passage.toml");
    fs::write(&config_path, "[chunking]\nchunk_size = 0\n").unwrap();
    fs::write(tmp.path().join("short.txt"), SHORT_BOOK).unwrap();

    let (_stdout, stderr, success) = run_passage(&config_path, &["chunk", "short.txt"]);
    assert!(!success);
    assert!(stderr.contains("chunk_size"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_character_rejected() {
    let (_tmp, config_path) = setup_test_env("\n[chat]\ncharacter = \"Voldemort\"\n");

    let (_stdout, stderr, success) = run_passage(&config_path, &["chunk", "short.txt"]);
    assert!(!success);
    assert!(stderr.contains("Unknown chat.character"), "stderr: {}", stderr);
}

#[test]
fn test_ask_without_api_key_fails_before_network() {
    let (_tmp, config_path) = setup_test_env("");

    let (_stdout, stderr, success) = run_passage(
        &config_path,
        &["ask", "Who used the wand?", "--book", "short.txt"],
    );
    assert!(!success);
    assert!(
        stderr.contains("PASSAGE_TEST_MISSING_KEY environment variable not set"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_completions() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _stderr, success) = run_passage(&config_path, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("passage"));
}
