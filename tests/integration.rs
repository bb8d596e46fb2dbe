use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn askdoc_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("askdoc");
    path
}

/// Minimal valid PDF with one page showing `phrase`. Builds body then xref
/// with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Temp workspace with a config that needs no network: embeddings and the
/// generator are both disabled.
fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("manual.pdf"),
        minimal_pdf("The warranty covers two years of repairs"),
    )
    .unwrap();
    fs::write(files_dir.join("notes.txt"), "not a pdf, skipped by directory walk").unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/askdoc.sqlite"

[chunking]
chunk_size = 200
chunk_overlap = 40

[embedding]
provider = "disabled"

[llm]
provider = "disabled"
"#,
        root.display()
    );

    let config_path = config_dir.join("askdoc.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_askdoc(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = askdoc_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run askdoc binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_askdoc(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("askdoc.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_askdoc(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_askdoc(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_list_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    run_askdoc(&config_path, &["init"]);
    let (stdout, stderr, success) = run_askdoc(&config_path, &["list"]);
    assert!(success, "list failed: stderr={}", stderr);
    assert!(stdout.contains("No documents uploaded yet."));
}

#[test]
fn test_stats_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    run_askdoc(&config_path, &["init"]);
    let (stdout, stderr, success) = run_askdoc(&config_path, &["stats"]);
    assert!(success, "stats failed: stderr={}", stderr);
    assert!(stdout.contains("Backend:     sqlite"));
    assert!(stdout.contains("Chunks:      0"));
}

#[test]
fn test_ingest_dry_run_counts_chunks() {
    let (tmp, config_path) = setup_test_env();
    let files = tmp.path().join("files");

    let (stdout, stderr, success) =
        run_askdoc(&config_path, &["ingest", files.to_str().unwrap(), "--dry-run"]);
    assert!(success, "dry run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("manual.pdf: 1 chunks"));
    assert!(!stdout.contains("notes.txt"));
    assert!(stdout.contains("files: 1 / 1"));
}

#[test]
fn test_ingest_without_embeddings_fails_every_file() {
    let (tmp, config_path) = setup_test_env();
    let pdf = tmp.path().join("files").join("manual.pdf");

    run_askdoc(&config_path, &["init"]);
    let (stdout, stderr, success) = run_askdoc(&config_path, &["ingest", pdf.to_str().unwrap()]);
    assert!(!success, "ingest should fail when nothing is stored");
    assert!(stdout.contains("manual.pdf: FAILED"), "stdout={}", stdout);
    assert!(stderr.contains("No files were ingested"));

    let (stdout, _, _) = run_askdoc(&config_path, &["list"]);
    assert!(stdout.contains("No documents uploaded yet."));
}

#[test]
fn test_ingest_missing_file_is_reported() {
    let (tmp, config_path) = setup_test_env();
    let missing = tmp.path().join("files").join("nope.pdf");

    let (stdout, _, success) =
        run_askdoc(&config_path, &["ingest", missing.to_str().unwrap(), "--dry-run"]);
    assert!(!success);
    assert!(stdout.contains("nope.pdf: FAILED"));
}

#[test]
fn test_ask_falls_back_to_generator_error_message() {
    let (_tmp, config_path) = setup_test_env();

    run_askdoc(&config_path, &["init"]);
    let (stdout, stderr, success) =
        run_askdoc(&config_path, &["ask", "How long is the warranty?"]);
    assert!(success, "ask failed: stderr={}", stderr);
    assert!(stdout.starts_with("From disabled:"), "stdout={}", stdout);
    assert!(stdout.contains("Error generating response:"));
}

#[test]
fn test_ask_rejects_bad_threshold() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) =
        run_askdoc(&config_path, &["ask", "q", "--threshold", "2.5"]);
    assert!(!success);
    assert!(stderr.contains("threshold"));
}

#[test]
fn test_chat_reads_stdin_until_eof() {
    use std::io::Write;
    use std::process::Stdio;

    let (_tmp, config_path) = setup_test_env();
    run_askdoc(&config_path, &["init"]);

    let mut child = Command::new(askdoc_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"hello\n/history\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("From disabled:"));
    assert!(stdout.contains("[user] hello"));
    assert!(!stdout.contains("> "));
}

#[test]
fn test_search_blank_query() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_askdoc(&config_path, &["search", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("config").join("bad.toml");
    fs::write(
        &bad,
        "[db]\npath = \"x.sqlite\"\n[chunking]\nchunk_size = 100\nchunk_overlap = 100\n",
    )
    .unwrap();

    let (_, stderr, success) = run_askdoc(&bad, &["init"]);
    assert!(!success);
    assert!(stderr.contains("chunk_overlap"));
}

#[test]
fn test_missing_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_askdoc(&tmp.path().join("absent.toml"), &["list"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_photos_without_gps() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("blank.jpg");
    fs::write(&photo, b"not really a jpeg").unwrap();

    // No config file: photos runs on defaults.
    let (_, stderr, success) = run_askdoc(
        &tmp.path().join("absent.toml"),
        &["photos", photo.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("GPS"));
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_askdoc(&tmp.path().join("absent.toml"), &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("askdoc"));
}
