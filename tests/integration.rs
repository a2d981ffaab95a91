use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    return Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
}

fn codepub(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_codepub"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    return output;
}

fn publish(name: &str, out: &Path, extra: &[&str]) -> Output {
    let root = fixture(name);
    let mut args = vec![
        "publish",
        root.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--pattern",
        "*.h",
        "--pattern",
        "*.cpp",
    ];
    args.extend_from_slice(extra);
    return codepub(&args);
}

fn read(path: PathBuf) -> String {
    return std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
}

#[test]
fn publish_writes_a_page_per_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");

    let output = publish("publisher", &out, &[]);
    assert!(
        output.status.success(),
        "publish failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    for page in ["Converter.cpp.html", "Converter.h.html", "Logger.h.html"] {
        assert!(out.join(page).is_file(), "{page} missing");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All 3 files converted"), "{stdout}");
}

#[test]
fn default_selection_skips_unsupported_files() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");
    let root = fixture("publisher");

    let output = codepub(&["publish", root.to_str().unwrap(), "--out", out.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert!(!out.join("README.md.html").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("All 3 files converted"), "{stdout}");
}

#[test]
fn pages_link_only_to_batch_members() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");
    publish("publisher", &out, &[]);

    let source_page = read(out.join("Converter.cpp.html"));
    assert!(source_page.contains("<a href=\"../pages/Converter.h.html\">Converter.h</a>"));
    assert!(!source_page.contains("Missing.h"));

    let header_page = read(out.join("Converter.h.html"));
    assert!(header_page.contains("<a href=\"../pages/Logger.h.html\">Logger.h</a>"));
    assert!(header_page.contains("#include &lt;string&gt;"));

    let logger_page = read(out.join("Logger.h.html"));
    assert!(!logger_page.contains("Dependencies:"));
}

#[test]
fn pages_carry_region_markers() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");
    publish("publisher", &out, &[]);

    let header_page = read(out.join("Converter.h.html"));
    assert!(header_page.contains("<div class=\"comments\">// Converts one source file into a page.</div>"));
    assert!(header_page.contains("class Converter {<div class=\"class\">"));
    assert!(header_page.contains("</div>};"));

    let source_page = read(out.join("Converter.cpp.html"));
    assert!(source_page.contains("<div class=\"comments\">/* Returns the page path for a source file."));
    assert!(source_page.contains("   The page sits next to the others. */</div>"));
    assert!(source_page.contains("std::string Converter::convert(const std::string& path) {<div class=\"function\">"));

    let logger_page = read(out.join("Logger.h.html"));
    assert!(logger_page.contains("void write(int level) {<div class=\"function\"> (void)level; </div>}"));
    for tag in ["comments", "class", "function"] {
        assert!(logger_page.contains(&format!("toggleVisibility('{tag}');")));
    }
}

#[test]
fn json_report_lists_every_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");

    let output = publish("publisher", &out, &["--format", "json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f["status"] == "converted"));
    assert!(report["output_dir"].as_str().unwrap().ends_with("pages"));
}

#[test]
fn broken_file_fails_alone_with_exit_one() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");

    let output = publish("broken", &out, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(out.join("good.cpp.html").is_file());
    assert!(!out.join("bad.cpp.html").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed:"), "{stdout}");
    assert!(stdout.contains("scope extraction failed"), "{stdout}");
}

#[test]
fn lenient_publishes_broken_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");

    let output = publish("broken", &out, &["--lenient"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    assert!(out.join("bad.cpp.html").is_file());
}

#[test]
fn unusable_output_directory_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");
    std::fs::write(&out, "in the way").unwrap();

    let output = publish("publisher", &out, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Output Directory"));
}

#[test]
fn invalid_regex_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");

    let output = publish("publisher", &out, &["--regex", "("]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Invalid Pattern"));
    assert!(!out.exists());
}

#[test]
fn deps_prints_resolved_edges() {
    let root = fixture("publisher");
    let output = codepub(&["deps", root.to_str().unwrap(), "--pattern", "*.h", "--pattern", "*.cpp"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let cpp = root.join("Converter.cpp");
    assert!(stdout.contains(&format!("-- {}", cpp.display())), "{stdout}");
    assert!(stdout.contains(&format!("   -> {}", root.join("Missing.h").display())), "{stdout}");
    assert!(stdout.contains(&format!("   -> {}", root.join("Logger.h").display())), "{stdout}");
}

#[test]
fn single_file_prints_its_page() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("pages");
    let source = fixture("publisher").join("Converter.cpp");

    let output = codepub(&["file", source.to_str().unwrap(), "--out", out.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let printed = String::from_utf8_lossy(&output.stdout);
    assert!(printed.trim().ends_with("Converter.cpp.html"));
    assert!(!read(out.join("Converter.cpp.html")).contains("Dependencies:"));
}
