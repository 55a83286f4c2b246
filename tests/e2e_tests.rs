//! End-to-end tests for the xapiand-client binary
#![allow(deprecated)]

use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a settings file
fn create_settings(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("xapiand.xml");
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn binary() -> Command {
    let mut cmd = Command::cargo_bin("xapiand-client").unwrap();
    for var in ["XAPIAND_HOST", "XAPIAND_PORT", "XAPIAND_COMMIT", "XAPIAND_PREFIX"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_usage_without_arguments() {
    binary()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: xapiand-client"));
}

#[test]
fn test_unknown_action() {
    binary()
        .args(["merge", "books"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown action: merge"));
}

#[test]
fn test_get_requires_id() {
    binary()
        .args(["get", "books"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing <id>"));
}

#[test]
fn test_stats_against_server_from_env() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/books/_stats/")
        .match_query(Matcher::UrlEncoded("pretty".into(), "0".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"_doc_count": 3}"#)
        .create();

    binary()
        .env("XAPIAND_HOST", server.host_with_port())
        .args(["stats", "books"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"_doc_count\": 3"));

    mock.assert();
}

#[test]
fn test_search_with_settings_file() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/live/books/_search/")
        .match_query(Matcher::UrlEncoded("query".into(), "title:dune".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"_query\":{\"_total_count\":1,\"_hits\":[\n\n{\"_id\":\"1\",\"title\":\"Dune\"}\n\n]}}")
        .create();

    let temp_dir = TempDir::new().unwrap();
    let settings = create_settings(
        &temp_dir,
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<xapiand>
    <host>{}</host>
    <prefix>live</prefix>
</xapiand>"#,
            server.host_with_port()
        ),
    );

    binary()
        .arg("--config")
        .arg(&settings)
        .args(["search", "books", "title:dune"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Dune\""));

    mock.assert();
}

#[test]
fn test_missing_document_exits_with_error() {
    let mut server = Server::new();
    server
        .mock("GET", "/books/nope")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();

    binary()
        .env("XAPIAND_HOST", server.host_with_port())
        .args(["get", "books", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}
