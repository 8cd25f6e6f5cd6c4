//! End-to-end CLI tests for the harvester binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;
use support::socket_guard::start_mock_server_or_skip;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Binary with an isolated config home and no inherited log filter.
fn harvester_cmd(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write_harvester_config(config_home: &TempDir, contents: &str) {
    let config_dir = config_home.path().join("harvester");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_binary_help_lists_flags() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--creator"))
        .stdout(predicate::str::contains("--pages"))
        .stdout(predicate::str::contains("--cookies"))
        .stdout(predicate::str::contains("fanbox"));
}

#[test]
fn test_binary_version_flag() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvester"));
}

#[test]
fn test_binary_unknown_platform_exits_two() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .arg("pixiv")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_binary_invalid_page_range_exits_two() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .args(["fanbox", "--creator", "alice", "--pages", "0-3"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid page range '0-3'"));
}

#[test]
fn test_binary_more_pages_than_creators_exits_two() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .args(["fanbox", "--creator", "alice", "--pages", "1", "--pages", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("2 page range(s) supplied for 1 creator(s)"));
}

#[test]
fn test_binary_invalid_creator_exits_two() {
    let home = TempDir::new().unwrap();
    harvester_cmd(&home)
        .args(["kemono", "--creator", "https://example.com/user/1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid kemono creator"));
}

#[test]
fn test_binary_session_and_cookies_together_exits_two() {
    let home = TempDir::new().unwrap();
    let cookies = home.path().join("cookies.txt");
    std::fs::write(
        &cookies,
        ".fanbox.cc\tTRUE\t/\tTRUE\t0\tFANBOXSESSID\tabc\n",
    )
    .unwrap();

    harvester_cmd(&home)
        .args(["fanbox", "--creator", "alice", "--session", "abc", "--cookies"])
        .arg(&cookies)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("both --session and --cookies"));
}

#[test]
fn test_binary_cookie_file_without_session_cookie_exits_two() {
    let home = TempDir::new().unwrap();
    let cookies = home.path().join("cookies.txt");
    std::fs::write(&cookies, ".example.com\tTRUE\t/\tFALSE\t0\tsid\tabc\n").unwrap();

    harvester_cmd(&home)
        .args(["fanbox", "--creator", "alice", "--cookies"])
        .arg(&cookies)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("FANBOXSESSID"));
}

#[test]
fn test_binary_invalid_config_file_exits_two() {
    let home = TempDir::new().unwrap();
    write_harvester_config(&home, "read_timeout_secs = 0\n");

    harvester_cmd(&home)
        .arg("fanbox")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_binary_empty_request_prints_empty_report() {
    let home = TempDir::new().unwrap();
    let output = harvester_cmd(&home).args(["kemono", "-q"]).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["platform"], "kemono");
    assert_eq!(report["summary"]["direct"], 0);
    assert_eq!(report["errors"], json!([]));
}

#[tokio::test]
async fn test_binary_kemono_run_prints_targets_and_exits_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/fanbox/user/55/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "post_count": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fanbox/user/55/posts"))
        .and(query_param("o", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "8" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fanbox/user/55/post/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": "8",
                "content": "https://gigafile.nu/abc-123",
                "attachments": [{ "path": "/aa/bb/eight.zip" }]
            }
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = harvester_cmd(&home)
        .args([
            "kemono",
            "--creator",
            "https://kemono.su/fanbox/user/55",
            "--base-url",
            &server.uri(),
            "-q",
        ])
        .output()
        .unwrap();

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        report["direct_targets"][0]["url"],
        format!("{}/data/aa/bb/eight.zip", server.uri())
    );
    assert_eq!(report["direct_targets"][0]["origin_post"]["post_id"], "8");
    assert_eq!(
        report["external_by_host"]["giga_file"][0],
        "https://gigafile.nu/abc-123"
    );
    assert_eq!(report["summary"]["errors"], 0);
}

#[tokio::test]
async fn test_binary_partial_failure_exits_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/post.info"))
        .and(query_param("postId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "body": {
                "title": "ok",
                "body": { "files": [{ "url": "https://downloads.fanbox.cc/files/1.zip" }] }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/post.info"))
        .and(query_param("postId", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let output = harvester_cmd(&home)
        .args([
            "fanbox",
            "--post",
            "https://alice.fanbox.cc/posts/1",
            "--post",
            "https://www.fanbox.cc/@alice/posts/2",
            "--base-url",
            &server.uri(),
            "-q",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "partial failure must yield exit code 1");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["direct"], 1);
    assert_eq!(report["errors"][0]["subject"], "fanbox/alice/2");
    assert_eq!(report["errors"][0]["category"], "response");
}
