use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn halc() -> Command {
    let mut cmd = cargo_bin_cmd!("halc");
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("HALC_ACCEPT");
    cmd.env_remove("HALC_TIMEOUT_MS");
    cmd
}

async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

async fn blog_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Blog",
            "_links": {
                "self": {"href": "/"},
                "posts": {"href": "/posts"},
                "search": {"href": "/search{?q}", "templated": true}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 2})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_links": {
                "self": {"href": "/posts"},
                "item": [{"href": "/posts/1"}, {"href": "/posts/2"}, {"href": "/posts/3"}]
            }
        })))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn help_flag() {
    halc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Navigate HAL+JSON APIs"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("links"))
        .stdout(predicate::str::contains("items"));
}

#[test]
fn verbose_quiet_conflict() {
    halc()
        .args(["--verbose", "--quiet", "links", "http://localhost/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn malformed_var_is_usage_error() {
    halc()
        .args(["get", "http://localhost/", "--var", "novalue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid --var 'novalue'"));
}

#[test]
fn missing_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    halc()
        .arg("--config")
        .arg(&missing)
        .args(["links", "http://localhost/"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load"));
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn get_prints_property() {
    let server = blog_server().await;
    let url = format!("{}/", server.uri());
    blocking(move || {
        halc()
            .args(["get", &url, "--property", "title"])
            .assert()
            .success()
            .stdout("Blog\n");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn get_follows_templated_relation() {
    let server = blog_server().await;
    let url = format!("{}/", server.uri());
    blocking(move || {
        halc()
            .args(["get", &url, "--follow", "search", "--var", "q=rust"])
            .args(["--property", "hits"])
            .assert()
            .success()
            .stdout("2\n");
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn get_prints_document() {
    let server = blog_server().await;
    let url = format!("{}/", server.uri());
    let output = blocking(move || halc().args(["get", &url]).output().unwrap()).await;
    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["title"], json!("Blog"));
    // hrefs are printed as the server wrote them
    assert_eq!(printed["_links"]["posts"]["href"], json!("/posts"));
    assert_eq!(printed["_links"]["search"]["templated"], json!(true));
}

#[tokio::test(flavor = "multi_thread")]
async fn links_lists_relations() {
    let server = blog_server().await;
    let url = format!("{}/", server.uri());
    blocking(move || {
        halc()
            .args(["links", &url])
            .assert()
            .success()
            .stdout(predicate::str::contains("posts"))
            .stdout(predicate::str::contains("search"))
            .stdout(predicate::str::contains("true"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn items_respects_limit() {
    let server = blog_server().await;
    let base = server.uri();
    let url = format!("{base}/posts");
    let output = blocking(move || {
        halc()
            .args(["items", &url, "--limit", "2"])
            .output()
            .unwrap()
    })
    .await;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, format!("{base}/posts/1\n{base}/posts/2\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_exits_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "[retry]\nmax_tries = 1").unwrap();
    let config_path = config.path().to_path_buf();
    let url = format!("{}/missing", server.uri());
    blocking(move || {
        halc()
            .arg("--config")
            .arg(&config_path)
            .args(["get", &url])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("error:"))
            .stderr(predicate::str::contains("404"));
    })
    .await;
    drop(config);
}
