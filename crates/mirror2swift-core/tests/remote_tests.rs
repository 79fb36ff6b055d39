use eyre::Result;
use httpmock::Method::{GET, HEAD, PUT};
use httpmock::MockServer;
use std::net::TcpListener;

use mirror2swift_core::config::Destination;
use mirror2swift_core::errors::TransferStage;
use mirror2swift_core::remote::container::LISTING_PAGE_LIMIT;
use mirror2swift_core::remote::{FixedClock, HttpClient, SwiftContainer};
use mirror2swift_core::transfer_engine::{TransferEngine, TransferOutcome};

const SIGNATURE_AT_1000: &str = "f33c4ec86cea095f10ec721d5ec66f1bdb008950";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn container(server: &MockServer, ttl: Option<u64>) -> Result<SwiftContainer> {
    let destination = Destination {
        key: "secret".to_string(),
        ttl,
        url: server.url("/v1/a/c/"),
    };
    Ok(SwiftContainer::new(HttpClient::new()?, &destination))
}

fn engine() -> Result<TransferEngine> {
    Ok(TransferEngine::new(HttpClient::new()?).with_clock(Box::new(FixedClock(1000))))
}

#[test]
fn lists_container_objects() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/a/c/")
            .query_param("format", "json");
        then.status(200)
            .body(r#"[{"name": "Packages/sample+.el7.i686.rpm", "bytes": 10}]"#);
    });

    let names = container(&server, None)?.list_objects("")?;
    assert_eq!(names, vec!["Packages/sample+.el7.i686.rpm".to_string()]);
    listing.assert();
    Ok(())
}

#[test]
fn lists_container_objects_under_prefix() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/a/c/")
            .query_param("format", "json")
            .query_param("prefix", "prefix");
        then.status(200).body(r#"[{"name": "prefix/a.rpm"}]"#);
    });

    let names = container(&server, None)?.list_objects("prefix")?;
    assert_eq!(names, vec!["prefix/a.rpm".to_string()]);
    listing.assert_hits(1);
    Ok(())
}

#[test]
fn failed_listing_is_an_error() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/a/c/");
        then.status(401);
    });

    assert!(container(&server, None)?.list_objects("").is_err());
    Ok(())
}

#[test]
fn uploads_with_signed_temp_url() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    let source = server.mock(|when, then| {
        when.method(GET).path("/mirror/o");
        then.status(200).body("body");
    });
    let upload = server.mock(|when, then| {
        when.method(PUT)
            .path("/v1/a/c/o")
            .query_param("temp_url_sig", SIGNATURE_AT_1000)
            .query_param("temp_url_expires", "1300")
            .body("body");
        then.status(201);
    });

    let container = container(&server, None)?;
    let outcome = engine()?.upload_missing(
        &server.url("/mirror/o"),
        &server.url("/v1/a/c/o"),
        &container,
        false,
    )?;

    assert_eq!(outcome, TransferOutcome::Uploaded { bytes: 4 });
    source.assert();
    upload.assert();
    Ok(())
}

#[test]
fn upload_sets_delete_after_when_ttl_is_configured() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mirror/o");
        then.status(200).body("body");
    });
    let upload = server.mock(|when, then| {
        when.method(PUT)
            .path("/v1/a/c/o")
            .header("x-delete-after", "3600");
        then.status(201);
    });

    let container = container(&server, Some(3600))?;
    engine()?.upload_missing(
        &server.url("/mirror/o"),
        &server.url("/v1/a/c/o"),
        &container,
        false,
    )?;
    upload.assert();
    Ok(())
}

#[test]
fn update_mode_skips_objects_of_equal_size() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(HEAD).path("/mirror/o");
        then.status(200).body("body");
    });
    server.mock(|when, then| {
        when.method(HEAD).path("/v1/a/c/o");
        then.status(200).body("body");
    });
    let fetch = server.mock(|when, then| {
        when.method(GET).path("/mirror/o");
        then.status(200).body("body");
    });

    let container = container(&server, None)?;
    let outcome = engine()?.upload_missing(
        &server.url("/mirror/o"),
        &server.url("/v1/a/c/o"),
        &container,
        true,
    )?;

    assert_eq!(outcome, TransferOutcome::AlreadyCached);
    fetch.assert_hits(0);
    Ok(())
}

#[test]
fn update_mode_uploads_when_object_is_missing() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let tmp = tempfile::tempdir()?;
    let local = tmp.path().join("o");
    std::fs::write(&local, b"body")?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(HEAD).path("/v1/a/c/o");
        then.status(404);
    });
    let upload = server.mock(|when, then| {
        when.method(PUT).path("/v1/a/c/o").body("body");
        then.status(201);
    });

    let container = container(&server, None)?;
    let outcome = engine()?.upload_missing(
        &local.to_string_lossy(),
        &server.url("/v1/a/c/o"),
        &container,
        true,
    )?;

    assert_eq!(outcome, TransferOutcome::Uploaded { bytes: 4 });
    upload.assert();
    Ok(())
}

#[test]
fn transfer_errors_carry_their_stage() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/mirror/gone");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/mirror/o");
        then.status(200).body("body");
    });
    server.mock(|when, then| {
        when.method(PUT).path("/v1/a/c/o");
        then.status(403);
    });

    let container = container(&server, None)?;
    let engine = engine()?;

    let fetch_err = engine
        .upload_missing(
            &server.url("/mirror/gone"),
            &server.url("/v1/a/c/gone"),
            &container,
            false,
        )
        .unwrap_err();
    assert_eq!(fetch_err.stage, TransferStage::Fetch);
    assert!(fetch_err.message.contains("404"), "{}", fetch_err.message);

    let upload_err = engine
        .upload_missing(
            &server.url("/mirror/o"),
            &server.url("/v1/a/c/o"),
            &container,
            false,
        )
        .unwrap_err();
    assert_eq!(upload_err.stage, TransferStage::Upload);
    assert!(upload_err.to_string().contains("put failed"));
    Ok(())
}

#[test]
fn update_mode_reports_missing_local_source_before_fetching() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let missing = tmp.path().join("gone.rpm");
    let destination = Destination {
        key: "secret".to_string(),
        ttl: None,
        url: "http://127.0.0.1:9/v1/a/c/".to_string(),
    };
    let container = SwiftContainer::new(HttpClient::new()?, &destination);

    let err = engine()?
        .upload_missing(
            &missing.to_string_lossy(),
            "http://127.0.0.1:9/v1/a/c/gone.rpm",
            &container,
            true,
        )
        .unwrap_err();
    assert_eq!(err.stage, TransferStage::Probe);
    Ok(())
}

#[test]
fn follows_marker_after_a_full_listing_page() -> Result<()> {
    if !can_bind_localhost() {
        return Ok(());
    }

    let first_page = (0..LISTING_PAGE_LIMIT)
        .map(|i| format!(r#"{{"name": "obj{i:05}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    let last_name = format!("obj{:05}", LISTING_PAGE_LIMIT - 1);

    let server = MockServer::start();
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/a/c/")
            .query_param("format", "json")
            .query_param("marker", last_name.as_str());
        then.status(200).body(r#"[{"name": "z"}]"#);
    });
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/a/c/")
            .query_param("format", "json");
        then.status(200).body(format!("[{first_page}]"));
    });

    let names = container(&server, None)?.list_objects("")?;
    assert_eq!(names.len(), LISTING_PAGE_LIMIT + 1);
    assert_eq!(names.first().map(String::as_str), Some("obj00000"));
    assert_eq!(names.last().map(String::as_str), Some("z"));
    first.assert_hits(1);
    second.assert_hits(1);
    Ok(())
}
