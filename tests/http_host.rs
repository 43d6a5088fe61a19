//! `HttpHost` against a local test server.

mod common;

use std::collections::HashMap;
use std::io::{Seek, SeekFrom};
use std::net::TcpListener;

use anypath::{Error, HostExt, HttpHost, Resolver};
use common::{build_tar, serve};

fn fixture_server() -> u16 {
    let mut files = HashMap::new();
    files.insert("/docs/readme.txt".to_string(), b"hello over http".to_vec());
    files.insert("/with%20space.txt".to_string(), b"encoded".to_vec());
    files.insert(
        "/dist/release.tar".to_string(),
        build_tar(&[("./bin/tool", &b"#!/bin/sh\necho hi\n"[..])]),
    );
    serve(files)
}

/// A port nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn reads_a_file() {
    let port = fixture_server();
    let host = HttpHost::http("127.0.0.1").with_port(port);
    let path = host.root_path() / "docs" / "readme.txt";
    assert_eq!(path.read_bytes().unwrap(), b"hello over http");
    assert_eq!(path.read_text().unwrap(), "hello over http");
}

#[test]
fn segments_are_percent_encoded() {
    let port = fixture_server();
    let host = HttpHost::http("127.0.0.1").with_port(port);
    assert_eq!(host.join("with space.txt").read_bytes().unwrap(), b"encoded");
}

#[test]
fn missing_file_is_not_accessible() {
    let port = fixture_server();
    let host = HttpHost::http("127.0.0.1").with_port(port);
    let err = host.join("docs/missing.txt").read_bytes().unwrap_err();
    assert!(matches!(err, Error::FileNotAccessible { .. }), "{err}");
    assert!(!err.is_connection_failure());
}

#[test]
fn refused_connection_is_a_host_error() {
    let host = HttpHost::http("127.0.0.1").with_port(closed_port());
    let err = host.join("anything").read_bytes().unwrap_err();
    assert!(matches!(err, Error::NoHostConnection { .. }), "{err}");
    assert!(err.is_connection_failure());
}

#[test]
fn unresolvable_hostname_is_a_host_error() {
    let host = HttpHost::http("nonexistent.invalid");
    let err = host.join("file.txt").read_bytes().unwrap_err();
    assert!(err.is_connection_failure(), "{err}");
}

#[test]
fn tar_member_over_http() {
    let port = fixture_server();
    let url = format!("http://127.0.0.1:{port}/dist/release.tar");
    let path = Resolver::default().resolve(&url).unwrap() / "bin/tool";
    assert_eq!(path.read_text().unwrap(), "#!/bin/sh\necho hi\n");
}

#[test]
fn seek_back_and_reread() {
    let port = fixture_server();
    let host = HttpHost::http("127.0.0.1").with_port(port);
    let mut file = host.join("docs/readme.txt").open().unwrap();

    let first = file.read_chunk(Some(5)).unwrap();
    assert_eq!(first, b"hello");
    assert_eq!(file.tell(), 5);

    file.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(file.read_chunk(Some(5)).unwrap(), first);
    assert_eq!(file.read_chunk(None).unwrap(), b" over http");
    assert!(file.read_chunk(Some(4)).unwrap().is_empty());
}

#[test]
fn one_host_serves_many_reads() {
    let port = fixture_server();
    let root = HttpHost::http("127.0.0.1").with_port(port).root_path();
    for _ in 0..3 {
        assert_eq!(root.join("docs/readme.txt").read_bytes().unwrap(), b"hello over http");
    }
}
