//! URL resolution through the scheme registry.

use std::fs;

use anypath::config::Settings;
use anypath::{Error, Resolver, Root};

fn resolver_rooted_at(dir: &std::path::Path) -> Resolver {
    let mut settings = Settings::default();
    settings.local.root = dir.to_path_buf();
    Resolver::with_settings(settings)
}

#[test]
fn file_url_under_configured_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), "[tool]").unwrap();

    let path = resolver_rooted_at(dir.path()).resolve("file:///readme.txt").unwrap();
    assert_eq!(path.read_bytes().unwrap(), b"[tool]");
}

#[test]
fn file_url_from_toml_settings() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("conf")).unwrap();
    fs::write(dir.path().join("conf/app.ini"), "x=1").unwrap();

    let toml = format!("[local]\nroot = {:?}\n", dir.path().display().to_string());
    let settings = Settings::from_toml_str(&toml).unwrap();
    let path = Resolver::with_settings(settings).resolve("file://localhost/conf/app.ini").unwrap();
    assert_eq!(path.read_text().unwrap(), "x=1");
}

#[test]
fn resolved_path_joins_like_any_other() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    fs::write(dir.path().join("a/b/c.txt"), "deep").unwrap();

    let base = resolver_rooted_at(dir.path()).resolve("file:///a").unwrap();
    assert_eq!((&base / "b" / "c.txt").read_text().unwrap(), "deep");
    assert_eq!(base.join("b/c.txt"), base / "b/c.txt");
}

#[test]
fn unknown_scheme() {
    let err = Resolver::default().resolve("gopher://example.com/menu").unwrap_err();
    assert!(matches!(err, Error::UnknownScheme { ref scheme } if scheme == "gopher"), "{err}");
}

#[test]
fn malformed_url() {
    let err = Resolver::default().resolve("not a url").unwrap_err();
    assert!(matches!(err, Error::MalformedUrl { .. }), "{err}");
}

#[test]
fn archive_suffix_in_url_path() {
    let path = Resolver::default()
        .resolve("https://example.com/dist/release.tar.gz/docs/README")
        .unwrap();
    let archive = path.root().as_archive().unwrap();
    assert_eq!(archive.format_name(), "tar");
    assert_eq!(path.segments(), ["docs", "README"]);
    assert!(matches!(archive.path().root(), Root::Host(_)));
}

#[cfg(not(feature = "sftp"))]
#[test]
fn sftp_without_feature() {
    let path = Resolver::default().resolve("sftp://user@example.com/etc/motd").unwrap();
    let err = path.read_bytes().unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { scheme: "sftp", .. }), "{err}");
}

#[cfg(not(feature = "smb"))]
#[test]
fn smb_without_feature() {
    let path = Resolver::default().resolve("smb://fileserver/share/report.txt").unwrap();
    let err = path.read_bytes().unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { scheme: "smb", .. }), "{err}");
}

#[cfg(not(feature = "s3"))]
#[test]
fn s3_without_feature() {
    let path = Resolver::default().resolve("s3://bucket/key.json").unwrap();
    let err = path.read_bytes().unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { scheme: "s3", .. }), "{err}");
}
