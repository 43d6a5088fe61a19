//! # anypath
//!
//! One path type for local files, web servers, FTP, SFTP, SMB, S3, HDFS and
//! installed package data, with tar and zip archives browsable as if they
//! were directories.
//!
//! A [`Path`] is a host plus a list of segments. Joining segments is pure;
//! nothing is fetched until [`Path::read_bytes`], [`Path::read_text`] or
//! [`Path::open`] is called. When a segment ends in an archive suffix
//! (`.tar`, `.tgz`, `.tar.gz`, `.zip`, `.dep`), the following segments name a
//! member inside that archive, and archives may nest.
//!
//! ## Features
//!
//! - `file`, `http`, `https`, `hdfs` (WebHDFS) and `package` are always built
//! - `ftp` (default), `ftps`, `sftp`, `smb` and `s3` are cargo features;
//!   without them the scheme still resolves but reading fails with
//!   [`Error::BackendUnavailable`]
//!
//! ## Example
//!
//! ```no_run
//! use anypath::{HostExt, LocalHost};
//!
//! fn main() -> anypath::Result<()> {
//!     // A member of a zip that sits inside a tarball on a web server.
//!     let notes = anypath::from_url("https://example.com/dist/release.tar.gz")?
//!         / "docs/bundle.zip"
//!         / "NOTES.txt";
//!     println!("{}", notes.read_text()?);
//!
//!     // The same thing locally.
//!     let local = LocalHost::current_dir().join("release.tar.gz/docs/bundle.zip/NOTES.txt");
//!     let mut file = local.open()?;
//!     let head = file.read_chunk(Some(64))?;
//!     println!("{} bytes", head.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod path;
pub mod registry;
pub mod stream;
pub mod url;

pub use crate::url::{Credentials, Url};
pub use archive::{Archive, ArchiveFormat, ExtensionRegistry, TarFormat, ZipFormat};
pub use config::Settings;
pub use error::{Error, Result};
pub use host::{
    FtpHost, HdfsHost, Host, HostExt, HttpHost, HttpScheme, LocalHost, PackageHost, S3Host,
    SftpHost, SmbHost,
};
pub use path::{Path, Root};
pub use registry::{HostFactory, Resolver, SchemeRegistry, from_url};
pub use stream::{ByteStream, Chunk, OpenFile, OpenMode, PathFile, StreamBuffer, TextFile};
