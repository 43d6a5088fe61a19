use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "anypath")]
#[command(version)]
#[command(about = "Print a file from any supported URL, archives included", long_about = None)]
#[command(after_help = "Examples:\n  \
  anypath file:///etc/hostname                         print a local file\n  \
  anypath https://example.com/a.tar.gz docs/README     print a member of a remote tarball\n  \
  anypath --offset 512 --length 64 sftp://host/disk.img  print 64 bytes at offset 512")]
pub struct Cli {
    /// URL to read (file, http, https, ftp, ftps, sftp, smb, s3, hdfs, package)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Extra segments joined onto the URL path (archive members, for example)
    #[arg(value_name = "SEGMENTS")]
    pub segments: Vec<String>,

    /// Decode the content as UTF-8 before printing
    #[arg(short = 't', long)]
    pub text: bool,

    /// Skip this many bytes first
    #[arg(long, value_name = "N")]
    pub offset: Option<u64>,

    /// Print at most this many bytes
    #[arg(long, value_name = "N")]
    pub length: Option<usize>,

    /// Print the resolved path and exit without reading
    #[arg(short = 's', long)]
    pub show: bool,

    /// Config file (default: $XDG_CONFIG_HOME/anypath/config.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-vv for debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Errors only
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_and_segments() {
        let cli = Cli::parse_from([
            "anypath", "-vv", "--text", "--offset", "10", "--length", "5",
            "http://example.com/a.zip", "inner/file.txt",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.text);
        assert_eq!(cli.offset, Some(10));
        assert_eq!(cli.length, Some(5));
        assert_eq!(cli.url, "http://example.com/a.zip");
        assert_eq!(cli.segments, ["inner/file.txt"]);
        assert!(!cli.show);
    }
}
