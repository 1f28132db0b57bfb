use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use evidence_store::SourceSelector;

#[derive(Parser)]
#[command(
    name = "evidence",
    about = "Store evidence redundantly in S3 and IPFS with integrity verification",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; environment variables are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file in every configured backend
    Store(StoreArgs),
    /// Retrieve evidence, falling back from S3 to IPFS
    Retrieve(RetrieveArgs),
    /// Check a file against an expected hash
    Verify(VerifyArgs),
    /// Retrieve evidence and report its metadata and verification status
    Metadata(SourceArgs),
    /// Check whether evidence exists in each backend
    Exists(SourceArgs),
    /// Print a signed S3 URL and/or an IPFS gateway URL
    Url(UrlArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    pub file: PathBuf,
    /// Object key to use instead of the hash-derived default
    #[arg(long)]
    pub s3_key: Option<String>,
}

#[derive(Args)]
pub struct SourceArgs {
    #[arg(long)]
    pub s3_key: Option<String>,
    #[arg(long)]
    pub ipfs_hash: Option<String>,
}

impl SourceArgs {
    pub fn selector(&self) -> SourceSelector {
        SourceSelector {
            object_store_key: self.s3_key.clone(),
            content_address: self.ipfs_hash.clone(),
        }
    }
}

#[derive(Args)]
pub struct RetrieveArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub file: PathBuf,
    #[arg(long)]
    pub hash: String,
}

#[derive(Args)]
pub struct UrlArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Signed URL lifetime in seconds
    #[arg(long)]
    pub expires: Option<u64>,
    /// Gateway base for the IPFS URL
    #[arg(long)]
    pub gateway: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_store() {
        let cli = Cli::try_parse_from(["evidence", "store", "report.pdf"]).unwrap();
        if let Command::Store(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("report.pdf"));
            assert!(args.s3_key.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_store_with_key() {
        let cli =
            Cli::try_parse_from(["evidence", "store", "a.bin", "--s3-key", "cases/1"]).unwrap();
        if let Command::Store(args) = cli.command {
            assert_eq!(args.s3_key, Some("cases/1".into()));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_retrieve_both_sources() {
        let cli = Cli::try_parse_from([
            "evidence", "retrieve", "--s3-key", "k", "--ipfs-hash", "bafy", "-o", "out.bin",
        ])
        .unwrap();
        if let Command::Retrieve(args) = cli.command {
            let selector = args.source.selector();
            assert_eq!(selector.object_store_key.as_deref(), Some("k"));
            assert_eq!(selector.content_address.as_deref(), Some("bafy"));
            assert_eq!(args.output, Some(PathBuf::from("out.bin")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verify_requires_hash() {
        assert!(Cli::try_parse_from(["evidence", "verify", "a.bin"]).is_err());
        let cli = Cli::try_parse_from(["evidence", "verify", "a.bin", "--hash", "0xabc"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.hash, "0xabc");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_metadata_and_exists() {
        let cli = Cli::try_parse_from(["evidence", "metadata", "--ipfs-hash", "bafy"]).unwrap();
        assert!(matches!(cli.command, Command::Metadata(_)));
        let cli = Cli::try_parse_from(["evidence", "exists", "--s3-key", "k"]).unwrap();
        assert!(matches!(cli.command, Command::Exists(_)));
    }

    #[test]
    fn parse_url() {
        let cli =
            Cli::try_parse_from(["evidence", "url", "--s3-key", "k", "--expires", "60"]).unwrap();
        if let Command::Url(args) = cli.command {
            assert_eq!(args.expires, Some(60));
            assert!(args.gateway.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "evidence", "exists", "--s3-key", "k", "--config", "e.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("e.toml")));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["evidence", "--format", "json", "exists"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["evidence", "-v", "exists"]).unwrap();
        assert!(cli.verbose);
    }
}
