use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use evidence_integrity::digest;
use evidence_store::{EvidenceStore, StoreOptions};
use serde::Serialize;
use tracing::debug;

use crate::cli::*;
use crate::settings;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        format,
        ..
    } = cli;
    let open = || open_store(config.as_deref());
    match command {
        Command::Store(args) => cmd_store(&open()?, args, &format).await,
        Command::Retrieve(args) => cmd_retrieve(&open()?, args).await,
        // Pure hash check; needs no backends.
        Command::Verify(args) => cmd_verify(args, &format),
        Command::Metadata(args) => cmd_metadata(&open()?, args, &format).await,
        Command::Exists(args) => cmd_exists(&open()?, args, &format).await,
        Command::Url(args) => cmd_url(&open()?, args, &format).await,
    }
}

fn open_store(config_path: Option<&Path>) -> anyhow::Result<EvidenceStore> {
    let config = settings::load(config_path)?;
    debug!(
        s3 = config.s3.is_some(),
        ipfs = config.ipfs.is_some(),
        "configuration loaded"
    );
    Ok(EvidenceStore::from_config(&config)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn require_source(args: &SourceArgs) -> anyhow::Result<()> {
    if args.s3_key.is_none() && args.ipfs_hash.is_none() {
        bail!("provide --s3-key, --ipfs-hash, or both");
    }
    Ok(())
}

async fn cmd_store(
    store: &EvidenceStore,
    args: StoreArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let stored = store
        .store(&data, StoreOptions { object_store_key: args.s3_key })
        .await?;

    match format {
        OutputFormat::Json => print_json(&stored)?,
        OutputFormat::Text => {
            println!(
                "{} Stored {} ({} bytes)",
                "✓".green().bold(),
                args.file.display(),
                stored.size
            );
            println!("  Hash: {}", stored.hash.as_str().cyan());
            println!("  Timestamp: {}", stored.timestamp);
            if let Some(key) = &stored.object_store_key {
                println!("  S3 key: {}", key.yellow());
            }
            if let Some(address) = &stored.content_address {
                println!("  IPFS: {}", address.yellow());
            }
            for failure in &stored.failures {
                println!("  {} {}: {}", "✗".red(), failure.backend, failure.error);
            }
        }
    }
    Ok(())
}

async fn cmd_retrieve(store: &EvidenceStore, args: RetrieveArgs) -> anyhow::Result<()> {
    require_source(&args.source)?;
    let found = store.retrieve(&args.source.selector()).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &found.data)
                .with_context(|| format!("cannot write {}", path.display()))?;
            // stdout stays free for piping; the summary goes to stderr.
            eprintln!(
                "{} Retrieved {} bytes from {} into {}",
                "✓".green().bold(),
                found.metadata.size,
                found.source,
                path.display()
            );
            eprintln!("  Hash: {}", found.metadata.hash.as_str().cyan());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&found.data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyReport {
    valid: bool,
    expected: String,
    computed: String,
}

fn cmd_verify(args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let computed = digest(&data);
    let valid = evidence_integrity::verify(&data, &args.hash);

    match format {
        OutputFormat::Json => print_json(&VerifyReport {
            valid,
            expected: args.hash.clone(),
            computed: computed.to_string(),
        })?,
        OutputFormat::Text if valid => {
            println!(
                "{} {} matches {}",
                "✓".green().bold(),
                args.file.display(),
                computed.as_str().cyan()
            );
        }
        OutputFormat::Text => {
            println!("{} {} does not match", "✗".red().bold(), args.file.display());
            println!("  Expected: {}", args.hash.yellow());
            println!("  Computed: {}", computed.as_str().cyan());
        }
    }

    if !valid {
        bail!("integrity check failed for {}", args.file.display());
    }
    Ok(())
}

async fn cmd_metadata(
    store: &EvidenceStore,
    args: SourceArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    require_source(&args)?;
    let metadata = store.get_metadata(&args.selector()).await?;

    match format {
        OutputFormat::Json => print_json(&metadata)?,
        OutputFormat::Text => {
            println!("Hash: {}", metadata.hash.as_str().cyan());
            println!("Size: {} bytes", metadata.size);
            println!("Timestamp: {}", metadata.timestamp);
            if let Some(key) = &metadata.object_store_key {
                println!("S3 key: {}", key.yellow());
            }
            if let Some(address) = &metadata.content_address {
                println!("IPFS: {}", address.yellow());
            }
            let status = if metadata.verified {
                "✓ verified".green()
            } else {
                "✗ unverified".red()
            };
            println!("Integrity: {}", status);
        }
    }
    Ok(())
}

async fn cmd_exists(
    store: &EvidenceStore,
    args: SourceArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    require_source(&args)?;
    let report = store.exists(&args.selector()).await;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            let mark = |present: bool| if present { "present".green() } else { "absent".red() };
            if let Some(key) = &args.s3_key {
                println!("S3 {}: {}", key.yellow(), mark(report.object_store));
            }
            if let Some(address) = &args.ipfs_hash {
                println!("IPFS {}: {}", address.yellow(), mark(report.content_address));
            }
        }
    }
    Ok(())
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct UrlReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    signed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway_url: Option<String>,
}

async fn cmd_url(
    store: &EvidenceStore,
    args: UrlArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    require_source(&args.source)?;
    let mut report = UrlReport::default();

    if let Some(key) = &args.source.s3_key {
        let ttl = args.expires.map(Duration::from_secs);
        report.signed_url = Some(store.signed_url(key, ttl).await?);
    }
    if let Some(address) = &args.source.ipfs_hash {
        report.gateway_url = Some(store.gateway_url(address, args.gateway.as_deref())?);
    }

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            if let Some(url) = &report.signed_url {
                println!("S3: {}", url.blue());
            }
            if let Some(url) = &report.gateway_url {
                println!("IPFS: {}", url.blue());
            }
        }
    }
    Ok(())
}
