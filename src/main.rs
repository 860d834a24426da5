//! SGA CLI - Command-line tool for Relic SGA archives.
//!
//! This is the main entry point for the `sga` command-line application.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use sga::prelude::*;

/// sga - inspect, extract and verify Relic SGA archives
#[derive(Parser)]
#[command(name = "sga")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log decoding details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the archive header and tree summary
    Info {
        /// Path to the SGA file
        #[arg(env = "SGA_ARCHIVE")]
        archive: PathBuf,
    },

    /// List files in an archive
    List {
        /// Path to the SGA file
        #[arg(env = "SGA_ARCHIVE")]
        archive: PathBuf,

        /// Filter pattern (glob-style, matched against `alias:path`)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show sizes, storage type and modification time
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract files from an archive
    Extract {
        /// Path to the SGA file
        #[arg(env = "SGA_ARCHIVE")]
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, env = "SGA_OUTPUT")]
        output: PathBuf,

        /// Filter pattern (glob-style, matched against `alias:path`)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Validate checksums and decompress every file
    Verify {
        /// Path to the SGA file
        #[arg(env = "SGA_ARCHIVE")]
        archive: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Info { archive } => cmd_info(&archive)?,
        Commands::List {
            archive,
            filter,
            detailed,
        } => cmd_list(&archive, filter.as_deref(), detailed)?,
        Commands::Extract {
            archive,
            output,
            filter,
        } => cmd_extract(&archive, &output, filter.as_deref())?,
        Commands::Verify { archive } => cmd_verify(&archive)?,
    }

    Ok(())
}

fn open(path: &Path) -> Result<Archive<impl Read + Seek>> {
    Archive::open(path).with_context(|| format!("Failed to open SGA archive {}", path.display()))
}

fn cmd_info(path: &Path) -> Result<()> {
    let start = Instant::now();
    let archive = open(path)?;
    let header = archive.header();

    println!("Archive:  {}", archive.name());
    println!("Version:  {}", archive.version());
    println!("ToC:      {} bytes at {}", header.toc_size, header.toc_offset);
    println!("Data:     starts at {}", header.data_offset);
    if let Some(size) = header.data_size {
        println!("          {size} bytes");
    }
    println!(
        "Checksums: {}",
        if header.checksums.is_some() { "MD5 (file + header)" } else { "none" }
    );
    for drive in archive.drives() {
        println!(
            "Drive {}: {} ({} folders, {} files at root)",
            drive.alias(),
            drive.name(),
            drive.folders().len(),
            drive.files().len()
        );
    }
    println!("Files:    {} (decoded in {:?})", archive.file_count(), start.elapsed());

    Ok(())
}

fn cmd_list(path: &Path, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = open(path)?;

    let mut count = 0;
    for (name, file) in archive.walk() {
        if let Some(pattern) = filter {
            if !glob_match(pattern, &name) {
                continue;
            }
        }

        if detailed {
            println!(
                "{:>12} {:>12} {:<15} {:>10} {}",
                file.stored_size(),
                file.decompressed_size(),
                format!("{:?}", file.storage_type()),
                file.modified_raw(),
                name
            );
        } else {
            println!("{name}");
        }
        count += 1;
    }

    println!("\nTotal: {count} files");

    Ok(())
}

fn cmd_extract(path: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    println!("Opening SGA archive: {}", path.display());

    let start = Instant::now();
    let archive = open(path)?;

    println!("Loaded {} files in {:?}", archive.file_count(), start.elapsed());

    let selected: Vec<_> = archive
        .walk()
        .filter(|(name, _)| filter.map_or(true, |pattern| glob_match(pattern, name)))
        .collect();

    println!("Extracting {} files...", selected.len());

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut errors = 0;
    for (name, file) in &selected {
        let Some(relative) = output_path(name) else {
            warn!(path = %name, "refusing to extract path outside the output directory");
            errors += 1;
            pb.inc(1);
            continue;
        };
        let target = output.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        match file.data(&archive) {
            Ok(data) => fs::write(&target, &data)
                .with_context(|| format!("Failed to write {}", target.display()))?,
            Err(e) => {
                pb.suspend(|| eprintln!("Error extracting {name}: {e}"));
                errors += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!(
        "Extraction completed in {:?} ({} errors)",
        start.elapsed(),
        errors
    );

    Ok(())
}

fn cmd_verify(path: &Path) -> Result<()> {
    let archive = open(path)?;

    match archive.verify_checksums() {
        Ok(()) => println!("Checksums: OK"),
        Err(sga::Error::ChecksumsUnsupported(version)) => {
            println!("Checksums: not stored by {version}")
        }
        Err(e) => return Err(e).context("Checksum validation failed"),
    }

    let mut failures = 0;
    for (name, file) in archive.walk() {
        if let Err(e) = file.data(&archive) {
            eprintln!("FAILED {name}: {e}");
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} files failed to decode", archive.file_count());
    }
    println!("Files: {} OK", archive.file_count());

    Ok(())
}

/// Map `alias:folder/file` to `alias/folder/file`, rejecting anything that
/// would escape the output directory.
fn output_path(name: &str) -> Option<PathBuf> {
    let relative: PathBuf = name
        .replacen(':', "/", 1)
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect();
    let mut components = relative.components().peekable();
    let valid = components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)));
    valid.then_some(relative)
}

/// Simple glob matching for filtering.
///
/// Case-insensitive. `*` matches any run of characters; a pattern without
/// `*` matches as a substring.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();

    if !pattern.contains('*') {
        return name.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match name[pos..].find(part) {
            // No leading `*` anchors the first part at the start.
            Some(found) if i == 0 && found != 0 => return false,
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    parts.last().map_or(true, |p| p.is_empty()) || name.ends_with(parts[parts.len() - 1])
}
