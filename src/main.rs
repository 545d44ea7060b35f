//! Main entry point for the memzip CLI application.
//!
//! Local archives are read into memory and parsed in place; HTTP URLs are
//! read lazily with Range requests.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use memzip::{ArchiveReader, Cli, HttpRangeReader, ZipEntry, crc32};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate reader
/// based on whether the input is a local file or HTTP URL.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = cli.reader_options();

    if cli.is_http_url() {
        // Remote archive via HTTP Range requests
        let source = Arc::new(HttpRangeReader::new(cli.file.clone()).await?);
        let transferred_before = source.transferred_bytes();
        let archive = memzip::open_ranged(source.clone(), options).await?;

        process_zip(&archive, &cli).await?;

        if !cli.is_quiet() {
            let transferred = source.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let bytes = tokio::fs::read(&cli.file).await?;
        let archive = memzip::open(&bytes, options).await?;
        process_zip(&archive, &cli).await?;
    }

    Ok(())
}

/// Process a ZIP archive based on CLI options.
///
/// - List mode (`-l` or `-v`): display archive contents
/// - Test mode (`-t`): check every file against its stored CRC32
/// - Extract mode: extract files matching the specified filters
async fn process_zip<A: ArchiveReader>(archive: &A, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        list_files(archive, cli.verbose);
        return Ok(());
    }

    // Directories are created on demand while extracting files
    let selected: Vec<&ZipEntry<'_>> = archive
        .list_files()
        .into_iter()
        .filter(|entry| is_selected(entry, cli))
        .collect();

    if cli.test {
        return test_files(archive, &selected, cli).await;
    }

    let multiple_files = cli.pipe && selected.len() > 1;
    for entry in selected {
        extract_file(archive, entry, cli, multiple_files).await?;
    }

    Ok(())
}

/// Apply the positional file filters and `-x` exclusions.
fn is_selected(entry: &ZipEntry<'_>, cli: &Cli) -> bool {
    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &entry.file_name)
            } else {
                // No wildcards: exact match on filename or full path
                let basename = Path::new(&entry.file_name)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                entry.file_name == *f || basename == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli.exclude
        .iter()
        .any(|x| entry.file_name.contains(x) || glob_match(x, &entry.file_name))
}

/// List entries in the archive.
///
/// `-l` prints one name per line, `-v` a table with sizes, ratios and dates.
fn list_files<A: ArchiveReader>(archive: &A, verbose: bool) {
    let entries = archive.index().entries();

    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in entries {
        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            entry.uncompressed_size(),
            entry.compressed_size(),
            ratio(entry.compressed_size(), entry.uncompressed_size()),
            year,
            month,
            day,
            hour,
            minute,
            entry.crc32(),
            entry.file_name
        );

        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size();
            total_compressed += entry.compressed_size();
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files ({})",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count,
            archive.index().encoding().name()
        );
    }
}

/// Compression ratio as percentage saved
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        format!("{:>4}%", 0)
    }
}

/// Check extracted content against the CRC32 stored in the central directory.
async fn test_files<A: ArchiveReader>(
    archive: &A,
    entries: &[&ZipEntry<'_>],
    cli: &Cli,
) -> Result<()> {
    let mut failures = 0usize;

    for entry in entries {
        let status = match archive.extract_as_bytes(&entry.file_name).await {
            Ok(data) if crc32(&data, None) == entry.crc32() => "OK",
            Ok(_) => "bad CRC",
            Err(e) => {
                warn!("Failed to extract {}: {}", entry.file_name, e);
                "error"
            }
        };
        if status != "OK" {
            failures += 1;
        }
        if !cli.is_quiet() || status != "OK" {
            println!("    testing: {:<40}  {}", entry.file_name, status);
        }
    }

    if failures > 0 {
        bail!("{} of {} files failed the test", failures, entries.len());
    }
    if !cli.is_very_quiet() {
        println!("No errors detected in compressed data of {}.", cli.file);
    }

    Ok(())
}

/// Extract a single file from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
async fn extract_file<A: ArchiveReader>(
    archive: &A,
    entry: &ZipEntry<'_>,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        let data = archive.extract_as_bytes(&entry.file_name).await?;
        let mut stdout = tokio::io::stdout();
        if show_filename {
            stdout
                .write_all(format!("--- {} ---\n", entry.file_name).as_bytes())
                .await?;
        }
        stdout.write_all(&data).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let Some(output_path) = output_path(entry, cli) else {
        warn!("Skipping {}: path escapes the output directory", entry.file_name);
        return Ok(());
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.file_name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.file_name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    let data = archive.extract_as_bytes(&entry.file_name).await?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(&output_path, &data).await?;

    Ok(())
}

/// Where an entry lands on disk, or `None` for absolute or `..` paths.
fn output_path(entry: &ZipEntry<'_>, cli: &Cli) -> Option<PathBuf> {
    let name = Path::new(&entry.file_name);
    let relative = if cli.junk_paths {
        PathBuf::from(name.file_name()?)
    } else {
        if name
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        name.to_path_buf()
    };

    Some(match &cli.extract_dir {
        Some(dir) => PathBuf::from(dir).join(relative),
        None => relative,
    })
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// ```ignore
/// assert!(glob_match("*.txt", "readme.txt"));
/// assert!(glob_match("file?.dat", "file1.dat"));
/// assert!(!glob_match("*.txt", "readme.md"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one more and stays
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
