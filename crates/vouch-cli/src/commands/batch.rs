//! Batch command - parse many receipt transcripts, optionally submitting them.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use vouch_core::{ParseOutput, PlainTextRecognizer, ReceiptParser, SubmitOutcome, TextRecognizer};

use super::parse::{format_output, OutputFormat};
use super::{replace_policy, Context};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-receipt results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Submit every parsed receipt to the ledger
    #[arg(long)]
    submit: bool,

    /// Replace duplicates instead of skipping them (with --submit)
    #[arg(long, conflicts_with = "no_replace")]
    replace: bool,

    /// Skip duplicates even when the config enables replacing (with --submit)
    #[arg(long)]
    no_replace: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct BatchResult {
    path: PathBuf,
    parsed: Option<ParseOutput>,
    error: Option<String>,
}

#[derive(Default)]
struct SubmitTally {
    stored: usize,
    replaced: usize,
    duplicates: usize,
    rejected: usize,
}

pub async fn run(args: BatchArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = ctx.load_config()?;
    let parser = ctx.parser(&config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        match parse_file(&path, &parser) {
            Ok(parsed) => results.push(BatchResult {
                path,
                parsed: Some(parsed),
                error: None,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push(BatchResult {
                    path,
                    parsed: None,
                    error: Some(error_msg),
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        let extension = match args.format {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        };

        for result in &results {
            if let Some(parsed) = &result.parsed {
                let stem = result.path.file_stem().and_then(|s| s.to_str()).unwrap_or("receipt");
                let output_path = output_dir.join(format!("{}.{}", stem, extension));
                fs::write(&output_path, format_output(parsed, args.format, false)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    let tally = if args.submit {
        Some(submit_all(&results, ctx, &config, replace_policy(args.replace, args.no_replace, &config))?)
    } else {
        None
    };

    let failed: Vec<&BatchResult> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );

    if let Some(tally) = tally {
        println!(
            "  Stored: {}, replaced: {}, duplicates: {}, rejected: {}",
            tally.stored, tally.replaced, tally.duplicates, tally.rejected
        );
    }

    if !failed.is_empty() {
        println!("{} {} files failed:", style("✗").red(), failed.len());
        for result in failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn parse_file(path: &PathBuf, parser: &ReceiptParser) -> anyhow::Result<ParseOutput> {
    let bytes = fs::read(path)?;
    let ocr = PlainTextRecognizer.recognize(&bytes)?;
    if ocr.is_empty() {
        anyhow::bail!("No text found");
    }
    Ok(parser.parse_ocr(&ocr))
}

fn submit_all(
    results: &[BatchResult],
    ctx: &Context,
    config: &vouch_core::VouchConfig,
    replace: bool,
) -> anyhow::Result<SubmitTally> {
    let ledger = ctx.ledger(config)?;
    let mut tally = SubmitTally::default();

    for result in results {
        let Some(parsed) = &result.parsed else { continue };

        match ledger.submit(&parsed.to_form(), replace)? {
            SubmitOutcome::Success { replaced: true, .. } => tally.replaced += 1,
            SubmitOutcome::Success { .. } => tally.stored += 1,
            SubmitOutcome::DuplicateFound(found) => {
                debug!("{}: duplicate of {}", result.path.display(), found.existing().id);
                tally.duplicates += 1;
            }
            SubmitOutcome::ValidationError(e) => {
                warn!("{}: {}", result.path.display(), e);
                tally.rejected += 1;
            }
        }
    }

    Ok(tally)
}
