//! Parse command - extract fields from a single receipt transcript.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use vouch_core::models::receipt::{ParseOutput, ParsedField};
use vouch_core::{PlainTextRecognizer, TextRecognizer};

use super::{read_input, Context};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Transcript file (`-` reads stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,

    /// Print the pre-filled form submission instead of the parse result
    #[arg(long)]
    form: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = ctx.load_config()?;
    let parser = ctx.parser(&config)?;

    info!("Parsing receipt: {}", args.input.display());

    let bytes = read_input(&args.input)?;
    let ocr = PlainTextRecognizer.recognize(&bytes)?;
    if ocr.is_empty() {
        anyhow::bail!("No text found in {}", args.input.display());
    }

    let parsed = parser.parse_ocr(&ocr);

    let output = if args.form {
        serde_json::to_string_pretty(&parsed.to_form())?
    } else {
        format_output(&parsed, args.format, args.show_confidence)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    let missing = parsed.missing_fields();
    if !missing.is_empty() {
        eprintln!(
            "{} Missing fields: {}",
            style("⚠").yellow(),
            missing.join(", ")
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_output(parsed: &ParseOutput, format: OutputFormat, show_confidence: bool) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(parsed)?),
        OutputFormat::Text => Ok(format_text(parsed, show_confidence)),
    }
}

fn format_text(parsed: &ParseOutput, show_confidence: bool) -> String {
    let rows: [(&str, &ParsedField<String>); 7] = [
        ("Bank", &parsed.bank),
        ("Date", &parsed.date),
        ("Time", &parsed.time),
        ("Operation", &parsed.operation_number),
        ("Beneficiary", &parsed.beneficiary),
        ("Destination", &parsed.destination_account_suffix),
        ("Amount", &parsed.amount),
    ];

    let mut output = String::new();
    for (label, field) in rows {
        let value = field.value.as_deref().unwrap_or("-");
        if show_confidence {
            output.push_str(&format!("{:<12} {:<28} ({}%)\n", label, value, field.confidence));
        } else {
            output.push_str(&format!("{:<12} {}\n", label, value));
        }
    }

    if let Some(origin) = parsed.origin_account_suffix() {
        output.push_str(&format!("{:<12} {}", "Origin", origin));
        if let Some(holder) = &parsed.origin_holder_name {
            output.push_str(&format!(" ({})", holder));
        }
        output.push('\n');
    }

    output
}
