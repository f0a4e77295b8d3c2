//! Submit command - validate, deduplicate and store a transfer.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;
use uuid::Uuid;

use vouch_core::{PlainTextRecognizer, SubmitOutcome, TextRecognizer, TransferForm};

use super::{read_input, replace_policy, Context};

/// Arguments for the submit command.
#[derive(Args)]
pub struct SubmitArgs {
    /// Form submission as a JSON file (`-` reads stdin)
    #[arg(long, conflicts_with = "receipt", required_unless_present = "receipt")]
    form: Option<PathBuf>,

    /// Receipt transcript to parse and submit as-is
    #[arg(long)]
    receipt: Option<PathBuf>,

    /// Update the record with this id instead of creating one
    #[arg(long)]
    id: Option<Uuid>,

    /// Replace a colliding record instead of reporting it
    #[arg(long, conflicts_with = "no_replace")]
    replace: bool,

    /// Report collisions even when the config enables replacing
    #[arg(long)]
    no_replace: bool,
}

pub async fn run(args: SubmitArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;

    let mut form: TransferForm = if let Some(path) = &args.form {
        let bytes = read_input(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("Invalid form in {}: {}", path.display(), e))?
    } else if let Some(path) = &args.receipt {
        let parser = ctx.parser(&config)?;
        let ocr = PlainTextRecognizer.recognize(&read_input(path)?)?;
        parser.parse_ocr(&ocr).to_form()
    } else {
        anyhow::bail!("Either --form or --receipt is required");
    };

    if args.id.is_some() {
        form.id = args.id;
    }

    let replace = replace_policy(args.replace, args.no_replace, &config);
    let ledger = ctx.ledger(&config)?;

    match ledger.submit(&form, replace)? {
        SubmitOutcome::Success { id, replaced } => {
            info!("Stored transfer {}", id);
            let verb = if replaced { "Replaced" } else { "Stored" };
            println!("{} {} transfer {}", style("✓").green(), verb, id);
            Ok(())
        }
        SubmitOutcome::DuplicateFound(found) => {
            let existing = found.existing();
            println!(
                "{} Duplicate ({}) of transfer {}",
                style("⚠").yellow(),
                found.kind(),
                existing.id
            );
            println!(
                "  {} {} {} {} {}",
                existing.date, existing.time, existing.bank, existing.beneficiary, existing.amount
            );
            println!("Use --replace to overwrite it.");
            Ok(())
        }
        SubmitOutcome::ValidationError(e) => {
            anyhow::bail!("Invalid {}: {}", e.field(), e)
        }
    }
}
