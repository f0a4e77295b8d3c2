//! List command - show stored transfers.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use clap::Args;
use console::style;
use rust_decimal::Decimal;
use uuid::Uuid;

use vouch_core::{ExportFilter, TransferRecord};

use super::parse::OutputFormat;
use super::Context;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive filter over beneficiary, bank, amount and operation number
    #[arg(short, long)]
    search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only show transfers not yet exported
    #[arg(long)]
    pending: bool,

    /// Earliest transfer date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Latest transfer date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Flag the listed transfers as exported
    #[arg(long)]
    mark_exported: bool,
}

pub async fn run(args: ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let ledger = ctx.ledger(&config)?;

    let filter = ExportFilter {
        from: args.from,
        to: args.to,
        pending_only: args.pending,
    };

    let records = match args.search.as_deref() {
        Some(query) if !query.trim().is_empty() => {
            let mut found = ledger.search(query)?;
            found.retain(|r| filter.matches(r));
            found
        }
        _ => ledger.select_for_export(&filter)?,
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => print_table(&records),
    }

    if args.mark_exported && !records.is_empty() {
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let marked = ledger.mark_exported(&ids, Utc::now())?;
        eprintln!("{} Marked {} transfers as exported", style("✓").green(), marked);
    }

    Ok(())
}

fn print_table(records: &[TransferRecord]) {
    if records.is_empty() {
        println!("{} No transfers stored.", style("ℹ").blue());
        return;
    }

    for record in records {
        println!(
            "{}  {} {}  {:<12} {:<14} {:<28} ****{}  {}",
            record.id,
            record.date,
            record.time,
            record.bank,
            record.operation_number.as_deref().unwrap_or("-"),
            record.beneficiary,
            record.destination_account_suffix,
            record.amount
        );
    }

    println!();
    println!("{} {} transfers", style("✓").green(), records.len());
    for (currency, total) in totals_by_currency(records) {
        println!("  {} {:.2}", currency, total);
    }
}

fn totals_by_currency(records: &[TransferRecord]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for amount in records.iter().filter_map(TransferRecord::parsed_amount) {
        *totals.entry(amount.currency).or_insert(Decimal::ZERO) += amount.value;
    }
    totals
}
