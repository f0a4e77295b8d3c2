//! Delete command - remove a stored transfer.

use clap::Args;
use console::style;
use uuid::Uuid;

use super::Context;

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Transfer id
    id: Uuid,
}

pub async fn run(args: DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let ledger = ctx.ledger(&config)?;

    ledger.delete(args.id)?;

    println!("{} Deleted transfer {}", style("✓").green(), args.id);

    Ok(())
}
