use clap::{Args, Subcommand};
use vitrine_app::config::DatabaseConfig;

#[derive(Debug, Args)]
pub(crate) struct SequenceCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: SequenceSubcommand,
}

#[derive(Debug, Subcommand)]
enum SequenceSubcommand {
    /// Allocate the next order number
    Order,
    /// Allocate the next customer number
    Customer,
}

pub(crate) async fn run(command: SequenceCommand) -> Result<(), String> {
    let service = super::context(&command.database).await?.sequences;

    let allocated = match command.command {
        SequenceSubcommand::Order => service.next_order_no().await.map(|no| no.to_string()),
        SequenceSubcommand::Customer => service.next_customer_no().await.map(|no| no.to_string()),
    }
    .map_err(|error| format!("failed to allocate: {error}"))?;

    println!("{allocated}");

    Ok(())
}
