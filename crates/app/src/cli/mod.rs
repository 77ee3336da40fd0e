use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use vitrine_app::{
    config::{DatabaseConfig, LoggingConfig},
    context::AppContext,
};

mod discount;
mod overrides;
mod product;
mod rates;
mod search;
mod sequence;

#[derive(Debug, Parser)]
#[command(name = "vitrine-app", about = "Vitrine CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Allocate order and customer numbers
    Sequence(sequence::SequenceCommand),
    /// Read resolved products
    Product(product::ProductCommand),
    /// Write or clear product overrides
    Override(overrides::OverrideCommand),
    /// Manage discount rules
    Discount(discount::DiscountCommand),
    /// Run a faceted search
    Search(search::SearchArgs),
    /// Show current exchange rates
    Rates(rates::RatesArgs),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Sequence(command) => sequence::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Override(command) => overrides::run(command).await,
            Commands::Discount(command) => discount::run(command).await,
            Commands::Search(args) => search::run(args).await,
            Commands::Rates(args) => rates::run(args).await,
        }
    }
}

/// Output shared by read commands.
#[derive(Debug, Args)]
pub(crate) struct OutputArgs {
    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

impl OutputArgs {
    /// Print `value` as pretty JSON, or the text built by `human` otherwise.
    pub(crate) fn print<T: serde::Serialize>(
        &self,
        value: &T,
        human: impl FnOnce() -> String,
    ) -> Result<(), String> {
        if self.json {
            let json = serde_json::to_string_pretty(value)
                .map_err(|error| format!("failed to encode JSON: {error}"))?;

            println!("{json}");
        } else {
            println!("{}", human());
        }

        Ok(())
    }
}

pub(crate) async fn context(config: &DatabaseConfig) -> Result<AppContext, String> {
    AppContext::from_config(config)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))
}

pub(crate) fn parse_at(at: Option<&str>) -> Result<Timestamp, String> {
    at.map_or_else(
        || Ok(Timestamp::now()),
        |value| {
            value
                .parse()
                .map_err(|error| format!("invalid timestamp {value}: {error}"))
        },
    )
}

/// Rounded table with right-aligned numeric columns.
pub(crate) fn render<I, R>(header: &[&str], rows: I, numeric: &[usize]) -> Table
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut builder = Builder::default();

    builder.push_record(header.iter().map(ToString::to_string));

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    for column in numeric {
        table.modify(Columns::new(*column..=*column), Alignment::right());
    }

    table.modify(Rows::first(), Alignment::center());

    table
}
