use clap::{Args, Subcommand};
use vitrine::{catalog::OverrideFields, products::ProductId};
use vitrine_app::{config::DatabaseConfig, domain::catalog::models::OverrideUpdate};

#[derive(Debug, Args)]
pub(crate) struct OverrideCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: OverrideSubcommand,
}

#[derive(Debug, Subcommand)]
enum OverrideSubcommand {
    /// Replace a product's override
    Set {
        /// Product id
        id: String,

        /// Field patch as a JSON object, e.g. '{"price": 99.9, "featured": true}'
        #[arg(long, default_value = "{}")]
        fields: String,

        /// Units on hand, replacing the static stock
        #[arg(long)]
        stock: Option<i64>,
    },
    /// Remove a product's override
    Clear {
        /// Product id
        id: String,
    },
}

pub(crate) async fn run(command: OverrideCommand) -> Result<(), String> {
    let service = super::context(&command.database).await?.catalog;

    match command.command {
        OverrideSubcommand::Set { id, fields, stock } => {
            let fields: OverrideFields = serde_json::from_str(&fields)
                .map_err(|error| format!("invalid override fields: {error}"))?;

            let product = service
                .put_override(ProductId::from(id), OverrideUpdate { fields, stock })
                .await
                .map_err(|error| format!("failed to store override: {error}"))?;

            println!("{}", super::product::table(&[product]));
        }
        OverrideSubcommand::Clear { id } => {
            service
                .clear_override(ProductId::from(id.as_str()))
                .await
                .map_err(|error| format!("failed to clear override: {error}"))?;

            println!("cleared override for {id}");
        }
    }

    Ok(())
}
