use clap::{Args, Subcommand};
use vitrine::products::{CanonicalProduct, ProductId};
use vitrine_app::config::DatabaseConfig;

use super::OutputArgs;

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Resolve one product, inactive ones included
    Get {
        /// Product id, e.g. prd-0001
        id: String,
    },
    /// List every active product
    List,
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    let service = super::context(&command.database).await?.catalog;

    let products = match command.command {
        ProductSubcommand::Get { id } => vec![
            service
                .resolve_by_id(ProductId::from(id))
                .await
                .map_err(|error| format!("failed to resolve product: {error}"))?,
        ],
        ProductSubcommand::List => service
            .resolve_all()
            .await
            .map_err(|error| format!("failed to list products: {error}"))?,
    };

    command.output.print(&products, || table(&products).to_string())
}

pub(crate) fn table(products: &[CanonicalProduct]) -> tabled::Table {
    super::render(
        &["id", "name", "category", "brand", "lifecycle", "price", "stock", "active"],
        products.iter().map(|product| {
            [
                product.id.to_string(),
                product.name.clone(),
                product.category.clone(),
                product.brand.clone(),
                product.lifecycle.as_str().to_string(),
                product.price.to_string(),
                product.stock.to_string(),
                product.active.to_string(),
            ]
        }),
        &[5, 6],
    )
}
