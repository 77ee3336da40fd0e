use clap::Args;
use rust_decimal::Decimal;
use vitrine::rates::{CurrencyCode, RATES_CACHE_CONTROL};
use vitrine_app::{
    config::RatesConfig,
    rates::{RateCache, RatesService},
};

use super::OutputArgs;

#[derive(Debug, Args)]
pub(crate) struct RatesArgs {
    #[command(flatten)]
    rates: RatesConfig,

    #[command(flatten)]
    output: OutputArgs,

    /// TRY amount to convert into every supported currency
    #[arg(long)]
    amount: Option<Decimal>,
}

pub(crate) async fn run(args: RatesArgs) -> Result<(), String> {
    let cache = RateCache::from_config(&args.rates)
        .map_err(|error| format!("failed to build HTTP client: {error}"))?;

    let snapshot = cache.get_rates().await;
    let response = snapshot.to_response();

    args.output.print(&response, || {
        let table = super::render(
            &["currency", "rate", "converted"],
            CurrencyCode::ALL.into_iter().map(|currency| {
                [
                    currency.to_string(),
                    snapshot.rate(currency).to_string(),
                    args.amount.map_or_else(
                        || "-".to_string(),
                        |amount| snapshot.convert(amount, currency).to_string(),
                    ),
                ]
            }),
            &[1, 2],
        );

        format!(
            "{table}\nupdated {} (Cache-Control: {RATES_CACHE_CONTROL})",
            response.updated_at
        )
    })
}
