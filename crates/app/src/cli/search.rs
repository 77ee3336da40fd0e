use clap::Args;
use vitrine::search::SearchQuery;
use vitrine_app::config::DatabaseConfig;

use super::OutputArgs;

#[derive(Debug, Args)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    output: OutputArgs,

    /// RFC 3339 instant used for discount pricing; defaults to now
    #[arg(long)]
    at: Option<String>,

    /// Query parameters as key=value, e.g. q=sensör price_max=200 rohs=true
    params: Vec<String>,
}

pub(crate) async fn run(args: SearchArgs) -> Result<(), String> {
    let pairs = args
        .params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got {param}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let query =
        SearchQuery::from_pairs(pairs).map_err(|error| format!("invalid query: {error}"))?;
    let at = super::parse_at(args.at.as_deref())?;

    let service = super::context(&args.database).await?.search;

    let page = service
        .search(query, at)
        .await
        .map_err(|error| format!("search failed: {error}"))?;

    args.output.print(&page, || {
        format!(
            "{}\npage {}, {} per page, {} matching",
            super::product::table(&page.items),
            page.page,
            page.page_size,
            page.total
        )
    })
}
