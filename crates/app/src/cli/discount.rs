use clap::{Args, Subcommand};
use uuid::Uuid;
use vitrine::discounts::{DiscountRule, DiscountRuleDraft, DiscountRuleUuid, PublicDiscount};
use vitrine_app::{config::DatabaseConfig, domain::discounts::DiscountsService};

use super::OutputArgs;

#[derive(Debug, Args)]
pub(crate) struct DiscountCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: DiscountSubcommand,
}

#[derive(Debug, Subcommand)]
enum DiscountSubcommand {
    /// Create a rule from a JSON payload
    Create {
        /// e.g. '{"name": "Bahar", "scope": "ALL", "type": "PERCENT", "value": 10}'
        rule: String,
    },
    /// Replace an existing rule with a JSON payload
    Update {
        uuid: Uuid,
        rule: String,
    },
    /// Switch a rule on
    Activate { uuid: Uuid },
    /// Switch a rule off
    Deactivate { uuid: Uuid },
    /// List every stored rule
    List,
    /// Public view of the rules in force
    Active {
        /// RFC 3339 instant; defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

pub(crate) async fn run(command: DiscountCommand) -> Result<(), String> {
    let service = super::context(&command.database).await?.discounts;

    let rules = match command.command {
        DiscountSubcommand::Create { rule } => vec![
            service
                .create_rule(parse_draft(&rule)?)
                .await
                .map_err(|error| format!("failed to create rule: {error}"))?,
        ],
        DiscountSubcommand::Update { uuid, rule } => vec![
            service
                .update_rule(DiscountRuleUuid::from_uuid(uuid), parse_draft(&rule)?)
                .await
                .map_err(|error| format!("failed to update rule: {error}"))?,
        ],
        DiscountSubcommand::Activate { uuid } => vec![toggle(&*service, uuid, true).await?],
        DiscountSubcommand::Deactivate { uuid } => vec![toggle(&*service, uuid, false).await?],
        DiscountSubcommand::List => service
            .list_rules()
            .await
            .map_err(|error| format!("failed to list rules: {error}"))?,
        DiscountSubcommand::Active { at } => {
            let at = super::parse_at(at.as_deref())?;

            let public = service
                .public_rules_at(at)
                .await
                .map_err(|error| format!("failed to list active rules: {error}"))?;

            return command.output.print(&public, || public_table(&public).to_string());
        }
    };

    let public: Vec<PublicDiscount> = rules.iter().map(DiscountRule::to_public).collect();

    command.output.print(&public, || table(&rules).to_string())
}

fn parse_draft(rule: &str) -> Result<DiscountRuleDraft, String> {
    serde_json::from_str(rule).map_err(|error| format!("invalid rule payload: {error}"))
}

async fn toggle(
    service: &dyn DiscountsService,
    uuid: Uuid,
    active: bool,
) -> Result<DiscountRule, String> {
    service
        .set_rule_active(DiscountRuleUuid::from_uuid(uuid), active)
        .await
        .map_err(|error| format!("failed to update rule: {error}"))
}

fn window(at: Option<jiff::Timestamp>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.to_string())
}

fn table(rules: &[DiscountRule]) -> tabled::Table {
    super::render(
        &["uuid", "name", "scope", "type", "value", "starts", "ends", "active"],
        rules.iter().map(|rule| {
            [
                rule.uuid.to_string(),
                rule.name.clone(),
                rule.scope.as_str().to_string(),
                rule.kind.as_str().to_string(),
                rule.kind.value().map_or_else(|| "-".to_string(), |value| value.to_string()),
                window(rule.starts_at),
                window(rule.ends_at),
                rule.active.to_string(),
            ]
        }),
        &[4],
    )
}

fn public_table(rules: &[PublicDiscount]) -> tabled::Table {
    super::render(
        &["id", "name", "scope", "target", "type", "value"],
        rules.iter().map(|rule| {
            let target = rule
                .category_name
                .clone()
                .or_else(|| {
                    rule.product_ids.as_ref().map(|ids| {
                        ids.iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                })
                .unwrap_or_default();

            [
                rule.id.to_string(),
                rule.name.clone(),
                rule.scope.clone(),
                target,
                rule.kind.clone(),
                rule.value.map_or_else(|| "-".to_string(), |value| value.to_string()),
            ]
        }),
        &[5],
    )
}
