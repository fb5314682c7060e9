use saleflow_core::config::AppConfig;
use saleflow_core::format::{format_currency, format_percent, parse_percent, parse_pt_number};
use saleflow_core::{DiscountEngine, PaymentMethod, StandardDiscountEngine};
use serde_json::json;

use super::CommandResult;

pub fn run(config: &AppConfig, base: &str, percent: &str, method: &str) -> CommandResult {
    let method = match method.parse::<PaymentMethod>() {
        Ok(method) => method,
        Err(error) => return CommandResult::failure("quote", "invalid_argument", error, 2),
    };

    let base = parse_pt_number(base);
    let percent = parse_percent(percent);
    let engine = StandardDiscountEngine::new(config.discount.tier());
    let quote = engine.quote_method(method, base, percent);

    tracing::debug!(
        event_name = "cli.quote.computed",
        method = method.label(),
        base = %quote.base,
        applied_percent = %quote.applied_percent,
        within_tier = quote.within_tier,
        "discount quote computed"
    );

    let message = format!(
        "{}: {} com {} de desconto = {}",
        method.label(),
        format_currency(quote.base),
        format_percent(quote.applied_percent),
        format_currency(quote.net_amount)
    );
    let report = json!({
        "method": method,
        "base": format_currency(quote.base),
        "applied_percent": format_percent(quote.applied_percent),
        "discount_value": format_currency(quote.discount_value),
        "net_amount": format_currency(quote.net_amount),
        "tier": {
            "min_percent": format_percent(quote.tier.min_percent),
            "max_percent": format_percent(quote.tier.max_percent),
        },
        "within_tier": quote.within_tier,
        "partner_reduction_percent": format_percent(quote.partner_reduction_percent),
    });

    CommandResult::success_with_report("quote", message, Some(report))
}
