//! Console reports
//!
//! Plain-text renderings of a feed read and of a network's settings. Floats
//! print the way the published C3 readers print them: integral values keep a
//! trailing `.0`, very small or very large values switch to exponent form.

use c3_common::units::format_timestamp;
use c3_common::{FeedResult, OracleSettings, PriceData};

/// `2.0`, `0.354321`, `1e-05`, `1e+16`
///
/// Shortest round-trip digits; positional between 1e-4 and 1e16, exponent
/// form with a signed two-digit exponent outside that range.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if value == 0.0 || (-4..16).contains(&exponent) {
        let positional = format!("{value}");
        if positional.contains('.') {
            positional
        } else {
            format!("{positional}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// `ADA-USD` is quoted as `USD/ADA`
pub fn pair_label(token_pair: &str) -> String {
    match token_pair.split_once('-') {
        Some((base, quote)) => format!("{quote}/{base}"),
        None => token_pair.to_string(),
    }
}

pub fn feed_report(address: &str, token_pair: &str, price: &PriceData) -> FeedResult<String> {
    let lines = [
        format!("Contract address: {address}"),
        format!(
            "C3 Network feed [{}]: {}",
            pair_label(token_pair),
            format_float(price.price_display())
        ),
        format!("Creation time: {}", format_timestamp(price.timestamp)?),
        format!("Expiration time: {}", format_timestamp(price.expiry)?),
    ];
    Ok(lines.join("\n"))
}

pub fn configuration_report(address: &str, token_pair: &str, settings: &OracleSettings) -> String {
    let (node_reward, aggregate_reward, platform_reward) = settings.price_rewards();
    let (signatories, threshold) = settings.platform_signatories();

    let lines = [
        format!("Contract address: {address}"),
        format!(
            "########## C3 Network configuration [{}] ##########",
            pair_label(token_pair)
        ),
        format!(
            "1. List of authorized nodes in Network: {} nodes.",
            settings.node_count()
        ),
        format!(
            "2. The percentage of nodes needed for aggregation: {}%.",
            format_float(settings.updated_nodes_percent())
        ),
        format!(
            "3. The max time since last node update for aggregation: {} minutes.",
            format_float(settings.updated_node_time_minutes())
        ),
        format!(
            "4. The min time since last aggregation for calculating a new network feed: {} minutes.",
            format_float(settings.aggregate_time_minutes())
        ),
        format!(
            "5. The percentage of change between last aggregated value and the new network feed: {}%.",
            format_float(settings.aggregate_change_percent())
        ),
        format!(
            "6. Minimum Required Value for Recharging the C3 Pool: {} tokens.",
            settings.minimum_deposit
        ),
        format!(
            "7. Valid time window to execute the aggregate transaction: {} minutes.",
            format_float(settings.aggregate_valid_range_minutes())
        ),
        "8. C3 Network rewards:".to_string(),
        format!("    8.1 Nodes: {node_reward} C3"),
        format!("    8.2 Aggregation: {aggregate_reward} C3"),
        format!("    8.3 Platform: {platform_reward} C3"),
        format!(
            "9. Threshold setting 1 for Consensus (IQR): {}.",
            settings.iqr_multiplier
        ),
        format!(
            "10. Threshold setting 2 for Consensus (DIV): {}%.",
            format_float(settings.divergence_percent())
        ),
        "11. Oracle platform entity:".to_string(),
        format!("    11.1 Signatories pool: {}", signatories.len()),
        format!("    11.2 Minimum number of signatories: {threshold}"),
    ];
    lines.join("\n")
}
