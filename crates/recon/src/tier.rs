use marketsync_core::{License, Transaction};

use crate::error::ReconError;

/// Tier value standing in for "Unlimited Users". Strictly above any bounded
/// user tier the feeds carry, so `max` never prefers a bounded tier.
pub const UNLIMITED_TIER: i32 = 10_001;

/// Parse one vendor tier encoding into a user-count bucket.
///
/// Recognized forms: `"Unlimited Users"`, `"<n> Users"`,
/// `"Per Unit Pricing (<n> users)"`, the non-sizing markers
/// `"Subscription"` / `"Evaluation"` / `"Demonstration License"` (tier 0),
/// and a bare integer. Anything else is a data error, never a silent zero.
pub fn parse_tier(record_id: &str, value: &str) -> Result<i32, ReconError> {
    let value = value.trim();
    match value {
        "Unlimited Users" => return Ok(UNLIMITED_TIER),
        "Subscription" | "Evaluation" | "Demonstration License" => return Ok(0),
        _ => {}
    }
    if let Some(users) = value.strip_suffix(" Users") {
        return parse_count(record_id, value, users);
    }
    if let Some(users) = value
        .strip_prefix("Per Unit Pricing (")
        .and_then(|v| v.strip_suffix(" users)"))
    {
        return parse_count(record_id, value, users);
    }
    parse_count(record_id, value, value)
}

fn parse_count(record_id: &str, original: &str, digits: &str) -> Result<i32, ReconError> {
    digits.trim().parse().map_err(|_| ReconError::TierParse {
        record_id: record_id.to_string(),
        value: original.to_string(),
    })
}

/// Distinct tier interpretations for a license and its transactions. The
/// evaluation-opportunity-size encoding contributes only when the feed
/// filled it in (`"NA"`/`"Unknown"` are absence markers, not errors).
pub fn tier_candidates(
    license: &License,
    transactions: &[&Transaction],
) -> Result<Vec<i32>, ReconError> {
    let mut candidates = vec![parse_tier(&license.addon_license_id, &license.tier)?];
    if let Some(size) = &license.evaluation_opportunity_size {
        let size = size.trim();
        if !size.is_empty() && size != "NA" && size != "Unknown" {
            candidates.push(parse_tier(&license.addon_license_id, size)?);
        }
    }
    for tx in transactions {
        candidates.push(parse_tier(&tx.transaction_id, &tx.tier)?);
    }
    Ok(candidates)
}

/// The deal-sizing tier: maximum across all interpretations.
pub fn max_tier(license: &License, transactions: &[&Transaction]) -> Result<i32, ReconError> {
    let candidates = tier_candidates(license, transactions)?;
    Ok(candidates.into_iter().max().unwrap_or(0))
}
