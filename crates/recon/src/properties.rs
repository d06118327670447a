use chrono::NaiveDate;

use marketsync_core::{DealProperties, DealPropertyPatch, DealStage, License, Transaction};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::tier;

/// Full property bag for a deal derived from one license plus the
/// transactions backing it. `transactions` also supplies the stored
/// transaction id (earliest by sale date) and the tier interpretations.
pub fn build_properties(
    config: &ReconConfig,
    license: &License,
    transactions: &[&Transaction],
    stage: DealStage,
    amount_cents: i64,
) -> Result<DealProperties, ReconError> {
    let transaction_id = transactions
        .iter()
        .min_by_key(|t| (t.sale_date, &t.transaction_id))
        .map(|t| t.transaction_id.clone());

    Ok(DealProperties {
        addon_license_id: Some(license.addon_license_id.clone()),
        transaction_id,
        close_date: close_date_for(license, transactions),
        deal_name: deal_name(license),
        dealstage: config.pipeline.id_for(stage).to_string(),
        pipeline: config.pipeline.id.clone(),
        amount_cents,
        country: license.country.clone(),
        origin: config.deal.origin.clone(),
        related_products: config.deal.related_products.clone(),
        app: license.addon_key.clone(),
        deployment: license.hosting,
        license_tier: tier::max_tier(license, transactions)?,
    })
}

/// Earliest transaction sale date, or the license maintenance start when no
/// transaction backs the deal (fresh evals).
pub fn close_date_for(license: &License, transactions: &[&Transaction]) -> NaiveDate {
    transactions
        .iter()
        .map(|t| t.sale_date)
        .min()
        .unwrap_or(license.maintenance_start_date)
}

fn deal_name(license: &License) -> String {
    format!("{} at {}", license.addon_key, license.technical_domain())
}

/// Property-level diff: desired values merged over the existing deal, equal
/// fields stripped. Callers discard the whole update when the patch comes
/// back empty.
pub fn diff_against(existing: &DealProperties, desired: &DealProperties) -> DealPropertyPatch {
    DealPropertyPatch {
        addon_license_id: diff_id(&desired.addon_license_id, &existing.addon_license_id),
        transaction_id: diff_id(&desired.transaction_id, &existing.transaction_id),
        close_date: diff_field(&desired.close_date, &existing.close_date),
        deal_name: diff_field(&desired.deal_name, &existing.deal_name),
        dealstage: diff_field(&desired.dealstage, &existing.dealstage),
        pipeline: diff_field(&desired.pipeline, &existing.pipeline),
        amount_cents: diff_field(&desired.amount_cents, &existing.amount_cents),
        country: diff_field(&desired.country, &existing.country),
        origin: diff_field(&desired.origin, &existing.origin),
        related_products: diff_field(&desired.related_products, &existing.related_products),
        app: diff_field(&desired.app, &existing.app),
        deployment: diff_field(&desired.deployment, &existing.deployment),
        license_tier: diff_field(&desired.license_tier, &existing.license_tier),
    }
}

fn diff_field<T: Clone + PartialEq>(desired: &T, existing: &T) -> Option<T> {
    (desired != existing).then(|| desired.clone())
}

/// A desired id that's absent never clears the stored one.
fn diff_id(desired: &Option<String>, existing: &Option<String>) -> Option<String> {
    match desired {
        Some(d) if existing.as_deref() != Some(d.as_str()) => Some(d.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketsync_core::{ContactInfo, Hosting, LicenseStatus, LicenseType, SaleType};

    fn license() -> License {
        License {
            addon_license_id: "L42".into(),
            license_id: None,
            addon_key: "com.example.addon".into(),
            license_type: LicenseType::Commercial,
            status: LicenseStatus::Active,
            hosting: Hosting::Server,
            maintenance_start_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            maintenance_end_date: None,
            tier: "50 Users".into(),
            country: "US".into(),
            technical_contact: ContactInfo { email: "ops@corp.example".into(), name: None },
            billing_contact: None,
            partner_details: None,
            evaluation_opportunity_size: None,
        }
    }

    fn tx(id: &str, date: &str, tier: &str) -> Transaction {
        Transaction {
            transaction_id: id.into(),
            addon_license_id: "L42".into(),
            license_id: None,
            addon_key: "com.example.addon".into(),
            sale_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            sale_type: SaleType::New,
            tier: tier.into(),
            vendor_amount_cents: 10000,
            purchase_price_cents: 12500,
            billing_period: None,
        }
    }

    #[test]
    fn builds_full_bag() {
        let config = ReconConfig::default();
        let l = license();
        let t1 = tx("AT-2", "2026-03-01", "100 Users");
        let t2 = tx("AT-1", "2026-02-01", "50 Users");
        let props =
            build_properties(&config, &l, &[&t1, &t2], DealStage::ClosedWon, 10000).unwrap();

        assert_eq!(props.addon_license_id.as_deref(), Some("L42"));
        // Earliest transaction supplies id and close date.
        assert_eq!(props.transaction_id.as_deref(), Some("AT-1"));
        assert_eq!(props.close_date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(props.deal_name, "com.example.addon at corp.example");
        assert_eq!(props.dealstage, "closedwon");
        assert_eq!(props.pipeline, "default");
        assert_eq!(props.license_tier, 100);
        assert_eq!(props.amount_cents, 10000);
    }

    #[test]
    fn close_date_falls_back_to_maintenance_start() {
        let l = license();
        assert_eq!(close_date_for(&l, &[]), l.maintenance_start_date);
    }

    #[test]
    fn identical_bags_diff_to_empty() {
        let config = ReconConfig::default();
        let l = license();
        let props = build_properties(&config, &l, &[], DealStage::Eval, 0).unwrap();
        assert!(diff_against(&props, &props).is_empty());
    }

    #[test]
    fn changed_fields_only() {
        let config = ReconConfig::default();
        let l = license();
        let existing = build_properties(&config, &l, &[], DealStage::Eval, 0).unwrap();
        let desired =
            build_properties(&config, &l, &[], DealStage::ClosedWon, 10000).unwrap();
        let patch = diff_against(&existing, &desired);
        assert_eq!(patch.dealstage.as_deref(), Some("closedwon"));
        assert_eq!(patch.amount_cents, Some(10000));
        assert!(patch.country.is_none());
        assert!(patch.deal_name.is_none());
        assert!(patch.close_date.is_none());
    }

    #[test]
    fn absent_desired_id_never_clears() {
        let config = ReconConfig::default();
        let l = license();
        let mut existing = build_properties(&config, &l, &[], DealStage::Eval, 0).unwrap();
        existing.transaction_id = Some("AT-9".into());
        let desired = build_properties(&config, &l, &[], DealStage::Eval, 0).unwrap();
        let patch = diff_against(&existing, &desired);
        assert!(patch.transaction_id.is_none());
        assert!(patch.is_empty());
    }
}
