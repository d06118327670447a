use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A financial event tied to a license. Many transactions may reference one
/// license; refunds arrive as their own rows with `sale_type = Refund`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub addon_license_id: String,
    #[serde(default)]
    pub license_id: Option<String>,
    pub addon_key: String,
    pub sale_date: NaiveDate,
    pub sale_type: SaleType,
    /// Vendor tier encoding, same vocabulary as the license tier.
    pub tier: String,
    #[serde(rename = "vendorAmount", with = "crate::money::decimal_cents")]
    pub vendor_amount_cents: i64,
    #[serde(rename = "purchasePrice", with = "crate::money::decimal_cents")]
    pub purchase_price_cents: i64,
    #[serde(default)]
    pub billing_period: Option<BillingPeriod>,
}

impl Transaction {
    pub fn is_refund(&self) -> bool {
        self.sale_type == SaleType::Refund
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleType {
    New,
    Renewal,
    Upgrade,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingPeriod {
    Annual,
    Monthly,
}
