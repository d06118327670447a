use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::license::Hosting;

/// A CRM deal as the download collaborator delivers it. Read-only input;
/// the engine emits actions describing desired mutations, never mutates
/// a `Deal` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub properties: DealProperties,
    #[serde(default)]
    pub contact_ids: Vec<String>,
}

/// The lifecycle stages the engine manages. Deals can sit in other
/// pipeline stages too; those map to `None` through the configured stage
/// mapping and are never regressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Eval,
    ClosedWon,
    ClosedLost,
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eval => write!(f, "eval"),
            Self::ClosedWon => write!(f, "closed_won"),
            Self::ClosedLost => write!(f, "closed_lost"),
        }
    }
}

/// The flat property set a deal carries, as an explicit field list.
///
/// `dealstage` and `pipeline` hold raw CRM ids; the engine interprets them
/// through its configured stage mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealProperties {
    #[serde(default)]
    pub addon_license_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub close_date: NaiveDate,
    pub deal_name: String,
    #[serde(rename = "dealstage")]
    pub dealstage: String,
    pub pipeline: String,
    #[serde(rename = "amount", with = "crate::money::decimal_cents")]
    pub amount_cents: i64,
    pub country: String,
    pub origin: String,
    pub related_products: String,
    /// Marketplace addon key.
    pub app: String,
    pub deployment: Hosting,
    pub license_tier: i32,
}

/// Property-level diff against an existing deal: only fields whose desired
/// value differs are present. An all-`None` patch means the update is a
/// no-op and must be discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_license_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_name: Option<String>,
    #[serde(rename = "dealstage", skip_serializing_if = "Option::is_none")]
    pub dealstage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_products: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Hosting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_tier: Option<i32>,
}

impl DealPropertyPatch {
    /// Exhaustive destructure so a new property can't be silently missed.
    pub fn is_empty(&self) -> bool {
        let Self {
            addon_license_id,
            transaction_id,
            close_date,
            deal_name,
            dealstage,
            pipeline,
            amount_cents,
            country,
            origin,
            related_products,
            app,
            deployment,
            license_tier,
        } = self;
        addon_license_id.is_none()
            && transaction_id.is_none()
            && close_date.is_none()
            && deal_name.is_none()
            && dealstage.is_none()
            && pipeline.is_none()
            && amount_cents.is_none()
            && country.is_none()
            && origin.is_none()
            && related_products.is_none()
            && app.is_none()
            && deployment.is_none()
            && license_tier.is_none()
    }
}
