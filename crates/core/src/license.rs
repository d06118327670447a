use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An evaluation or purchased entitlement record from the marketplace feed.
///
/// One snapshot per feed download, superseded wholesale on the next sync.
/// The identifier pair is `addon_license_id` plus the optional legacy
/// `license_id`; deals may be keyed by either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub addon_license_id: String,
    #[serde(default)]
    pub license_id: Option<String>,
    pub addon_key: String,
    pub license_type: LicenseType,
    pub status: LicenseStatus,
    pub hosting: Hosting,
    pub maintenance_start_date: NaiveDate,
    #[serde(default)]
    pub maintenance_end_date: Option<NaiveDate>,
    /// Vendor tier encoding, e.g. `"100 Users"` or `"Unlimited Users"`.
    pub tier: String,
    pub country: String,
    pub technical_contact: ContactInfo,
    #[serde(default)]
    pub billing_contact: Option<ContactInfo>,
    #[serde(default)]
    pub partner_details: Option<PartnerDetails>,
    /// Second tier encoding carried by evaluation feeds.
    #[serde(default)]
    pub evaluation_opportunity_size: Option<String>,
}

impl License {
    /// Lowercased domain of the technical contact's email.
    pub fn technical_domain(&self) -> String {
        self.technical_contact
            .email
            .rsplit('@')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    /// Free entitlements: evaluations and open-source grants.
    pub fn is_free(&self) -> bool {
        matches!(
            self.license_type,
            LicenseType::Evaluation | LicenseType::OpenSource
        )
    }

    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseType {
    Evaluation,
    OpenSource,
    Commercial,
    Academic,
    Community,
    Demonstration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Cancelled,
}

/// Deployment type, as the feed spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hosting {
    Cloud,
    Server,
    #[serde(rename = "Data Center")]
    DataCenter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDetails {
    pub partner_name: String,
    #[serde(default)]
    pub billing_contact: Option<ContactInfo>,
}
