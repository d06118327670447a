use std::collections::HashMap;

use serde::{Serialize, Serializer};

use marketsync_core::{
    ContactDirectory, Deal, DealProperties, DealPropertyPatch, RelatedLicenseSet,
};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One consistent snapshot: every collaborator download has completed before
/// this is assembled, and the engine never observes a partial one.
#[derive(Debug, serde::Deserialize)]
pub struct ReconInput {
    pub groups: Vec<RelatedLicenseSet>,
    pub deals: Vec<Deal>,
    pub contacts: ContactDirectory,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A desired CRM mutation. Applying these (and retrying failures) is the
/// upload collaborator's job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Create(DealCreate),
    Update(DealUpdate),
}

/// A brand-new deal: full property bag plus the contact ids to associate.
#[derive(Debug, Clone, Serialize)]
pub struct DealCreate {
    pub properties: DealProperties,
    pub contact_ids: Vec<String>,
}

/// An existing deal plus only the properties whose desired value differs.
/// Never emitted with an empty patch.
#[derive(Debug, Clone, Serialize)]
pub struct DealUpdate {
    pub deal_id: String,
    pub patch: DealPropertyPatch,
}

/// One contact<->deal association mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub contact_id: String,
    pub deal_id: String,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Why a group produced no actions. `Display` gives the machine-readable
/// tag the inspection tooling consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Every technical-contact domain fell in an exclusion set. Carries the
    /// sorted distinct domains.
    BadDomains(Vec<String>),
    InactiveEvals,
    EvalUpToDate,
}

impl IgnoreReason {
    /// The tag without its payload, for summary bucketing.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BadDomains(_) => "bad-domains",
            Self::InactiveEvals => "inactive-evals",
            Self::EvalUpToDate => "eval-up-to-date",
        }
    }
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadDomains(domains) => write!(f, "bad-domains:{}", domains.join(",")),
            Self::InactiveEvals => write!(f, "inactive-evals"),
            Self::EvalUpToDate => write!(f, "eval-up-to-date"),
        }
    }
}

impl Serialize for IgnoreReason {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&self.to_string())
    }
}

/// A skipped group, kept for audit/inspection output.
#[derive(Debug, Clone, Serialize)]
pub struct IgnoredGroup {
    pub reason: IgnoreReason,
    pub addon_license_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub groups_total: usize,
    pub creates: usize,
    pub updates: usize,
    pub associations_created: usize,
    pub associations_removed: usize,
    pub ignored: usize,
    pub ignored_by_reason: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub creates: Vec<DealCreate>,
    pub updates: Vec<DealUpdate>,
    pub associations_to_create: Vec<Association>,
    pub associations_to_remove: Vec<Association>,
    pub ignored: Vec<IgnoredGroup>,
}
