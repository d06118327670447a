use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank stage id, colliding stage ids, etc.).
    ConfigValidation(String),
    /// A related-record group arrived with no members.
    EmptyGroup,
    /// Upstream matching bug (e.g. an all-free group carrying transactions).
    DataIntegrity(String),
    /// Records in a single-deal lookup resolved to different deals.
    AmbiguousDealMatch { deal_ids: Vec<String> },
    /// An update action references a deal id absent from the snapshot.
    UnknownDeal(String),
    /// Tier encoding could not be parsed.
    TierParse { record_id: String, value: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::EmptyGroup => write!(f, "related-record group has no members"),
            Self::DataIntegrity(msg) => write!(f, "data integrity violation: {msg}"),
            Self::AmbiguousDealMatch { deal_ids } => {
                write!(f, "records resolve to multiple deals: {}", deal_ids.join(", "))
            }
            Self::UnknownDeal(id) => {
                write!(f, "update references deal '{id}' absent from the snapshot")
            }
            Self::TierParse { record_id, value } => {
                write!(f, "record '{record_id}': cannot parse tier '{value}'")
            }
        }
    }
}

impl std::error::Error for ReconError {}
