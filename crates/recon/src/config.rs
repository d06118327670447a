use std::collections::BTreeSet;

use serde::Deserialize;

use marketsync_core::DealStage;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub deal: DealConstants,
    #[serde(default)]
    pub exclusions: DomainExclusions,
}

// ---------------------------------------------------------------------------
// Pipeline / stage mapping
// ---------------------------------------------------------------------------

/// CRM pipeline id plus the raw stage ids for the three lifecycle stages the
/// engine manages. Deals sitting in any other stage id are never regressed.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub id: String,
    pub eval: String,
    pub closed_won: String,
    pub closed_lost: String,
}

impl PipelineConfig {
    pub fn id_for(&self, stage: DealStage) -> &str {
        match stage {
            DealStage::Eval => &self.eval,
            DealStage::ClosedWon => &self.closed_won,
            DealStage::ClosedLost => &self.closed_lost,
        }
    }

    /// `None` for stage ids the engine does not manage.
    pub fn stage_for(&self, raw: &str) -> Option<DealStage> {
        if raw == self.eval {
            Some(DealStage::Eval)
        } else if raw == self.closed_won {
            Some(DealStage::ClosedWon)
        } else if raw == self.closed_lost {
            Some(DealStage::ClosedLost)
        } else {
            None
        }
    }

    pub fn is(&self, raw: &str, stage: DealStage) -> bool {
        self.stage_for(raw) == Some(stage)
    }
}

// ---------------------------------------------------------------------------
// Deal constants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DealConstants {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_related_products")]
    pub related_products: String,
}

impl Default for DealConstants {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            related_products: default_related_products(),
        }
    }
}

fn default_origin() -> String {
    "MARKETPLACE".to_string()
}

fn default_related_products() -> String {
    "Marketplace Apps".to_string()
}

// ---------------------------------------------------------------------------
// Domain exclusions
// ---------------------------------------------------------------------------

/// Technical-contact domains that suppress action generation for a group
/// when every member falls in one of the sets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainExclusions {
    #[serde(default)]
    pub free_domains: BTreeSet<String>,
    #[serde(default)]
    pub partner_domains: BTreeSet<String>,
}

impl DomainExclusions {
    /// Domains compare lowercased.
    pub fn is_excluded(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.free_domains.contains(&domain) || self.partner_domains.contains(&domain)
    }

    fn normalize(&mut self) {
        self.free_domains = lowercased(&self.free_domains);
        self.partner_domains = lowercased(&self.partner_domains);
    }
}

fn lowercased(domains: &BTreeSet<String>) -> BTreeSet<String> {
    domains.iter().map(|d| d.to_ascii_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        config.exclusions.normalize();
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (field, value) in [
            ("pipeline.id", &self.pipeline.id),
            ("pipeline.eval", &self.pipeline.eval),
            ("pipeline.closed_won", &self.pipeline.closed_won),
            ("pipeline.closed_lost", &self.pipeline.closed_lost),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "{field} must not be blank"
                )));
            }
        }

        // The three managed stages must be distinct ids.
        let stages = [
            &self.pipeline.eval,
            &self.pipeline.closed_won,
            &self.pipeline.closed_lost,
        ];
        let distinct: BTreeSet<&String> = stages.iter().copied().collect();
        if distinct.len() != stages.len() {
            return Err(ReconError::ConfigValidation(
                "eval, closed_won and closed_lost stage ids must be distinct".into(),
            ));
        }

        Ok(())
    }
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: "Marketplace deal sync".to_string(),
            pipeline: PipelineConfig {
                id: "default".to_string(),
                eval: "evaluation".to_string(),
                closed_won: "closedwon".to_string(),
                closed_lost: "closedlost".to_string(),
            },
            deal: DealConstants::default(),
            exclusions: DomainExclusions::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
