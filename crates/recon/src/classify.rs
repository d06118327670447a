use log::debug;

use marketsync_core::{
    ContactDirectory, DealPropertyPatch, DealStage, License, LicenseContext,
};

use crate::actions::{ActionGenerator, EmittedAction};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::events;
use crate::finder::DealFinder;
use crate::model::{Action, Association, DealCreate, DealUpdate, IgnoreReason, IgnoredGroup};
use crate::properties;

/// Everything one group contributes to the run.
#[derive(Debug, Default)]
pub struct GroupOutcome {
    pub actions: Vec<Action>,
    pub associations_to_create: Vec<Association>,
    pub associations_to_remove: Vec<Association>,
    pub ignored: Option<IgnoredGroup>,
}

impl GroupOutcome {
    fn ignored(reason: IgnoreReason, group: &[LicenseContext]) -> Self {
        Self {
            ignored: Some(IgnoredGroup {
                reason,
                addon_license_ids: group
                    .iter()
                    .map(|c| c.license.addon_license_id.clone())
                    .collect(),
            }),
            ..Default::default()
        }
    }
}

/// The reconciliation driver: one pass per related-record group.
pub struct GroupClassifier<'a> {
    config: &'a ReconConfig,
    finder: &'a DealFinder<'a>,
    contacts: &'a ContactDirectory,
    generator: ActionGenerator<'a>,
}

impl<'a> GroupClassifier<'a> {
    pub fn new(
        config: &'a ReconConfig,
        finder: &'a DealFinder<'a>,
        contacts: &'a ContactDirectory,
    ) -> Self {
        Self {
            config,
            finder,
            contacts,
            generator: ActionGenerator::new(config, finder),
        }
    }

    pub fn classify(&self, group: &'a [LicenseContext]) -> Result<GroupOutcome, ReconError> {
        if group.is_empty() {
            return Err(ReconError::EmptyGroup);
        }

        // Excluded domains are checked before any deal matching, so they
        // never create or update deals even when a stray deal exists.
        if let Some(domains) = self.excluded_domains(group) {
            debug!("ignoring group [{}]: bad domains {}", group_ids(group), domains.join(","));
            return Ok(GroupOutcome::ignored(IgnoreReason::BadDomains(domains), group));
        }

        let all_free = group.iter().all(|c| c.license.is_free());
        let (emitted, reason) = if all_free {
            self.classify_all_free(group)?
        } else {
            (self.classify_paid(group)?, None)
        };

        if let Some(reason) = reason {
            debug!("ignoring group [{}]: {}", group_ids(group), reason);
            return Ok(GroupOutcome::ignored(reason, group));
        }
        Ok(self.finalize(emitted))
    }

    /// Every technical-contact domain in an exclusion set -> the sorted
    /// distinct domains; any reachable domain -> `None`.
    fn excluded_domains(&self, group: &[LicenseContext]) -> Option<Vec<String>> {
        let domains: Vec<String> =
            group.iter().map(|c| c.license.technical_domain()).collect();
        if !domains.iter().all(|d| self.config.exclusions.is_excluded(d)) {
            return None;
        }
        let mut distinct = domains;
        distinct.sort();
        distinct.dedup();
        Some(distinct)
    }

    fn classify_all_free(
        &self,
        group: &'a [LicenseContext],
    ) -> Result<(Vec<EmittedAction<'a>>, Option<IgnoreReason>), ReconError> {
        let transaction_count: usize = group.iter().map(|c| c.transactions.len()).sum();
        if transaction_count > 0 {
            return Err(ReconError::DataIntegrity(format!(
                "all-free group [{}] carries {transaction_count} transaction(s)",
                group_ids(group)
            )));
        }
        let Some(latest) = group
            .iter()
            .map(|c| &c.license)
            .max_by_key(|l| l.maintenance_start_date)
        else {
            return Err(ReconError::EmptyGroup);
        };

        match self.finder.deal_for_group(group)? {
            None => {
                if !latest.is_active() {
                    return Ok((vec![], Some(IgnoreReason::InactiveEvals)));
                }
                let props =
                    properties::build_properties(self.config, latest, &[], DealStage::Eval, 0)?;
                Ok((
                    vec![EmittedAction {
                        action: Action::Create(DealCreate {
                            properties: props,
                            contact_ids: vec![],
                        }),
                        license: Some(latest),
                        existing: None,
                    }],
                    None,
                ))
            }
            Some(deal) => {
                if latest.is_active() {
                    // Refresh the identifying id and close date, and only
                    // when one of them actually moved.
                    let close_date = properties::close_date_for(latest, &[]);
                    let mut patch = DealPropertyPatch::default();
                    if deal.properties.addon_license_id.as_deref()
                        != Some(latest.addon_license_id.as_str())
                    {
                        patch.addon_license_id = Some(latest.addon_license_id.clone());
                    }
                    if deal.properties.close_date != close_date {
                        patch.close_date = Some(close_date);
                    }
                    if patch.is_empty() {
                        return Ok((vec![], Some(IgnoreReason::EvalUpToDate)));
                    }
                    Ok((
                        vec![EmittedAction {
                            action: Action::Update(DealUpdate {
                                deal_id: deal.id.clone(),
                                patch,
                            }),
                            license: Some(latest),
                            existing: Some(deal),
                        }],
                        None,
                    ))
                } else {
                    // Lapsed eval: close the deal, once.
                    if self
                        .config
                        .pipeline
                        .is(&deal.properties.dealstage, DealStage::ClosedLost)
                    {
                        return Ok((vec![], None));
                    }
                    let patch = DealPropertyPatch {
                        dealstage: Some(self.config.pipeline.closed_lost.clone()),
                        ..Default::default()
                    };
                    Ok((
                        vec![EmittedAction {
                            action: Action::Update(DealUpdate {
                                deal_id: deal.id.clone(),
                                patch,
                            }),
                            license: Some(latest),
                            existing: Some(deal),
                        }],
                        None,
                    ))
                }
            }
        }
    }

    fn classify_paid(
        &self,
        group: &'a [LicenseContext],
    ) -> Result<Vec<EmittedAction<'a>>, ReconError> {
        let mut emitted = Vec::new();
        for event in events::events_for_group(group)? {
            emitted.extend(self.generator.actions_for(group, &event)?);
        }
        Ok(emitted)
    }

    /// Fill contact ids on creates; diff associations on updates that carry
    /// a license.
    fn finalize(&self, emitted: Vec<EmittedAction<'a>>) -> GroupOutcome {
        let mut outcome = GroupOutcome::default();
        for EmittedAction { mut action, license, existing } in emitted {
            match (&mut action, license) {
                (Action::Create(create), Some(license)) => {
                    create.contact_ids = self.desired_contact_ids(license);
                }
                (Action::Update(update), Some(license)) => {
                    if let Some(deal) = existing {
                        let desired = self.desired_contact_ids(license);
                        for id in &desired {
                            if !deal.contact_ids.contains(id) {
                                outcome.associations_to_create.push(Association {
                                    contact_id: id.clone(),
                                    deal_id: update.deal_id.clone(),
                                });
                            }
                        }
                        for id in &deal.contact_ids {
                            if !desired.contains(id) {
                                outcome.associations_to_remove.push(Association {
                                    contact_id: id.clone(),
                                    deal_id: update.deal_id.clone(),
                                });
                            }
                        }
                    }
                }
                _ => {}
            }
            outcome.actions.push(action);
        }
        outcome
    }

    /// Technical, billing, then partner billing contacts, deduplicated.
    /// Emails missing from the directory are dropped.
    fn desired_contact_ids(&self, license: &License) -> Vec<String> {
        let mut emails = vec![license.technical_contact.email.as_str()];
        if let Some(billing) = &license.billing_contact {
            emails.push(billing.email.as_str());
        }
        if let Some(partner) = &license.partner_details {
            if let Some(billing) = &partner.billing_contact {
                emails.push(billing.email.as_str());
            }
        }

        let mut ids: Vec<String> = Vec::new();
        for email in emails {
            if let Some(id) = self.contacts.contact_id(email) {
                if !ids.iter().any(|seen| seen == id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }
}

fn group_ids(group: &[LicenseContext]) -> String {
    group
        .iter()
        .map(|c| c.license.addon_license_id.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
