use marketsync_core::{
    Deal, DealPropertyPatch, DealStage, License, LicenseContext, Transaction,
};

use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::events::DealEvent;
use crate::finder::DealFinder;
use crate::model::{Action, DealCreate, DealUpdate};
use crate::properties;

/// An action plus the context the classifier's association diffing needs.
#[derive(Debug)]
pub struct EmittedAction<'a> {
    pub action: Action,
    /// License whose contacts drive association changes; refund updates
    /// carry none.
    pub license: Option<&'a License>,
    /// The matched deal, for updates.
    pub existing: Option<&'a Deal>,
}

/// Stateless transition table over one lifecycle event at a time.
pub struct ActionGenerator<'a> {
    config: &'a ReconConfig,
    finder: &'a DealFinder<'a>,
}

impl<'a> ActionGenerator<'a> {
    pub fn new(config: &'a ReconConfig, finder: &'a DealFinder<'a>) -> Self {
        Self { config, finder }
    }

    pub fn actions_for(
        &self,
        group: &'a [LicenseContext],
        event: &DealEvent<'a>,
    ) -> Result<Vec<EmittedAction<'a>>, ReconError> {
        match event {
            DealEvent::Purchase { paid, transaction, amount_cents, conversion } => {
                self.purchase(group, *paid, *transaction, *amount_cents, *conversion)
            }
            DealEvent::Renewal { transaction } | DealEvent::Upgrade { transaction } => {
                self.paid_transaction(group, *transaction)
            }
            DealEvent::Refund { transactions } => Ok(self.refund(transactions)),
        }
    }

    fn purchase(
        &self,
        group: &'a [LicenseContext],
        paid: &'a License,
        transaction: Option<&'a Transaction>,
        amount_cents: i64,
        conversion: bool,
    ) -> Result<Vec<EmittedAction<'a>>, ReconError> {
        let backing: Vec<&Transaction> = transaction.into_iter().collect();
        let desired = properties::build_properties(
            self.config,
            paid,
            &backing,
            DealStage::ClosedWon,
            amount_cents,
        )?;

        match self.match_purchase_deal(group, transaction) {
            None => Ok(vec![EmittedAction {
                action: Action::Create(DealCreate { properties: desired, contact_ids: vec![] }),
                license: Some(paid),
                existing: None,
            }]),
            Some(deal) => {
                // A relationship that started paid only upgrades stale eval
                // deals; a closed deal is never touched. Conversions update
                // whatever the deal's stage is and rely on diff suppression.
                let still_eval = self.config.pipeline.is(&deal.properties.dealstage, DealStage::Eval);
                if !conversion && !still_eval {
                    return Ok(vec![]);
                }
                let patch = properties::diff_against(&deal.properties, &desired);
                if patch.is_empty() {
                    return Ok(vec![]);
                }
                Ok(vec![EmittedAction {
                    action: Action::Update(DealUpdate { deal_id: deal.id.clone(), patch }),
                    license: Some(paid),
                    existing: Some(deal),
                }])
            }
        }
    }

    /// Purchase matching order: any license in the event (latest first),
    /// then the transaction's own id. The fallback catches purchase deals
    /// keyed only by transaction id with no surviving eval deal.
    fn match_purchase_deal(
        &self,
        group: &'a [LicenseContext],
        transaction: Option<&'a Transaction>,
    ) -> Option<&'a Deal> {
        let mut licenses: Vec<&License> = group.iter().map(|c| &c.license).collect();
        licenses.sort_by(|a, b| b.maintenance_start_date.cmp(&a.maintenance_start_date));
        for license in licenses {
            if let Some(deal) = self.finder.by_license(license) {
                return Some(deal);
            }
        }
        transaction.and_then(|t| self.finder.by_transaction_id(&t.transaction_id))
    }

    /// Renewals and upgrades: each is its own deal record, keyed by its
    /// transaction id. A re-run that finds the previously created deal
    /// refreshes it through the diff instead of duplicating it.
    fn paid_transaction(
        &self,
        group: &'a [LicenseContext],
        tx: &'a Transaction,
    ) -> Result<Vec<EmittedAction<'a>>, ReconError> {
        let license = owning_license(group, tx)?;
        let desired = properties::build_properties(
            self.config,
            license,
            &[tx],
            DealStage::ClosedWon,
            tx.vendor_amount_cents,
        )?;

        match self.finder.by_transaction_id(&tx.transaction_id) {
            None => Ok(vec![EmittedAction {
                action: Action::Create(DealCreate { properties: desired, contact_ids: vec![] }),
                license: Some(license),
                existing: None,
            }]),
            Some(deal) => {
                let patch = properties::diff_against(&deal.properties, &desired);
                if patch.is_empty() {
                    return Ok(vec![]);
                }
                Ok(vec![EmittedAction {
                    action: Action::Update(DealUpdate { deal_id: deal.id.clone(), patch }),
                    license: Some(license),
                    existing: Some(deal),
                }])
            }
        }
    }

    /// Close every deal the refunded transactions reference. Already-closed
    /// deals yield nothing, so replays are no-ops.
    fn refund(&self, transactions: &[&'a Transaction]) -> Vec<EmittedAction<'a>> {
        let mut out = Vec::new();
        for deal in self.finder.deals_for_transactions(transactions) {
            if self.config.pipeline.is(&deal.properties.dealstage, DealStage::ClosedLost) {
                continue;
            }
            let patch = DealPropertyPatch {
                dealstage: Some(self.config.pipeline.closed_lost.clone()),
                ..Default::default()
            };
            out.push(EmittedAction {
                action: Action::Update(DealUpdate { deal_id: deal.id.clone(), patch }),
                license: None,
                existing: Some(deal),
            });
        }
        out
    }
}

fn owning_license<'g>(
    group: &'g [LicenseContext],
    tx: &Transaction,
) -> Result<&'g License, ReconError> {
    group
        .iter()
        .find(|c| c.transactions.iter().any(|t| t.transaction_id == tx.transaction_id))
        .map(|c| &c.license)
        .ok_or_else(|| {
            ReconError::DataIntegrity(format!(
                "transaction '{}' has no owning license in its group",
                tx.transaction_id
            ))
        })
}
