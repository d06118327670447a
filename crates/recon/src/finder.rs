use std::collections::HashMap;

use marketsync_core::{Deal, License, LicenseContext, Transaction};

use crate::error::ReconError;

/// Read-only index over the existing-deal snapshot, built once per run.
///
/// Two indexes, one per identifier type a record can carry: the deal's
/// stored license id and its stored transaction id. The snapshot arrives
/// deduplicated by the source-of-record, so index collisions cannot occur.
pub struct DealFinder<'a> {
    by_license_id: HashMap<&'a str, &'a Deal>,
    by_transaction_id: HashMap<&'a str, &'a Deal>,
}

impl<'a> DealFinder<'a> {
    pub fn new(deals: &'a [Deal]) -> Self {
        let mut by_license_id = HashMap::new();
        let mut by_transaction_id = HashMap::new();
        for deal in deals {
            if let Some(id) = deal.properties.addon_license_id.as_deref() {
                by_license_id.insert(id, deal);
            }
            if let Some(id) = deal.properties.transaction_id.as_deref() {
                by_transaction_id.insert(id, deal);
            }
        }
        Self { by_license_id, by_transaction_id }
    }

    /// Resolve a license through either of its identifiers.
    pub fn by_license(&self, license: &License) -> Option<&'a Deal> {
        self.by_license_id
            .get(license.addon_license_id.as_str())
            .copied()
            .or_else(|| {
                license
                    .license_id
                    .as_deref()
                    .and_then(|id| self.by_license_id.get(id).copied())
            })
    }

    pub fn by_transaction_id(&self, transaction_id: &str) -> Option<&'a Deal> {
        self.by_transaction_id.get(transaction_id).copied()
    }

    /// Resolve a transaction: its own id first, then the license it belongs
    /// to (a refund row references the deal only through its license).
    pub fn by_transaction(&self, tx: &Transaction) -> Option<&'a Deal> {
        self.by_transaction_id(&tx.transaction_id)
            .or_else(|| {
                self.by_license_id
                    .get(tx.addon_license_id.as_str())
                    .copied()
            })
            .or_else(|| {
                tx.license_id
                    .as_deref()
                    .and_then(|id| self.by_license_id.get(id).copied())
            })
    }

    /// The single deal referenced by any record in the group, or `None`.
    /// Two records resolving to *different* deals is a contract violation
    /// here; callers expecting fan-out use [`Self::deals_for_transactions`].
    pub fn deal_for_group(
        &self,
        group: &[LicenseContext],
    ) -> Result<Option<&'a Deal>, ReconError> {
        let mut found: Vec<&Deal> = Vec::new();
        for ctx in group {
            if let Some(deal) = self.by_license(&ctx.license) {
                push_distinct(&mut found, deal);
            }
            for tx in &ctx.transactions {
                if let Some(deal) = self.by_transaction(tx) {
                    push_distinct(&mut found, deal);
                }
            }
        }
        match found.len() {
            0 => Ok(None),
            1 => Ok(Some(found[0])),
            _ => Err(ReconError::AmbiguousDealMatch {
                deal_ids: found.iter().map(|d| d.id.clone()).collect(),
            }),
        }
    }

    /// Distinct deals referenced across a set of transactions, in first-seen
    /// order. One refund may map to several historical deals.
    pub fn deals_for_transactions(&self, transactions: &[&Transaction]) -> Vec<&'a Deal> {
        let mut found: Vec<&Deal> = Vec::new();
        for tx in transactions {
            if let Some(deal) = self.by_transaction(tx) {
                push_distinct(&mut found, deal);
            }
        }
        found
    }
}

fn push_distinct<'a>(found: &mut Vec<&'a Deal>, deal: &'a Deal) {
    if !found.iter().any(|d| d.id == deal.id) {
        found.push(deal);
    }
}
