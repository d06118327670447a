use serde::{Deserialize, Serialize};

use crate::license::License;
use crate::transaction::Transaction;

/// One license plus every transaction that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseContext {
    pub license: License,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// All records believed to belong to one continuous customer relationship
/// (an eval, its purchase, the renewals that followed), ordered by the
/// external matcher. Never empty by contract.
pub type RelatedLicenseSet = Vec<LicenseContext>;
