//! `marketsync-core` — Domain records shared by the engine and its collaborators.
//!
//! Immutable snapshot types: marketplace licenses/transactions as the feed
//! delivers them, CRM deals/contacts as the download collaborator delivers
//! them. No reconciliation logic lives here.

pub mod contact;
pub mod deal;
pub mod group;
pub mod license;
pub mod money;
pub mod transaction;

pub use contact::ContactDirectory;
pub use deal::{Deal, DealProperties, DealPropertyPatch, DealStage};
pub use group::{LicenseContext, RelatedLicenseSet};
pub use license::{ContactInfo, Hosting, License, LicenseStatus, LicenseType, PartnerDetails};
pub use transaction::{BillingPeriod, SaleType, Transaction};
