//! `marketsync-recon` — Marketplace→CRM deal reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded snapshots (related-record groups,
//! existing deals, contact directory), returns the minimal idempotent set of
//! mutation actions. No network or disk IO.

pub mod actions;
pub mod audit;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod finder;
pub mod model;
pub mod properties;
pub mod tier;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{ReconInput, ReconResult};
