use std::collections::HashSet;

use log::info;

use crate::audit::compute_summary;
use crate::classify::GroupClassifier;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::finder::DealFinder;
use crate::model::{Action, ReconInput, ReconMeta, ReconResult};

/// Run reconciliation over one consistent snapshot.
///
/// Pure and deterministic: no interior state survives the call, so re-runs
/// and replays are safe. The second run over an already-applied action set
/// produces zero creates and zero updates.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let finder = DealFinder::new(&input.deals);
    let classifier = GroupClassifier::new(config, &finder, &input.contacts);

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut associations_to_create = Vec::new();
    let mut associations_to_remove = Vec::new();
    let mut ignored = Vec::new();

    for group in &input.groups {
        let outcome = classifier.classify(group)?;
        for action in outcome.actions {
            match action {
                Action::Create(create) => creates.push(create),
                Action::Update(update) => updates.push(update),
            }
        }
        associations_to_create.extend(outcome.associations_to_create);
        associations_to_remove.extend(outcome.associations_to_remove);
        ignored.extend(outcome.ignored);
    }

    // Every update must point into the snapshot we were given; anything else
    // is a snapshot-consistency bug upstream.
    let known: HashSet<&str> = input.deals.iter().map(|d| d.id.as_str()).collect();
    for update in &updates {
        if !known.contains(update.deal_id.as_str()) {
            return Err(ReconError::UnknownDeal(update.deal_id.clone()));
        }
    }

    let summary = compute_summary(
        input.groups.len(),
        &creates,
        &updates,
        &associations_to_create,
        &associations_to_remove,
        &ignored,
    );
    info!(
        "reconciled {} group(s): {} create(s), {} update(s), {} ignored",
        summary.groups_total, summary.creates, summary.updates, summary.ignored
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        creates,
        updates,
        associations_to_create,
        associations_to_remove,
        ignored,
    })
}
