use std::path::PathBuf;

use marketsync_core::money::format_cents;
use marketsync_core::{Deal, DealProperties, DealPropertyPatch};
use marketsync_recon::config::ReconConfig;
use marketsync_recon::engine::run;
use marketsync_recon::model::{ReconInput, ReconResult};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_input(name: &str) -> ReconInput {
    let path = fixtures_dir().join(name);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&data)
        .unwrap_or_else(|e| panic!("cannot parse {}: {e}", path.display()))
}

/// Replay the engine's action set onto the snapshot, the way the upload
/// collaborator would. Used by the idempotence tests.
fn apply(result: &ReconResult, input: &mut ReconInput) {
    for (i, create) in result.creates.iter().enumerate() {
        input.deals.push(Deal {
            id: format!("applied-{i}"),
            properties: create.properties.clone(),
            contact_ids: create.contact_ids.clone(),
        });
    }
    for update in &result.updates {
        let deal = input
            .deals
            .iter_mut()
            .find(|d| d.id == update.deal_id)
            .expect("update target exists in snapshot");
        apply_patch(&mut deal.properties, &update.patch);
    }
    for assoc in &result.associations_to_create {
        let deal = input.deals.iter_mut().find(|d| d.id == assoc.deal_id).unwrap();
        deal.contact_ids.push(assoc.contact_id.clone());
    }
    for assoc in &result.associations_to_remove {
        let deal = input.deals.iter_mut().find(|d| d.id == assoc.deal_id).unwrap();
        deal.contact_ids.retain(|id| id != &assoc.contact_id);
    }
}

fn apply_patch(props: &mut DealProperties, patch: &DealPropertyPatch) {
    if let Some(v) = &patch.addon_license_id {
        props.addon_license_id = Some(v.clone());
    }
    if let Some(v) = &patch.transaction_id {
        props.transaction_id = Some(v.clone());
    }
    if let Some(v) = patch.close_date {
        props.close_date = v;
    }
    if let Some(v) = &patch.deal_name {
        props.deal_name = v.clone();
    }
    if let Some(v) = &patch.dealstage {
        props.dealstage = v.clone();
    }
    if let Some(v) = &patch.pipeline {
        props.pipeline = v.clone();
    }
    if let Some(v) = patch.amount_cents {
        props.amount_cents = v;
    }
    if let Some(v) = &patch.country {
        props.country = v.clone();
    }
    if let Some(v) = &patch.origin {
        props.origin = v.clone();
    }
    if let Some(v) = &patch.related_products {
        props.related_products = v.clone();
    }
    if let Some(v) = &patch.app {
        props.app = v.clone();
    }
    if let Some(v) = patch.deployment {
        props.deployment = v;
    }
    if let Some(v) = patch.license_tier {
        props.license_tier = v;
    }
}

/// No generated update may move a deal into the eval stage.
fn assert_stage_monotonic(result: &ReconResult, config: &ReconConfig) {
    for update in &result.updates {
        assert_ne!(
            update.patch.dealstage.as_deref(),
            Some(config.pipeline.eval.as_str()),
            "update on '{}' regresses to eval",
            update.deal_id
        );
    }
}

// -------------------------------------------------------------------------
// Scenario A: fresh active eval
// -------------------------------------------------------------------------

#[test]
fn fresh_eval_creates_one_eval_deal() {
    let config = ReconConfig::default();
    let input = load_input("scenario-a.json");
    let result = run(&config, &input).unwrap();

    assert_eq!(result.summary.creates, 1);
    assert_eq!(result.summary.updates, 0);
    let create = &result.creates[0];
    assert_eq!(create.properties.dealstage, "evaluation");
    assert_eq!(format_cents(create.properties.amount_cents), "0.00");
    assert_eq!(create.properties.addon_license_id.as_deref(), Some("L1"));
    assert_eq!(create.contact_ids, vec!["77"]);
    assert_stage_monotonic(&result, &config);
}

#[test]
fn fresh_eval_is_idempotent_once_applied() {
    let config = ReconConfig::default();
    let mut input = load_input("scenario-a.json");
    let first = run(&config, &input).unwrap();
    apply(&first, &mut input);

    let second = run(&config, &input).unwrap();
    assert_eq!(second.summary.creates, 0);
    assert_eq!(second.summary.updates, 0);
    assert_eq!(second.summary.associations_created, 0);
    assert_eq!(second.summary.associations_removed, 0);
    assert_eq!(second.ignored[0].reason.to_string(), "eval-up-to-date");
}

// -------------------------------------------------------------------------
// Scenario B: eval-to-paid conversion
// -------------------------------------------------------------------------

#[test]
fn conversion_updates_the_eval_deal_to_closed_won() {
    let config = ReconConfig::default();
    let input = load_input("scenario-b.json");
    let result = run(&config, &input).unwrap();

    assert_eq!(result.summary.creates, 0);
    assert_eq!(result.summary.updates, 1);
    let update = &result.updates[0];
    assert_eq!(update.deal_id, "d-1");
    assert_eq!(update.patch.dealstage.as_deref(), Some("closedwon"));
    assert_eq!(format_cents(update.patch.amount_cents.unwrap()), "100.00");
    // Identifying fields move to the paid license and its transaction.
    assert_eq!(update.patch.addon_license_id.as_deref(), Some("L2"));
    assert_eq!(update.patch.transaction_id.as_deref(), Some("AT-1"));
    assert_stage_monotonic(&result, &config);
}

#[test]
fn conversion_is_idempotent_once_applied() {
    let config = ReconConfig::default();
    let mut input = load_input("scenario-b.json");
    let first = run(&config, &input).unwrap();
    apply(&first, &mut input);

    let second = run(&config, &input).unwrap();
    assert_eq!(second.summary.creates, 0);
    assert_eq!(second.summary.updates, 0);
    assert_eq!(second.summary.associations_created, 0);
    assert_eq!(second.summary.associations_removed, 0);
}

// -------------------------------------------------------------------------
// Scenario C: refund closes, never reopens
// -------------------------------------------------------------------------

#[test]
fn refund_closes_the_deal_without_touching_the_amount() {
    let config = ReconConfig::default();
    let input = load_input("scenario-c.json");
    let result = run(&config, &input).unwrap();

    assert_eq!(result.summary.creates, 0);
    assert_eq!(result.summary.updates, 1);
    let update = &result.updates[0];
    assert_eq!(update.deal_id, "d-9");
    assert_eq!(update.patch.dealstage.as_deref(), Some("closedlost"));
    assert!(update.patch.amount_cents.is_none());
    assert_stage_monotonic(&result, &config);
}

#[test]
fn refund_on_closed_lost_deal_yields_nothing() {
    let config = ReconConfig::default();
    let mut input = load_input("scenario-c.json");
    let first = run(&config, &input).unwrap();
    apply(&first, &mut input);

    let second = run(&config, &input).unwrap();
    assert_eq!(second.summary.creates, 0);
    assert_eq!(second.summary.updates, 0);
}

// -------------------------------------------------------------------------
// Scenario D: domain exclusion
// -------------------------------------------------------------------------

#[test]
fn excluded_partner_domains_produce_only_an_audit_entry() {
    let config = ReconConfig::from_toml(
        r#"
name = "Marketplace -> CRM"

[pipeline]
id = "default"
eval = "evaluation"
closed_won = "closedwon"
closed_lost = "closedlost"

[exclusions]
partner_domains = ["partner.example"]
"#,
    )
    .unwrap();
    let input = load_input("scenario-d.json");
    let result = run(&config, &input).unwrap();

    assert_eq!(result.summary.creates, 0);
    assert_eq!(result.summary.updates, 0);
    assert_eq!(result.summary.associations_created, 0);
    assert_eq!(result.summary.associations_removed, 0);
    assert_eq!(result.ignored.len(), 1);
    assert_eq!(result.ignored[0].reason.to_string(), "bad-domains:partner.example");
    assert_eq!(result.summary.ignored_by_reason["bad-domains"], 1);
}

// -------------------------------------------------------------------------
// Inspection handoff
// -------------------------------------------------------------------------

#[test]
fn result_round_trips_through_inspection_file() {
    let config = ReconConfig::default();
    let input = load_input("scenario-a.json");
    let result = run(&config, &input).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recon-result.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&result).unwrap()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["summary"]["creates"], 1);
    assert_eq!(value["creates"][0]["properties"]["amount"], 0.0);
    assert_eq!(value["creates"][0]["properties"]["dealstage"], "evaluation");
    assert!(value["meta"]["engine_version"].is_string());
    assert!(value["meta"]["run_at"].is_string());
}
