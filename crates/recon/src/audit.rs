use std::collections::HashMap;

use crate::model::{Association, DealCreate, DealUpdate, IgnoredGroup, ReconSummary};

/// Compute run statistics from the final action set.
pub fn compute_summary(
    groups_total: usize,
    creates: &[DealCreate],
    updates: &[DealUpdate],
    associations_to_create: &[Association],
    associations_to_remove: &[Association],
    ignored: &[IgnoredGroup],
) -> ReconSummary {
    let mut ignored_by_reason: HashMap<String, usize> = HashMap::new();
    for entry in ignored {
        *ignored_by_reason
            .entry(entry.reason.tag().to_string())
            .or_insert(0) += 1;
    }

    ReconSummary {
        groups_total,
        creates: creates.len(),
        updates: updates.len(),
        associations_created: associations_to_create.len(),
        associations_removed: associations_to_remove.len(),
        ignored: ignored.len(),
        ignored_by_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IgnoreReason;

    #[test]
    fn buckets_ignores_by_tag() {
        let ignored = vec![
            IgnoredGroup {
                reason: IgnoreReason::BadDomains(vec!["gmail.com".into()]),
                addon_license_ids: vec!["L1".into()],
            },
            IgnoredGroup {
                reason: IgnoreReason::BadDomains(vec!["reseller.example".into()]),
                addon_license_ids: vec!["L2".into()],
            },
            IgnoredGroup {
                reason: IgnoreReason::InactiveEvals,
                addon_license_ids: vec!["L3".into()],
            },
        ];
        let summary = compute_summary(5, &[], &[], &[], &[], &ignored);
        assert_eq!(summary.groups_total, 5);
        assert_eq!(summary.ignored, 3);
        assert_eq!(summary.ignored_by_reason["bad-domains"], 2);
        assert_eq!(summary.ignored_by_reason["inactive-evals"], 1);
        assert_eq!(summary.creates, 0);
    }
}
