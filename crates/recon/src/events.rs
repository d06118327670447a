use marketsync_core::{License, LicenseContext, SaleType, Transaction};

use crate::error::ReconError;

/// One lifecycle event for a group with paid activity, in the order the
/// generator must see them: the purchase first, follow-on renewals and
/// upgrades next, refunds last.
#[derive(Debug)]
pub enum DealEvent<'a> {
    Purchase {
        /// Earliest non-free license in the group; its data drives the deal.
        paid: &'a License,
        /// First non-refund transaction by sale date. Carries the deal's
        /// price and its fallback identifier for matching.
        transaction: Option<&'a Transaction>,
        amount_cents: i64,
        /// The chronologically first license was free: an eval-to-paid
        /// conversion rather than a relationship that started paid.
        conversion: bool,
    },
    Renewal { transaction: &'a Transaction },
    Upgrade { transaction: &'a Transaction },
    Refund { transactions: Vec<&'a Transaction> },
}

/// Interpret one group with paid activity chronologically.
///
/// Callers have already taken the all-free branch off the table; a group
/// without any paid license here is an upstream matching bug.
pub fn events_for_group(group: &[LicenseContext]) -> Result<Vec<DealEvent<'_>>, ReconError> {
    if group.is_empty() {
        return Err(ReconError::EmptyGroup);
    }

    let mut licenses: Vec<&License> = group.iter().map(|c| &c.license).collect();
    licenses.sort_by_key(|l| l.maintenance_start_date);

    let conversion = licenses[0].is_free();
    let paid = licenses
        .iter()
        .find(|l| !l.is_free())
        .copied()
        .ok_or_else(|| {
            ReconError::DataIntegrity("paid-branch group has no paid license".into())
        })?;

    let mut non_refund: Vec<&Transaction> = group
        .iter()
        .flat_map(|c| &c.transactions)
        .filter(|t| !t.is_refund())
        .collect();
    non_refund.sort_by(|a, b| {
        (a.sale_date, &a.transaction_id).cmp(&(b.sale_date, &b.transaction_id))
    });

    // Price comes from the FIRST non-refund transaction, not the latest.
    let amount_cents = non_refund.first().map(|t| t.vendor_amount_cents).unwrap_or(0);

    let mut events = vec![DealEvent::Purchase {
        paid,
        transaction: non_refund.first().copied(),
        amount_cents,
        conversion,
    }];

    // Each follow-on renewal/upgrade is its own deal record. The first
    // transaction is already represented by the purchase event.
    for tx in non_refund.iter().skip(1) {
        match tx.sale_type {
            SaleType::Renewal => events.push(DealEvent::Renewal { transaction: tx }),
            SaleType::Upgrade => events.push(DealEvent::Upgrade { transaction: tx }),
            SaleType::New | SaleType::Refund => {}
        }
    }

    let mut refunded: Vec<&Transaction> = group
        .iter()
        .flat_map(|c| &c.transactions)
        .filter(|t| t.is_refund())
        .collect();
    refunded.sort_by(|a, b| {
        (a.sale_date, &a.transaction_id).cmp(&(b.sale_date, &b.transaction_id))
    });
    if !refunded.is_empty() {
        events.push(DealEvent::Refund { transactions: refunded });
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use marketsync_core::{ContactInfo, Hosting, LicenseStatus, LicenseType};

    fn license(id: &str, license_type: LicenseType, start: &str) -> License {
        License {
            addon_license_id: id.into(),
            license_id: None,
            addon_key: "com.example.addon".into(),
            license_type,
            status: LicenseStatus::Active,
            hosting: Hosting::Server,
            maintenance_start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            maintenance_end_date: None,
            tier: "50 Users".into(),
            country: "US".into(),
            technical_contact: ContactInfo { email: "a@corp.example".into(), name: None },
            billing_contact: None,
            partner_details: None,
            evaluation_opportunity_size: None,
        }
    }

    fn tx(id: &str, sale_type: SaleType, date: &str, cents: i64) -> Transaction {
        Transaction {
            transaction_id: id.into(),
            addon_license_id: "L2".into(),
            license_id: None,
            addon_key: "com.example.addon".into(),
            sale_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            sale_type,
            tier: "50 Users".into(),
            vendor_amount_cents: cents,
            purchase_price_cents: cents,
            billing_period: None,
        }
    }

    #[test]
    fn conversion_flag_follows_first_license() {
        let group = vec![
            LicenseContext {
                license: license("L1", LicenseType::Evaluation, "2026-01-01"),
                transactions: vec![],
            },
            LicenseContext {
                license: license("L2", LicenseType::Commercial, "2026-02-01"),
                transactions: vec![tx("AT-1", SaleType::New, "2026-02-01", 10000)],
            },
        ];
        let events = events_for_group(&group).unwrap();
        match &events[0] {
            DealEvent::Purchase { paid, amount_cents, conversion, .. } => {
                assert_eq!(paid.addon_license_id, "L2");
                assert_eq!(*amount_cents, 10000);
                assert!(*conversion);
            }
            other => panic!("expected purchase first, got {other:?}"),
        }
    }

    #[test]
    fn price_is_first_transaction_not_latest() {
        let group = vec![LicenseContext {
            license: license("L2", LicenseType::Commercial, "2026-01-01"),
            transactions: vec![
                tx("AT-2", SaleType::Renewal, "2027-01-01", 20000),
                tx("AT-1", SaleType::New, "2026-01-01", 10000),
            ],
        }];
        let events = events_for_group(&group).unwrap();
        match &events[0] {
            DealEvent::Purchase { transaction, amount_cents, conversion, .. } => {
                assert_eq!(transaction.unwrap().transaction_id, "AT-1");
                assert_eq!(*amount_cents, 10000);
                assert!(!*conversion);
            }
            other => panic!("expected purchase first, got {other:?}"),
        }
        // The renewal still gets its own event.
        assert!(matches!(
            events[1],
            DealEvent::Renewal { transaction } if transaction.transaction_id == "AT-2"
        ));
    }

    #[test]
    fn first_transaction_never_doubles_as_renewal() {
        let group = vec![LicenseContext {
            license: license("L2", LicenseType::Commercial, "2026-01-01"),
            transactions: vec![tx("AT-1", SaleType::Renewal, "2026-01-01", 15000)],
        }];
        let events = events_for_group(&group).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DealEvent::Purchase { .. }));
    }

    #[test]
    fn refunds_come_last() {
        let group = vec![LicenseContext {
            license: license("L2", LicenseType::Commercial, "2026-01-01"),
            transactions: vec![
                tx("AT-3", SaleType::Refund, "2026-03-01", -10000),
                tx("AT-1", SaleType::New, "2026-01-01", 10000),
            ],
        }];
        let events = events_for_group(&group).unwrap();
        assert_eq!(events.len(), 2);
        match &events[1] {
            DealEvent::Refund { transactions } => {
                assert_eq!(transactions.len(), 1);
                assert_eq!(transactions[0].transaction_id, "AT-3");
            }
            other => panic!("expected refund last, got {other:?}"),
        }
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(matches!(events_for_group(&[]), Err(ReconError::EmptyGroup)));
    }
}
