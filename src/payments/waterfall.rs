use crate::decimal::Money;
use crate::errors::{EngineError, Result};
use crate::types::{OutstandingBuckets, PaymentAllocation};

/// split an incoming payment across the outstanding buckets
///
/// The waterfall order is fixed and non-configurable: penalties, then fees,
/// then interest, then principal. Each bucket absorbs at most its outstanding
/// amount; anything left after principal is returned as `excess` for the
/// caller to refund or carry forward, never force-applied.
///
/// Pure function of its inputs: no clock reads, no hidden state, idempotent
/// for a given snapshot of the buckets.
pub fn allocate(amount: Money, outstanding: &OutstandingBuckets) -> Result<PaymentAllocation> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount { amount });
    }
    validate_buckets(outstanding)?;

    let mut remaining = amount;
    let mut allocation = PaymentAllocation::default();

    let order: [(Money, &mut Money); 4] = [
        (outstanding.penalties, &mut allocation.to_penalties),
        (outstanding.fees, &mut allocation.to_fees),
        (outstanding.interest, &mut allocation.to_interest),
        (outstanding.principal, &mut allocation.to_principal),
    ];

    for (bucket_outstanding, applied) in order {
        let portion = remaining.min(bucket_outstanding);
        *applied = portion;
        remaining -= portion;

        if remaining.is_zero() {
            break;
        }
    }

    allocation.excess = remaining;
    Ok(allocation)
}

/// apply an allocation to the buckets, failing before any mutation if a
/// component exceeds its bucket
pub fn apply_allocation(
    outstanding: &OutstandingBuckets,
    allocation: &PaymentAllocation,
) -> Result<OutstandingBuckets> {
    check_component("penalties", outstanding.penalties, allocation.to_penalties)?;
    check_component("fees", outstanding.fees, allocation.to_fees)?;
    check_component("interest", outstanding.interest, allocation.to_interest)?;
    check_component("principal", outstanding.principal, allocation.to_principal)?;

    Ok(OutstandingBuckets {
        penalties: outstanding.penalties - allocation.to_penalties,
        fees: outstanding.fees - allocation.to_fees,
        interest: outstanding.interest - allocation.to_interest,
        principal: outstanding.principal - allocation.to_principal,
    })
}

fn validate_buckets(outstanding: &OutstandingBuckets) -> Result<()> {
    for (bucket, balance) in [
        ("penalties", outstanding.penalties),
        ("fees", outstanding.fees),
        ("interest", outstanding.interest),
        ("principal", outstanding.principal),
    ] {
        if balance.is_negative() {
            return Err(EngineError::OverAllocation {
                bucket: bucket.to_string(),
                outstanding: balance,
                applied: Money::ZERO,
            });
        }
    }
    Ok(())
}

fn check_component(bucket: &str, outstanding: Money, applied: Money) -> Result<()> {
    if applied > outstanding {
        return Err(EngineError::OverAllocation {
            bucket: bucket.to_string(),
            outstanding,
            applied,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(penalties: i64, fees: i64, interest: i64, principal: i64) -> OutstandingBuckets {
        OutstandingBuckets {
            penalties: Money::from_major(penalties),
            fees: Money::from_major(fees),
            interest: Money::from_major(interest),
            principal: Money::from_major(principal),
        }
    }

    #[test]
    fn test_waterfall_order() {
        // penalty 10, interest 50, principal 200 outstanding; payment of 35
        let outstanding = buckets(10, 0, 50, 200);
        let allocation = allocate(Money::from_major(35), &outstanding).unwrap();

        assert_eq!(allocation.to_penalties, Money::from_major(10));
        assert_eq!(allocation.to_fees, Money::ZERO);
        assert_eq!(allocation.to_interest, Money::from_major(25));
        assert_eq!(allocation.to_principal, Money::ZERO);
        assert_eq!(allocation.excess, Money::ZERO);
    }

    #[test]
    fn test_fees_sit_between_penalties_and_interest() {
        let outstanding = buckets(10, 20, 50, 200);
        let allocation = allocate(Money::from_major(40), &outstanding).unwrap();

        assert_eq!(allocation.to_penalties, Money::from_major(10));
        assert_eq!(allocation.to_fees, Money::from_major(20));
        assert_eq!(allocation.to_interest, Money::from_major(10));
        assert_eq!(allocation.to_principal, Money::ZERO);
    }

    #[test]
    fn test_excess_is_returned_not_applied() {
        let outstanding = buckets(10, 5, 50, 200);
        let allocation = allocate(Money::from_major(300), &outstanding).unwrap();

        assert_eq!(allocation.to_penalties, Money::from_major(10));
        assert_eq!(allocation.to_fees, Money::from_major(5));
        assert_eq!(allocation.to_interest, Money::from_major(50));
        assert_eq!(allocation.to_principal, Money::from_major(200));
        assert_eq!(allocation.excess, Money::from_major(35));
    }

    #[test]
    fn test_conservation_and_bucket_caps() {
        let cases = [
            (buckets(10, 0, 50, 200), Money::from_major(35)),
            (buckets(0, 0, 0, 1_000), Money::from_str_exact("999.99").unwrap()),
            (buckets(3, 7, 11, 13), Money::from_major(100)),
            (buckets(25, 13, 101, 9_999), Money::from_str_exact("0.01").unwrap()),
        ];

        for (outstanding, amount) in cases {
            let allocation = allocate(amount, &outstanding).unwrap();

            assert_eq!(allocation.total_applied() + allocation.excess, amount);
            assert!(allocation.to_penalties <= outstanding.penalties);
            assert!(allocation.to_fees <= outstanding.fees);
            assert!(allocation.to_interest <= outstanding.interest);
            assert!(allocation.to_principal <= outstanding.principal);
        }
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let outstanding = buckets(12, 4, 88, 5_000);
        let amount = Money::from_str_exact("104.50").unwrap();

        let first = allocate(amount, &outstanding).unwrap();
        let second = allocate(amount, &outstanding).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        let outstanding = buckets(0, 0, 10, 100);

        assert!(matches!(
            allocate(Money::ZERO, &outstanding),
            Err(EngineError::InvalidAmount { .. })
        ));
        assert!(matches!(
            allocate(Money::ZERO - Money::from_major(5), &outstanding),
            Err(EngineError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_negative_bucket_is_a_caller_bug() {
        let outstanding = OutstandingBuckets {
            penalties: Money::ZERO,
            fees: Money::ZERO,
            interest: Money::ZERO - Money::from_major(1),
            principal: Money::from_major(100),
        };

        assert!(matches!(
            allocate(Money::from_major(10), &outstanding),
            Err(EngineError::OverAllocation { .. })
        ));
    }

    #[test]
    fn test_apply_allocation_decrements_buckets() {
        let outstanding = buckets(10, 0, 50, 200);
        let allocation = allocate(Money::from_major(35), &outstanding).unwrap();
        let updated = apply_allocation(&outstanding, &allocation).unwrap();

        assert_eq!(updated.penalties, Money::ZERO);
        assert_eq!(updated.interest, Money::from_major(25));
        assert_eq!(updated.principal, Money::from_major(200));
        assert_eq!(updated.total(), outstanding.total() - Money::from_major(35));
    }

    #[test]
    fn test_apply_allocation_rejects_overdraw() {
        let outstanding = buckets(0, 0, 10, 100);
        let over = PaymentAllocation {
            to_interest: Money::from_major(11),
            ..Default::default()
        };

        assert!(matches!(
            apply_allocation(&outstanding, &over),
            Err(EngineError::OverAllocation { bucket, .. }) if bucket == "interest"
        ));
    }
}
