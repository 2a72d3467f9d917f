use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::add_months;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::{LoanId, RepaymentCycle};

/// one installment of the amortization schedule, immutable once generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub scheduled_principal: Money,
    pub scheduled_interest: Money,
    pub scheduled_total: Money,
    pub outstanding_after: Money,
}

/// reducing-balance amortization schedule, generated once at disbursement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub loan_id: LoanId,
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub cycle: RepaymentCycle,
    pub start_date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the original payment schedule
    ///
    /// Pure: identical inputs always produce an identical schedule. The
    /// final installment absorbs the rounding remainder so the scheduled
    /// principal portions sum to the original principal to the cent and the
    /// last outstanding-after is exactly zero.
    pub fn generate(
        loan_id: LoanId,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        cycle: RepaymentCycle,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if !principal.is_positive() {
            return Err(EngineError::InvalidAmount { amount: principal });
        }
        if term_months == 0 {
            return Err(EngineError::InvalidTerm { months: 0 });
        }
        if term_months % cycle.months() != 0 {
            return Err(EngineError::InvalidCycle {
                term_months,
                cycle: cycle.to_string(),
            });
        }

        let installments = term_months / cycle.months();
        let periodic_rate = annual_rate.periodic_rate(cycle.periods_per_year());
        let installment_amount = annuity_installment(principal, periodic_rate, installments);

        let mut entries = Vec::with_capacity(installments as usize);
        let mut balance = principal;

        for i in 1..=installments {
            let due_date = add_months(start_date, i * cycle.months());
            let interest = Money::from_decimal(balance.as_decimal() * periodic_rate.as_decimal());

            let principal_portion = if i == installments {
                // final installment absorbs the rounding remainder
                balance
            } else {
                (installment_amount - interest).min(balance)
            };

            let outstanding_after = balance - principal_portion;

            entries.push(ScheduleEntry {
                installment_number: i,
                due_date,
                scheduled_principal: principal_portion,
                scheduled_interest: interest,
                scheduled_total: principal_portion + interest,
                outstanding_after,
            });

            balance = outstanding_after;
        }

        let total_interest = entries
            .iter()
            .map(|e| e.scheduled_interest)
            .fold(Money::ZERO, |acc, x| acc + x);

        let total_payment = entries
            .iter()
            .map(|e| e.scheduled_total)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            loan_id,
            principal,
            annual_rate,
            term_months,
            cycle,
            start_date,
            entries,
            total_interest,
            total_payment,
        })
    }

    /// number of installments
    pub fn installments(&self) -> u32 {
        self.entries.len() as u32
    }

    /// get a specific installment (1-based)
    pub fn entry(&self, installment_number: u32) -> Option<&ScheduleEntry> {
        self.entries.get(installment_number.checked_sub(1)? as usize)
    }

    /// remaining scheduled balance after an installment (1-based, 0 = none paid)
    pub fn balance_after(&self, installment_number: u32) -> Money {
        if installment_number == 0 {
            return self.principal;
        }
        self.entry(installment_number)
            .map(|e| e.outstanding_after)
            .unwrap_or(Money::ZERO)
    }

    /// first due date of the schedule
    pub fn first_due_date(&self) -> NaiveDate {
        self.entries[0].due_date
    }

    /// due date of the first installment not yet rolled, given how many have fallen due
    pub fn due_date_after(&self, installments_rolled: u32) -> Option<NaiveDate> {
        self.entry(installments_rolled + 1).map(|e| e.due_date)
    }
}

/// fixed installment from the standard annuity formula,
/// P * r * (1 + r)^n / ((1 + r)^n - 1)
fn annuity_installment(principal: Money, periodic_rate: Rate, installments: u32) -> Money {
    let r = periodic_rate.as_decimal();

    if r.is_zero() {
        return principal / Decimal::from(installments);
    }

    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + r;
    for _ in 0..installments {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn monthly_schedule(principal: Money, rate: Rate, term: u32) -> AmortizationSchedule {
        AmortizationSchedule::generate(
            Uuid::new_v4(),
            principal,
            rate,
            term,
            RepaymentCycle::Monthly,
            d(2024, 1, 1),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_has_term_entries_and_zero_final_balance() {
        let schedule = monthly_schedule(Money::from_major(100_000), Rate::from_percentage(12), 12);

        assert_eq!(schedule.installments(), 12);
        assert_eq!(schedule.entries.last().unwrap().outstanding_after, Money::ZERO);
        assert_eq!(schedule.balance_after(12), Money::ZERO);
        assert_eq!(schedule.balance_after(0), Money::from_major(100_000));
    }

    #[test]
    fn test_principal_portions_sum_exactly_to_principal() {
        for (principal, rate, term) in [
            (Money::from_major(100_000), Rate::from_percentage(12), 12),
            (Money::from_major(7), Rate::from_percentage(37), 36),
            (Money::from_str_exact("999.99").unwrap(), Rate::from_percentage(5), 24),
            (Money::from_major(50_000), Rate::ZERO, 60),
        ] {
            let schedule = monthly_schedule(principal, rate, term);
            let total_principal = schedule
                .entries
                .iter()
                .map(|e| e.scheduled_principal)
                .fold(Money::ZERO, |acc, x| acc + x);
            assert_eq!(total_principal, principal);
        }
    }

    #[test]
    fn test_balance_decreases_monotonically() {
        let schedule = monthly_schedule(Money::from_major(100_000), Rate::from_percentage(24), 24);

        let mut previous = schedule.principal;
        for entry in &schedule.entries {
            assert!(entry.outstanding_after < previous);
            assert!(!entry.outstanding_after.is_negative());
            previous = entry.outstanding_after;
        }
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let schedule = monthly_schedule(Money::from_major(12_000), Rate::ZERO, 12);

        for entry in &schedule.entries {
            assert_eq!(entry.scheduled_interest, Money::ZERO);
            assert_eq!(entry.scheduled_principal, Money::from_major(1_000));
        }
        assert_eq!(schedule.total_interest, Money::ZERO);
        assert_eq!(schedule.total_payment, Money::from_major(12_000));
    }

    #[test]
    fn test_zero_rate_remainder_goes_to_final_installment() {
        let schedule = monthly_schedule(Money::from_major(100), Rate::ZERO, 3);

        // 100 / 3 = 33.33, final picks up the spare cent
        assert_eq!(schedule.entries[0].scheduled_principal, Money::from_str_exact("33.33").unwrap());
        assert_eq!(schedule.entries[1].scheduled_principal, Money::from_str_exact("33.33").unwrap());
        assert_eq!(schedule.entries[2].scheduled_principal, Money::from_str_exact("33.34").unwrap());
        assert_eq!(schedule.entries[2].outstanding_after, Money::ZERO);
    }

    #[test]
    fn test_first_installment_split_matches_annuity() {
        // 100k at 12% over 12 months: EMI 8884.88, first interest 1000.00
        let schedule = monthly_schedule(Money::from_major(100_000), Rate::from_percentage(12), 12);

        let first = &schedule.entries[0];
        assert_eq!(first.scheduled_interest, Money::from_major(1_000));
        assert_eq!(first.scheduled_total, Money::from_str_exact("8884.88").unwrap());
        assert_eq!(first.scheduled_principal, Money::from_str_exact("7884.88").unwrap());
    }

    #[test]
    fn test_quarterly_cycle() {
        let schedule = AmortizationSchedule::generate(
            Uuid::new_v4(),
            Money::from_major(10_000),
            Rate::from_percentage(8),
            24,
            RepaymentCycle::Quarterly,
            d(2024, 1, 31),
        )
        .unwrap();

        assert_eq!(schedule.installments(), 8);
        assert_eq!(schedule.entries[0].due_date, d(2024, 4, 30));
        assert_eq!(schedule.entries[1].due_date, d(2024, 7, 31));
        // quarterly periodic rate is 2%
        assert_eq!(schedule.entries[0].scheduled_interest, Money::from_major(200));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let loan_id = Uuid::new_v4();
        let start = d(2024, 1, 1);

        assert!(matches!(
            AmortizationSchedule::generate(
                loan_id,
                Money::ZERO,
                Rate::from_percentage(10),
                12,
                RepaymentCycle::Monthly,
                start,
            ),
            Err(EngineError::InvalidAmount { .. })
        ));

        assert!(matches!(
            AmortizationSchedule::generate(
                loan_id,
                Money::from_major(1_000),
                Rate::from_percentage(10),
                0,
                RepaymentCycle::Monthly,
                start,
            ),
            Err(EngineError::InvalidTerm { months: 0 })
        ));

        assert!(matches!(
            AmortizationSchedule::generate(
                loan_id,
                Money::from_major(1_000),
                Rate::from_percentage(10),
                14,
                RepaymentCycle::Quarterly,
                start,
            ),
            Err(EngineError::InvalidCycle { .. })
        ));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let loan_id = Uuid::new_v4();
        let make = || {
            AmortizationSchedule::generate(
                loan_id,
                Money::from_major(25_000),
                Rate::from_percentage(18),
                36,
                RepaymentCycle::Monthly,
                d(2024, 3, 15),
            )
            .unwrap()
        };

        let a = make();
        let b = make();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
