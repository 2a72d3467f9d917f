/// loan lifecycle - disbursement, repayments, delinquency, staging and
/// point-in-time recalculation with deterministic time
use chrono::{NaiveDate, TimeZone, Utc};
use loan_engine_rs::{
    ChargeKind, EclHistory, EngineConfig, Loan, LoanTerms, Money, PaymentMethod, Rate,
    RecalculationService, RepaymentCycle, RepaymentRequest, RiskParameters, SafeTimeProvider,
    TimeSource, Uuid,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== loan lifecycle example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));

    // disburse a 12-month loan at 12% per annum
    let terms = LoanTerms {
        principal: Money::from_major(100_000),
        annual_rate: Rate::from_percentage(12),
        term_months: 12,
        cycle: RepaymentCycle::Monthly,
        disbursement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    let mut loan = Loan::disburse(Uuid::new_v4(), terms, &time)?;

    println!("disbursed: {}", Money::from_major(100_000));
    for entry in &loan.schedule.entries[..3] {
        println!(
            "  installment {}: {} due {} (interest {}, principal {})",
            entry.installment_number,
            entry.scheduled_total,
            entry.due_date,
            entry.scheduled_interest,
            entry.scheduled_principal,
        );
    }
    println!("  ...\n");

    // pay the first installment on time
    let installment = loan.schedule.entries[0].scheduled_total;
    let request = RepaymentRequest {
        loan_id: loan.id,
        amount: installment,
        payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        method: PaymentMethod::BankTransfer,
        reference: "rcpt-001".to_string(),
    };
    let version = loan.state.version;
    let txn = loan.apply_repayment(&request, version, &time)?;
    println!("payment {} applied:", txn.reference);
    println!("  to interest:  {}", txn.allocation.to_interest);
    println!("  to principal: {}", txn.allocation.to_principal);
    println!("  outstanding:  {}\n", loan.total_outstanding());

    // the borrower misses march and april; a penalty is assessed
    loan.charge(
        ChargeKind::Penalty,
        Money::from_major(250),
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        "late payment",
    )?;
    loan.roll_due(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
    println!("after two missed installments:");
    println!("  status:       {:?}", loan.state.status);
    println!(
        "  days overdue: {}",
        loan.days_overdue_as_of(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap())
    );

    // classification, ECL and regulatory provision as of today
    let config = EngineConfig::default();
    let service = RecalculationService::new(config);
    let params = RiskParameters {
        probability_of_default: Rate::from_decimal(dec!(0.08)),
        loss_given_default: Rate::from_decimal(dec!(0.45)),
    };

    let mut history = EclHistory::new();
    let assessment = service
        .recompute_as_of(
            &loan,
            params,
            NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            &time,
        )?
        .expect("loan has an outstanding balance");

    println!("  IFRS 9 stage: {:?}", assessment.classification.stage);
    println!("  BoZ bucket:   {:?}", assessment.classification.bucket);
    println!("  ECL:          {}", assessment.ecl.ecl_value);
    println!("  provision:    {}\n", assessment.provision.provision_amount);
    history.append(assessment.ecl);

    // a point-in-time query replays the transaction history: back in
    // february the loan was current and carried a 12-month PD
    let february = service
        .recompute_as_of(
            &loan,
            params,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            &time,
        )?
        .expect("loan was outstanding in february");
    println!("as of 2024-02-01 (replayed):");
    println!("  IFRS 9 stage: {:?}", february.classification.stage);
    println!("  PD horizon:   {:?}", february.ecl.pd_horizon);
    println!("  ECL:          {}", february.ecl.ecl_value);

    Ok(())
}
