use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::days_overdue;
use crate::config::{ProvisionMatrix, StagingPolicy};
use crate::decimal::Money;
use crate::types::{Ifrs9Stage, LoanId, RegulatoryBucket};

/// derived risk classification as of an evaluation date; never mutated,
/// only superseded by a computation with a later evaluation date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskClassification {
    pub loan_id: LoanId,
    pub days_overdue: u32,
    pub stage: Ifrs9Stage,
    pub bucket: RegulatoryBucket,
    pub evaluation_date: NaiveDate,
}

/// classify a loan's delinquency at a point in time
///
/// The IFRS 9 stage and the regulatory bucket are mapped independently from
/// the same days-overdue figure; neither is derived from the other. A loan
/// with nothing outstanding is never classified, so this returns `None` for
/// a zero balance.
///
/// Pure function of its inputs: no storage reads, no clock, so it can be
/// evaluated at any historical date given the due date in force at that time.
pub fn classify(
    loan_id: LoanId,
    next_due_date: NaiveDate,
    evaluation_date: NaiveDate,
    outstanding_balance: Money,
    staging: &StagingPolicy,
    matrix: &ProvisionMatrix,
) -> Option<RiskClassification> {
    if !outstanding_balance.is_positive() {
        return None;
    }

    let days = days_overdue(next_due_date, evaluation_date);

    Some(RiskClassification {
        loan_id,
        days_overdue: days,
        stage: staging.stage_for(days),
        bucket: matrix.bucket_for(days),
        evaluation_date,
    })
}
