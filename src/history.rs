use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::loan::{Charge, Loan};
use crate::payments::{RepaymentRequest, TransactionKind};
use crate::risk::{EclResult, ProvisionResult, RiskAssessment, RiskParameters};
use crate::types::LoanId;

/// append-only store of ECL calculation records
///
/// Records are never mutated or deleted; a newer calculation supersedes an
/// older one only through the as-of query.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EclHistory {
    records: Vec<EclResult>,
}

impl EclHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: EclResult) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EclResult] {
        &self.records
    }

    /// latest record for the loan with calculation timestamp <= `as_of`
    pub fn as_of(&self, loan_id: LoanId, as_of: DateTime<Utc>) -> Option<&EclResult> {
        self.records
            .iter()
            .filter(|r| r.loan_id == loan_id && r.calculated_at <= as_of)
            .max_by_key(|r| r.calculated_at)
    }
}

/// append-only store of regulatory provision records, same as-of semantics
/// as the ECL history
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProvisionHistory {
    records: Vec<ProvisionResult>,
}

impl ProvisionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ProvisionResult) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ProvisionResult] {
        &self.records
    }

    /// latest record for the loan effective on or before `as_of`
    pub fn as_of(&self, loan_id: LoanId, as_of: NaiveDate) -> Option<&ProvisionResult> {
        self.records
            .iter()
            .filter(|r| r.loan_id == loan_id && r.effective_date <= as_of)
            .max_by_key(|r| r.effective_date)
    }
}

/// point-in-time recalculation service
///
/// The stored histories answer "nearest snapshot at or before T"; the live
/// path reconstructs the loan's state as of T from the charge and repayment
/// history and re-runs classification, ECL and provisioning. The live path
/// is the authoritative definition of "ECL at a point in time".
pub struct RecalculationService {
    config: EngineConfig,
}

impl RecalculationService {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// rebuild the loan as it stood at end of day `as_of`, replaying the
    /// charges and repayment transactions dated on or before that day
    /// against a fresh disbursement
    pub fn reconstruct_as_of(
        &self,
        loan: &Loan,
        as_of: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        let mut replica = Loan::disburse(loan.id, loan.terms.clone(), time_provider)?;

        for item in replay_items(loan, as_of) {
            match item {
                ReplayItem::Charge(charge) => {
                    replica.charge(charge.kind, charge.amount, charge.charged_on, &charge.reason)?;
                }
                ReplayItem::Payment(request) => {
                    let version = replica.state.version;
                    replica.apply_repayment(&request, version, time_provider)?;
                }
                ReplayItem::Reversal { reference, date } => {
                    replica.reverse_repayment(&reference, date, time_provider)?;
                }
            }
        }

        replica.roll_due(as_of);
        replica.events.clear();
        Ok(replica)
    }

    /// live recomputation of classification, ECL and provision as of a date
    ///
    /// Returns `None` when the loan had nothing outstanding at that date
    /// (a settled loan is never classified).
    pub fn recompute_as_of(
        &self,
        loan: &Loan,
        params: RiskParameters,
        as_of: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<RiskAssessment>> {
        let mut replica = self.reconstruct_as_of(loan, as_of, time_provider)?;

        if !replica.state.status.is_classifiable() {
            return Ok(None);
        }

        replica.assess_risk(as_of, params, &self.config, time_provider)
    }
}

enum ReplayItem {
    Charge(Charge),
    Payment(RepaymentRequest),
    Reversal { reference: String, date: NaiveDate },
}

/// charges and transactions dated on or before `as_of`, in posting order;
/// charges assessed on a day replay before that day's payments
fn replay_items(loan: &Loan, as_of: NaiveDate) -> Vec<ReplayItem> {
    let mut items: Vec<(NaiveDate, u8, usize, ReplayItem)> = Vec::new();

    for (seq, charge) in loan.charges.iter().enumerate() {
        if charge.charged_on <= as_of {
            items.push((charge.charged_on, 0, seq, ReplayItem::Charge(charge.clone())));
        }
    }

    for (seq, txn) in loan.transactions.iter().enumerate() {
        if txn.payment_date > as_of {
            continue;
        }
        let item = match txn.kind {
            TransactionKind::Payment => ReplayItem::Payment(RepaymentRequest {
                loan_id: txn.loan_id,
                amount: txn.amount,
                payment_date: txn.payment_date,
                method: txn.method.clone(),
                reference: txn.reference.clone(),
            }),
            TransactionKind::Reversal => {
                let original_reference = txn
                    .reverses
                    .and_then(|id| {
                        loan.transactions
                            .iter()
                            .find(|t| t.transaction_id == id)
                            .map(|t| t.reference.clone())
                    })
                    .unwrap_or_else(|| txn.reference.clone());
                ReplayItem::Reversal {
                    reference: original_reference,
                    date: txn.payment_date,
                }
            }
        };
        items.push((txn.payment_date, 1, seq, item));
    }

    items.sort_by_key(|(date, kind, seq, _)| (*date, *kind, *seq));
    items.into_iter().map(|(_, _, _, item)| item).collect()
}
