pub mod amortization;
pub mod waterfall;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{LoanId, PaymentAllocation, PaymentMethod, TransactionId};

pub use amortization::{AmortizationSchedule, ScheduleEntry};
pub use waterfall::{allocate, apply_allocation};

/// incoming repayment request from the UI or CSV-import collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentRequest {
    pub loan_id: LoanId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: String,
}

/// whether a transaction is an original payment or an offsetting reversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Payment,
    Reversal,
}

/// repayment transaction, created exactly once per repayment event and never
/// mutated; a reversal is a new offsetting transaction, not an edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentTransaction {
    pub transaction_id: TransactionId,
    pub loan_id: LoanId,
    pub kind: TransactionKind,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: String,
    pub allocation: PaymentAllocation,
    pub recorded_at: DateTime<Utc>,
    /// set on reversals, pointing at the transaction being offset
    pub reverses: Option<TransactionId>,
}

impl RepaymentTransaction {
    /// record an original payment
    pub fn payment(
        request: &RepaymentRequest,
        allocation: PaymentAllocation,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            loan_id: request.loan_id,
            kind: TransactionKind::Payment,
            amount: request.amount,
            payment_date: request.payment_date,
            method: request.method.clone(),
            reference: request.reference.clone(),
            allocation,
            recorded_at,
            reverses: None,
        }
    }

    /// record an offsetting reversal of `original`
    pub fn reversal(
        original: &RepaymentTransaction,
        payment_date: NaiveDate,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            loan_id: original.loan_id,
            kind: TransactionKind::Reversal,
            amount: Money::ZERO - original.amount,
            payment_date,
            method: original.method.clone(),
            reference: format!("reversal-{}", original.reference),
            allocation: original.allocation.negated(),
            recorded_at,
            reverses: Some(original.transaction_id),
        }
    }
}
