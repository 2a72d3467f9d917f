use rust_decimal::Decimal;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("invalid term: {months} months")]
    InvalidTerm {
        months: i64,
    },

    #[error("term of {term_months} months does not divide into whole {cycle} periods")]
    InvalidCycle {
        term_months: u32,
        cycle: String,
    },

    #[error("over-allocation on {bucket}: outstanding {outstanding}, applied {applied}")]
    OverAllocation {
        bucket: String,
        outstanding: Money,
        applied: Money,
    },

    #[error("invalid IFRS 9 stage: {stage}")]
    InvalidStage {
        stage: u8,
    },

    #[error("invalid risk parameter {name}: {value}")]
    InvalidRiskParameter {
        name: String,
        value: Decimal,
    },

    #[error("no payment schedule for loan {loan_id}")]
    ScheduleNotFound {
        loan_id: LoanId,
    },

    #[error("loan not active: current status is {status:?}")]
    LoanNotActive {
        status: LoanStatus,
    },

    #[error("stale loan version: expected {expected}, actual {actual}")]
    StaleLoanVersion {
        expected: u64,
        actual: u64,
    },

    #[error("repayment transaction not found: {reference}")]
    TransactionNotFound {
        reference: String,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
