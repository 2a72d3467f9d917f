use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{Ifrs9Stage, LoanId, LoanStatus, RegulatoryBucket, TransactionId};

/// all events emitted by the engine; delivery is owned by an external collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanDisbursed {
        loan_id: LoanId,
        principal: Money,
        installments: u32,
        first_due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    LoanClosed {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },
    LoanWrittenOff {
        loan_id: LoanId,
        loss_amount: Money,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // repayment events
    InstallmentDue {
        loan_id: LoanId,
        installment_number: u32,
        due_date: NaiveDate,
        scheduled_principal: Money,
        scheduled_interest: Money,
    },
    RepaymentReceived {
        loan_id: LoanId,
        transaction_id: TransactionId,
        amount: Money,
        applied_to_penalties: Money,
        applied_to_fees: Money,
        applied_to_interest: Money,
        applied_to_principal: Money,
        timestamp: DateTime<Utc>,
    },
    ExcessPaymentReturned {
        loan_id: LoanId,
        transaction_id: TransactionId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    RepaymentReversed {
        loan_id: LoanId,
        original_transaction_id: TransactionId,
        reversal_transaction_id: TransactionId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // risk events
    StageChanged {
        loan_id: LoanId,
        old_stage: Option<Ifrs9Stage>,
        new_stage: Ifrs9Stage,
        days_overdue: u32,
        evaluation_date: NaiveDate,
    },
    EclCalculated {
        loan_id: LoanId,
        stage: Ifrs9Stage,
        exposure_at_default: Money,
        ecl_value: Money,
        timestamp: DateTime<Utc>,
    },
    ProvisionCalculated {
        loan_id: LoanId,
        bucket: RegulatoryBucket,
        provision_rate: Rate,
        provision_amount: Money,
        effective_date: NaiveDate,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
