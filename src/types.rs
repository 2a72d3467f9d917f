use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{EngineError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a repayment transaction
pub type TransactionId = Uuid;

/// repayment cycle, all whole multiples of a month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentCycle {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl RepaymentCycle {
    /// months between two consecutive installments
    pub fn months(&self) -> u32 {
        match self {
            RepaymentCycle::Monthly => 1,
            RepaymentCycle::Quarterly => 3,
            RepaymentCycle::SemiAnnual => 6,
            RepaymentCycle::Annual => 12,
        }
    }

    /// installment periods per year
    pub fn periods_per_year(&self) -> u32 {
        12 / self.months()
    }
}

impl std::fmt::Display for RepaymentCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RepaymentCycle::Monthly => "monthly",
            RepaymentCycle::Quarterly => "quarterly",
            RepaymentCycle::SemiAnnual => "semi-annual",
            RepaymentCycle::Annual => "annual",
        };
        write!(f, "{}", name)
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// loan approved but not yet disbursed
    Pending,
    /// loan disbursed and performing
    Active,
    /// one or more installments past due
    Overdue,
    /// fully repaid
    Closed,
    /// credit-impaired past recovery thresholds
    Defaulted,
    /// written off as a loss
    WrittenOff,
}

impl LoanStatus {
    /// statuses that can still receive repayments; a defaulted loan is
    /// impaired but still collectible
    pub fn can_accept_payment(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue | LoanStatus::Defaulted)
    }

    /// statuses that are subject to risk classification; defaulted loans
    /// keep carrying a loss allowance until closed or written off
    pub fn is_classifiable(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue | LoanStatus::Defaulted)
    }
}

/// IFRS 9 credit-risk stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ifrs9Stage {
    /// performing, no significant increase in credit risk
    Stage1,
    /// significant increase in credit risk, not yet impaired
    Stage2,
    /// credit-impaired
    Stage3,
}

impl Ifrs9Stage {
    /// parse a raw stage number from the boundary, rejecting anything outside {1,2,3}
    pub fn from_number(stage: u8) -> Result<Self> {
        match stage {
            1 => Ok(Ifrs9Stage::Stage1),
            2 => Ok(Ifrs9Stage::Stage2),
            3 => Ok(Ifrs9Stage::Stage3),
            other => Err(EngineError::InvalidStage { stage: other }),
        }
    }

    pub fn as_number(&self) -> u8 {
        match self {
            Ifrs9Stage::Stage1 => 1,
            Ifrs9Stage::Stage2 => 2,
            Ifrs9Stage::Stage3 => 3,
        }
    }
}

/// jurisdiction-fixed regulatory classification bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegulatoryBucket {
    Standard,
    Substandard,
    Doubtful,
    Loss,
}

/// payment method on a repayment transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    MobileMoney,
    Cheque,
    Other(String),
}

/// waterfall allocation result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentAllocation {
    pub to_penalties: Money,
    pub to_fees: Money,
    pub to_interest: Money,
    pub to_principal: Money,
    pub excess: Money,
}

impl PaymentAllocation {
    pub fn total_applied(&self) -> Money {
        self.to_penalties + self.to_fees + self.to_interest + self.to_principal
    }

    /// negation of every component, used when posting a reversal
    pub fn negated(&self) -> Self {
        Self {
            to_penalties: Money::ZERO - self.to_penalties,
            to_fees: Money::ZERO - self.to_fees,
            to_interest: Money::ZERO - self.to_interest,
            to_principal: Money::ZERO - self.to_principal,
            excess: Money::ZERO - self.excess,
        }
    }
}

/// snapshot of a loan's outstanding buckets, the allocator's only input state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OutstandingBuckets {
    pub penalties: Money,
    pub fees: Money,
    pub interest: Money,
    pub principal: Money,
}

impl OutstandingBuckets {
    pub fn total(&self) -> Money {
        self.penalties + self.fees + self.interest + self.principal
    }

    pub fn is_settled(&self) -> bool {
        self.total().is_zero()
    }
}
