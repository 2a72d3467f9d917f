pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod history;
pub mod loan;
pub mod payments;
pub mod risk;
pub mod types;

// re-export key types
pub use decimal::{Money, Rate};
pub use errors::{EngineError, Result};
pub use events::{Event, EventStore};
pub use config::{EngineConfig, ProvisionMatrix, StagingPolicy};
pub use history::{EclHistory, ProvisionHistory, RecalculationService};
pub use loan::{Charge, ChargeKind, Loan, LoanState, LoanTerms};
pub use payments::{
    allocate, apply_allocation, AmortizationSchedule, RepaymentRequest, RepaymentTransaction,
    ScheduleEntry, TransactionKind,
};
pub use risk::{
    classify, EclEngine, EclResult, PdHorizon, ProvisionResult, ProvisioningEngine,
    RiskAssessment, RiskClassification, RiskParameters,
};
pub use types::{
    Ifrs9Stage, LoanId, LoanStatus, OutstandingBuckets, PaymentAllocation, PaymentMethod,
    RegulatoryBucket, RepaymentCycle, TransactionId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
