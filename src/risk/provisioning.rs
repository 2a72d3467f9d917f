use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ProvisionMatrix;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::{LoanId, RegulatoryBucket};

/// regulatory provision record, append-only history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProvisionResult {
    pub loan_id: LoanId,
    pub bucket: RegulatoryBucket,
    pub provision_rate: Rate,
    pub provision_amount: Money,
    pub effective_date: NaiveDate,
}

/// provisioning engine applying the jurisdiction-fixed matrix
///
/// Deliberately independent of the ECL engine: regulators require both
/// figures reported separately, so the two are never reconciled here.
pub struct ProvisioningEngine {
    matrix: ProvisionMatrix,
}

impl ProvisioningEngine {
    pub fn new(matrix: ProvisionMatrix) -> Self {
        Self { matrix }
    }

    /// provision amount = outstanding exposure x fixed bucket rate
    pub fn compute(
        &self,
        loan_id: LoanId,
        bucket: RegulatoryBucket,
        outstanding_exposure: Money,
        effective_date: NaiveDate,
    ) -> Result<ProvisionResult> {
        if outstanding_exposure.is_negative() {
            return Err(EngineError::InvalidAmount {
                amount: outstanding_exposure,
            });
        }

        let provision_rate = self.matrix.rate_for(bucket);
        let provision_amount = Money::from_decimal(
            outstanding_exposure.as_decimal() * provision_rate.as_decimal(),
        );

        Ok(ProvisionResult {
            loan_id,
            bucket,
            provision_rate,
            provision_amount,
            effective_date,
        })
    }
}
