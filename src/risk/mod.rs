pub mod classification;
pub mod ecl;
pub mod provisioning;

use serde::{Deserialize, Serialize};

pub use classification::{classify, RiskClassification};
pub use ecl::{EclEngine, EclResult, PdHorizon, RiskParameters};
pub use provisioning::{ProvisioningEngine, ProvisionResult};

/// one loan's full risk picture at an evaluation date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub classification: RiskClassification,
    pub ecl: EclResult,
    pub provision: ProvisionResult,
}
