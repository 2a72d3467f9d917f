use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::types::{Ifrs9Stage, RegulatoryBucket};

/// IFRS 9 staging thresholds on days overdue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingPolicy {
    /// first day-count that moves a loan into stage 2
    pub stage2_from_days: u32,
    /// first day-count that moves a loan into stage 3
    pub stage3_from_days: u32,
}

impl StagingPolicy {
    /// standard IFRS 9 backstops: stage 2 at 31 days, stage 3 at 90 days
    pub fn ifrs9() -> Self {
        Self {
            stage2_from_days: 31,
            stage3_from_days: 90,
        }
    }

    /// map days overdue to a stage
    pub fn stage_for(&self, days_overdue: u32) -> Ifrs9Stage {
        if days_overdue >= self.stage3_from_days {
            Ifrs9Stage::Stage3
        } else if days_overdue >= self.stage2_from_days {
            Ifrs9Stage::Stage2
        } else {
            Ifrs9Stage::Stage1
        }
    }
}

impl Default for StagingPolicy {
    fn default() -> Self {
        Self::ifrs9()
    }
}

/// jurisdiction-fixed classification buckets and provisioning rates,
/// configured independently of the IFRS 9 staging thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProvisionMatrix {
    pub substandard_from_days: u32,
    pub doubtful_from_days: u32,
    pub loss_from_days: u32,
    pub standard_rate: Rate,
    pub substandard_rate: Rate,
    pub doubtful_rate: Rate,
    pub loss_rate: Rate,
}

impl ProvisionMatrix {
    /// Bank of Zambia buckets: standard 0-30 (0%), substandard 31-90 (10%),
    /// doubtful 91-180 (25%), loss beyond 180 (100%)
    pub fn bank_of_zambia() -> Self {
        Self {
            substandard_from_days: 31,
            doubtful_from_days: 91,
            loss_from_days: 181,
            standard_rate: Rate::ZERO,
            substandard_rate: Rate::from_percentage(10),
            doubtful_rate: Rate::from_percentage(25),
            loss_rate: Rate::from_percentage(100),
        }
    }

    /// map days overdue to a regulatory bucket
    pub fn bucket_for(&self, days_overdue: u32) -> RegulatoryBucket {
        if days_overdue >= self.loss_from_days {
            RegulatoryBucket::Loss
        } else if days_overdue >= self.doubtful_from_days {
            RegulatoryBucket::Doubtful
        } else if days_overdue >= self.substandard_from_days {
            RegulatoryBucket::Substandard
        } else {
            RegulatoryBucket::Standard
        }
    }

    /// fixed provisioning rate for a bucket
    pub fn rate_for(&self, bucket: RegulatoryBucket) -> Rate {
        match bucket {
            RegulatoryBucket::Standard => self.standard_rate,
            RegulatoryBucket::Substandard => self.substandard_rate,
            RegulatoryBucket::Doubtful => self.doubtful_rate,
            RegulatoryBucket::Loss => self.loss_rate,
        }
    }
}

impl Default for ProvisionMatrix {
    fn default() -> Self {
        Self::bank_of_zambia()
    }
}

/// engine configuration handed to classification, ECL and provisioning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    pub staging: StagingPolicy,
    pub provisioning: ProvisionMatrix,
}

impl EngineConfig {
    pub fn new(staging: StagingPolicy, provisioning: ProvisionMatrix) -> Self {
        Self {
            staging,
            provisioning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_staging_thresholds() {
        let policy = StagingPolicy::ifrs9();
        assert_eq!(policy.stage_for(0), Ifrs9Stage::Stage1);
        assert_eq!(policy.stage_for(30), Ifrs9Stage::Stage1);
        assert_eq!(policy.stage_for(31), Ifrs9Stage::Stage2);
        assert_eq!(policy.stage_for(89), Ifrs9Stage::Stage2);
        assert_eq!(policy.stage_for(90), Ifrs9Stage::Stage3);
        assert_eq!(policy.stage_for(400), Ifrs9Stage::Stage3);
    }

    #[test]
    fn test_bucket_thresholds() {
        let matrix = ProvisionMatrix::bank_of_zambia();
        assert_eq!(matrix.bucket_for(0), RegulatoryBucket::Standard);
        assert_eq!(matrix.bucket_for(30), RegulatoryBucket::Standard);
        assert_eq!(matrix.bucket_for(31), RegulatoryBucket::Substandard);
        assert_eq!(matrix.bucket_for(90), RegulatoryBucket::Substandard);
        assert_eq!(matrix.bucket_for(91), RegulatoryBucket::Doubtful);
        assert_eq!(matrix.bucket_for(180), RegulatoryBucket::Doubtful);
        assert_eq!(matrix.bucket_for(181), RegulatoryBucket::Loss);
    }

    #[test]
    fn test_bucket_rates() {
        let matrix = ProvisionMatrix::bank_of_zambia();
        assert_eq!(matrix.rate_for(RegulatoryBucket::Standard), Rate::ZERO);
        assert_eq!(
            matrix.rate_for(RegulatoryBucket::Substandard).as_decimal(),
            dec!(0.1)
        );
        assert_eq!(
            matrix.rate_for(RegulatoryBucket::Doubtful).as_decimal(),
            dec!(0.25)
        );
        assert_eq!(matrix.rate_for(RegulatoryBucket::Loss), Rate::ONE);
    }

    #[test]
    fn test_schemes_are_independent() {
        // a loan at 95 days is IFRS 9 stage 3 but regulatory doubtful,
        // at 45 days stage 2 and substandard
        let config = EngineConfig::default();
        assert_eq!(config.staging.stage_for(95), Ifrs9Stage::Stage3);
        assert_eq!(config.provisioning.bucket_for(95), RegulatoryBucket::Doubtful);
        assert_eq!(config.staging.stage_for(45), Ifrs9Stage::Stage2);
        assert_eq!(
            config.provisioning.bucket_for(45),
            RegulatoryBucket::Substandard
        );
    }
}
