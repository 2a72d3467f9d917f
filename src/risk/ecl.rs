use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::types::{Ifrs9Stage, LoanId};

/// horizon of the probability-of-default estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdHorizon {
    /// 12-month PD, used for stage 1 exposures
    TwelveMonth,
    /// lifetime PD, used for stage 2 and 3 exposures
    Lifetime,
}

impl PdHorizon {
    /// the horizon IFRS 9 requires for a stage
    pub fn for_stage(stage: Ifrs9Stage) -> Self {
        match stage {
            Ifrs9Stage::Stage1 => PdHorizon::TwelveMonth,
            Ifrs9Stage::Stage2 | Ifrs9Stage::Stage3 => PdHorizon::Lifetime,
        }
    }
}

/// externally estimated PD/LGD pair; the estimation model is an external
/// risk collaborator, this engine only validates and applies the numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    pub probability_of_default: Rate,
    pub loss_given_default: Rate,
}

/// expected credit loss record, append-only history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclResult {
    pub loan_id: LoanId,
    pub stage: Ifrs9Stage,
    pub pd_horizon: PdHorizon,
    pub probability_of_default: Rate,
    pub loss_given_default: Rate,
    pub exposure_at_default: Money,
    pub ecl_value: Money,
    pub calculated_at: DateTime<Utc>,
}

/// ECL engine: ECL = EAD x PD x LGD
pub struct EclEngine;

impl EclEngine {
    /// compute expected credit loss for a staged exposure
    ///
    /// EAD is accepted as an input (current outstanding balance for a
    /// performing loan) so the formula stays pure and testable independent
    /// of exposure tracking.
    pub fn compute(
        loan_id: LoanId,
        stage: Ifrs9Stage,
        exposure_at_default: Money,
        params: RiskParameters,
        time_provider: &SafeTimeProvider,
    ) -> Result<EclResult> {
        if exposure_at_default.is_negative() {
            return Err(EngineError::InvalidAmount {
                amount: exposure_at_default,
            });
        }
        if !params.probability_of_default.is_unit_fraction() {
            return Err(EngineError::InvalidRiskParameter {
                name: "probability_of_default".to_string(),
                value: params.probability_of_default.as_decimal(),
            });
        }
        if !params.loss_given_default.is_unit_fraction() {
            return Err(EngineError::InvalidRiskParameter {
                name: "loss_given_default".to_string(),
                value: params.loss_given_default.as_decimal(),
            });
        }

        let ecl_value = Money::from_decimal(
            exposure_at_default.as_decimal()
                * params.probability_of_default.as_decimal()
                * params.loss_given_default.as_decimal(),
        );

        Ok(EclResult {
            loan_id,
            stage,
            pd_horizon: PdHorizon::for_stage(stage),
            probability_of_default: params.probability_of_default,
            loss_given_default: params.loss_given_default,
            exposure_at_default,
            ecl_value,
            calculated_at: time_provider.now(),
        })
    }

    /// compute from a raw numeric stage at the boundary
    pub fn compute_for_stage_number(
        loan_id: LoanId,
        stage: u8,
        exposure_at_default: Money,
        params: RiskParameters,
        time_provider: &SafeTimeProvider,
    ) -> Result<EclResult> {
        let stage = Ifrs9Stage::from_number(stage)?;
        Self::compute(loan_id, stage, exposure_at_default, params, time_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn params(pd: &str, lgd: &str) -> RiskParameters {
        RiskParameters {
            probability_of_default: Rate::from_decimal(pd.parse().unwrap()),
            loss_given_default: Rate::from_decimal(lgd.parse().unwrap()),
        }
    }

    #[test]
    fn test_ecl_formula() {
        // EAD 1000, PD 0.05, LGD 0.4 => ECL 20.00 exactly
        let result = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage1,
            Money::from_major(1_000),
            params("0.05", "0.4"),
            &test_time(),
        )
        .unwrap();

        assert_eq!(result.ecl_value, Money::from_major(20));
        assert_eq!(result.ecl_value.as_decimal(), dec!(20.00));
        assert_eq!(result.pd_horizon, PdHorizon::TwelveMonth);
    }

    #[test]
    fn test_lifetime_horizon_for_later_stages() {
        for stage in [Ifrs9Stage::Stage2, Ifrs9Stage::Stage3] {
            let result = EclEngine::compute(
                Uuid::new_v4(),
                stage,
                Money::from_major(500),
                params("0.35", "0.6"),
                &test_time(),
            )
            .unwrap();
            assert_eq!(result.pd_horizon, PdHorizon::Lifetime);
        }
    }

    #[test]
    fn test_zero_exposure_gives_zero_ecl() {
        let result = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage3,
            Money::ZERO,
            params("1", "1"),
            &test_time(),
        )
        .unwrap();
        assert_eq!(result.ecl_value, Money::ZERO);
    }

    #[test]
    fn test_invalid_stage_number_rejected() {
        let err = EclEngine::compute_for_stage_number(
            Uuid::new_v4(),
            4,
            Money::from_major(100),
            params("0.1", "0.5"),
            &test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidStage { stage: 4 }));
    }

    #[test]
    fn test_out_of_range_parameters_rejected() {
        let bad_pd = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage1,
            Money::from_major(100),
            params("1.1", "0.5"),
            &test_time(),
        );
        assert!(matches!(
            bad_pd,
            Err(EngineError::InvalidRiskParameter { ref name, .. }) if name == "probability_of_default"
        ));

        let bad_lgd = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage1,
            Money::from_major(100),
            params("0.1", "-0.5"),
            &test_time(),
        );
        assert!(matches!(
            bad_lgd,
            Err(EngineError::InvalidRiskParameter { ref name, .. }) if name == "loss_given_default"
        ));

        let bad_ead = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage1,
            Money::ZERO - Money::from_major(1),
            params("0.1", "0.5"),
            &test_time(),
        );
        assert!(matches!(bad_ead, Err(EngineError::InvalidAmount { .. })));
    }

    #[test]
    fn test_ecl_rounds_to_cents() {
        let result = EclEngine::compute(
            Uuid::new_v4(),
            Ifrs9Stage::Stage2,
            Money::from_str_exact("333.33").unwrap(),
            params("0.07", "0.45"),
            &test_time(),
        )
        .unwrap();
        // 333.33 * 0.07 * 0.45 = 10.499895 -> 10.50
        assert_eq!(result.ecl_value, Money::from_str_exact("10.50").unwrap());
    }
}
