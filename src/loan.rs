use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{EngineError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{
    allocate, apply_allocation, AmortizationSchedule, RepaymentRequest, RepaymentTransaction,
    TransactionKind,
};
use crate::risk::classification::{classify, RiskClassification};
use crate::risk::{EclEngine, ProvisioningEngine, RiskAssessment, RiskParameters};
use crate::types::{Ifrs9Stage, LoanId, LoanStatus, OutstandingBuckets, RepaymentCycle};

/// immutable contractual terms fixed at disbursement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub cycle: RepaymentCycle,
    pub disbursement_date: NaiveDate,
}

/// kind of an ad-hoc charge raised against a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeKind {
    Penalty,
    Fee,
}

/// penalty or fee assessed against a loan; append-only, replayed for
/// point-in-time reconstruction alongside the repayment transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub charge_id: Uuid,
    pub loan_id: LoanId,
    pub kind: ChargeKind,
    pub amount: Money,
    pub charged_on: NaiveDate,
    pub reason: String,
}

/// mutable loan state; balance mutations all go through the repayment commit
/// path, due-date rolling and charge assessment, each bumping `version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanState {
    pub outstanding: OutstandingBuckets,
    pub next_due_date: Option<NaiveDate>,
    pub status: LoanStatus,
    /// optimistic-concurrency version; repayments must quote it
    pub version: u64,
    /// stage reported by the last risk assessment, drives StageChanged
    pub last_stage: Option<Ifrs9Stage>,
    /// installments whose scheduled interest has fallen due
    pub installments_rolled: u32,
    /// cumulative principal + interest received, drives next-due tracking
    pub scheduled_paid: Money,
    pub total_repaid: Money,
    pub payment_count: u32,
    pub last_payment_date: Option<NaiveDate>,
}

/// loan aggregate: terms, original schedule, state and the append-only
/// transaction history
#[derive(Debug)]
pub struct Loan {
    pub id: LoanId,
    pub terms: LoanTerms,
    pub schedule: AmortizationSchedule,
    pub state: LoanState,
    pub transactions: Vec<RepaymentTransaction>,
    pub charges: Vec<Charge>,
    pub events: EventStore,
}

impl Loan {
    /// disburse a loan: generate the original schedule and open the state
    ///
    /// The loan and its schedule are created together and the schedule is
    /// immutable thereafter.
    pub fn disburse(
        loan_id: LoanId,
        terms: LoanTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        let schedule = AmortizationSchedule::generate(
            loan_id,
            terms.principal,
            terms.annual_rate,
            terms.term_months,
            terms.cycle,
            terms.disbursement_date,
        )?;

        let first_due_date = schedule.first_due_date();

        let state = LoanState {
            outstanding: OutstandingBuckets {
                principal: terms.principal,
                ..Default::default()
            },
            next_due_date: Some(first_due_date),
            status: LoanStatus::Active,
            version: 0,
            last_stage: None,
            installments_rolled: 0,
            scheduled_paid: Money::ZERO,
            total_repaid: Money::ZERO,
            payment_count: 0,
            last_payment_date: None,
        };

        let mut events = EventStore::new();
        events.emit(Event::LoanDisbursed {
            loan_id,
            principal: terms.principal,
            installments: schedule.installments(),
            first_due_date,
            timestamp: time_provider.now(),
        });

        Ok(Self {
            id: loan_id,
            terms,
            schedule,
            state,
            transactions: Vec::new(),
            charges: Vec::new(),
            events,
        })
    }

    /// total outstanding across all buckets
    pub fn total_outstanding(&self) -> Money {
        self.state.outstanding.total()
    }

    /// days overdue at an evaluation date, from the stored next due date
    pub fn days_overdue_as_of(&self, evaluation_date: NaiveDate) -> u32 {
        self.state
            .next_due_date
            .map(|due| crate::calendar::days_overdue(due, evaluation_date))
            .unwrap_or(0)
    }

    /// roll scheduled interest into the outstanding interest bucket for
    /// every installment that has fallen due by `as_of`; idempotent
    pub fn roll_due(&mut self, as_of: NaiveDate) {
        let mut rolled = self.state.installments_rolled;

        while let Some(entry) = self.schedule.entry(rolled + 1) {
            if entry.due_date > as_of {
                break;
            }

            self.state.outstanding.interest += entry.scheduled_interest;
            rolled += 1;

            self.events.emit(Event::InstallmentDue {
                loan_id: self.id,
                installment_number: entry.installment_number,
                due_date: entry.due_date,
                scheduled_principal: entry.scheduled_principal,
                scheduled_interest: entry.scheduled_interest,
            });
        }

        if rolled != self.state.installments_rolled {
            self.state.installments_rolled = rolled;
            self.state.version += 1;
            self.refresh_delinquency(as_of);
        }
    }

    /// assess a penalty or fee against the loan
    pub fn charge(
        &mut self,
        kind: ChargeKind,
        amount: Money,
        charged_on: NaiveDate,
        reason: &str,
    ) -> Result<&Charge> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount { amount });
        }
        if !self.state.status.can_accept_payment() {
            return Err(EngineError::LoanNotActive {
                status: self.state.status,
            });
        }

        match kind {
            ChargeKind::Penalty => self.state.outstanding.penalties += amount,
            ChargeKind::Fee => self.state.outstanding.fees += amount,
        }
        self.state.version += 1;

        self.charges.push(Charge {
            charge_id: Uuid::new_v4(),
            loan_id: self.id,
            kind,
            amount,
            charged_on,
            reason: reason.to_string(),
        });

        Ok(self.charges.last().expect("charge just pushed"))
    }

    /// apply a repayment through the waterfall and commit it atomically
    ///
    /// `expected_version` is the optimistic-concurrency check: a posting
    /// quoting a stale version fails with `StaleLoanVersion` before any
    /// state changes, so two simultaneous payments cannot both decrement
    /// the same snapshot. Any failure leaves the loan untouched.
    pub fn apply_repayment(
        &mut self,
        request: &RepaymentRequest,
        expected_version: u64,
        time_provider: &SafeTimeProvider,
    ) -> Result<&RepaymentTransaction> {
        if !self.state.status.can_accept_payment() {
            return Err(EngineError::LoanNotActive {
                status: self.state.status,
            });
        }
        if expected_version != self.state.version {
            return Err(EngineError::StaleLoanVersion {
                expected: expected_version,
                actual: self.state.version,
            });
        }
        if !request.amount.is_positive() {
            return Err(EngineError::InvalidAmount {
                amount: request.amount,
            });
        }

        // interest that fell due before the payment date is owed first
        self.roll_due(request.payment_date);

        // compute the full result before any balance mutation
        let allocation = allocate(request.amount, &self.state.outstanding)?;
        let updated = apply_allocation(&self.state.outstanding, &allocation)?;

        // commit
        let now = time_provider.now();
        let transaction = RepaymentTransaction::payment(request, allocation, now);

        self.state.outstanding = updated;
        self.state.version += 1;
        self.state.scheduled_paid += allocation.to_interest + allocation.to_principal;
        self.state.total_repaid += allocation.total_applied();
        self.state.payment_count += 1;
        self.state.last_payment_date = Some(request.payment_date);
        self.recompute_next_due();

        self.events.emit(Event::RepaymentReceived {
            loan_id: self.id,
            transaction_id: transaction.transaction_id,
            amount: request.amount,
            applied_to_penalties: allocation.to_penalties,
            applied_to_fees: allocation.to_fees,
            applied_to_interest: allocation.to_interest,
            applied_to_principal: allocation.to_principal,
            timestamp: now,
        });

        if allocation.excess.is_positive() {
            self.events.emit(Event::ExcessPaymentReturned {
                loan_id: self.id,
                transaction_id: transaction.transaction_id,
                amount: allocation.excess,
                timestamp: now,
            });
        }

        if self.state.outstanding.is_settled() {
            self.transition_status(LoanStatus::Closed, "fully repaid", time_provider);
            self.events.emit(Event::LoanClosed {
                loan_id: self.id,
                final_payment: request.amount,
                timestamp: now,
            });
        } else {
            self.refresh_delinquency(request.payment_date);
        }

        self.transactions.push(transaction);
        Ok(self.transactions.last().expect("transaction just pushed"))
    }

    /// reverse a posted repayment by reference, as a new offsetting
    /// transaction that re-increments the buckets; the original record is
    /// never edited
    pub fn reverse_repayment(
        &mut self,
        reference: &str,
        reversal_date: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<&RepaymentTransaction> {
        let already_reversed: Vec<Uuid> = self
            .transactions
            .iter()
            .filter_map(|t| t.reverses)
            .collect();

        let original = self
            .transactions
            .iter()
            .find(|t| {
                t.kind == TransactionKind::Payment
                    && t.reference == reference
                    && !already_reversed.contains(&t.transaction_id)
            })
            .cloned()
            .ok_or_else(|| EngineError::TransactionNotFound {
                reference: reference.to_string(),
            })?;

        // re-incrementing principal must not exceed the original principal
        let restored_principal = self.state.outstanding.principal + original.allocation.to_principal;
        if restored_principal > self.terms.principal {
            return Err(EngineError::OverAllocation {
                bucket: "principal".to_string(),
                outstanding: self.terms.principal,
                applied: restored_principal,
            });
        }

        let now = time_provider.now();
        let reversal = RepaymentTransaction::reversal(&original, reversal_date, now);

        self.state.outstanding.penalties += original.allocation.to_penalties;
        self.state.outstanding.fees += original.allocation.to_fees;
        self.state.outstanding.interest += original.allocation.to_interest;
        self.state.outstanding.principal += original.allocation.to_principal;
        self.state.version += 1;
        self.state.scheduled_paid -=
            original.allocation.to_interest + original.allocation.to_principal;
        self.state.total_repaid -= original.allocation.total_applied();
        self.recompute_next_due();

        if self.state.status == LoanStatus::Closed && !self.state.outstanding.is_settled() {
            self.transition_status(LoanStatus::Active, "repayment reversed", time_provider);
            self.refresh_delinquency(reversal_date);
        }

        self.events.emit(Event::RepaymentReversed {
            loan_id: self.id,
            original_transaction_id: original.transaction_id,
            reversal_transaction_id: reversal.transaction_id,
            amount: original.amount,
            timestamp: now,
        });

        self.transactions.push(reversal);
        Ok(self.transactions.last().expect("transaction just pushed"))
    }

    /// classification from the stored state at an evaluation date
    ///
    /// Requires a classifiable status and a generated schedule; returns
    /// `None` when nothing is outstanding.
    pub fn classification_as_of(
        &self,
        evaluation_date: NaiveDate,
        config: &EngineConfig,
    ) -> Result<Option<RiskClassification>> {
        if !self.state.status.is_classifiable() {
            return Err(EngineError::LoanNotActive {
                status: self.state.status,
            });
        }

        let next_due_date = self
            .state
            .next_due_date
            .ok_or(EngineError::ScheduleNotFound { loan_id: self.id })?;

        Ok(classify(
            self.id,
            next_due_date,
            evaluation_date,
            self.total_outstanding(),
            &config.staging,
            &config.provisioning,
        ))
    }

    /// full risk picture from the live state: classification, ECL and the
    /// regulatory provision, with the corresponding events emitted
    ///
    /// Returns `None` when nothing is outstanding. `StageChanged` fires only
    /// when the stage differs from the last assessment.
    pub fn assess_risk(
        &mut self,
        evaluation_date: NaiveDate,
        params: RiskParameters,
        config: &EngineConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<RiskAssessment>> {
        let classification = match self.classification_as_of(evaluation_date, config)? {
            Some(classification) => classification,
            None => return Ok(None),
        };

        if self.state.last_stage != Some(classification.stage) {
            self.events.emit(Event::StageChanged {
                loan_id: self.id,
                old_stage: self.state.last_stage,
                new_stage: classification.stage,
                days_overdue: classification.days_overdue,
                evaluation_date,
            });
            self.state.last_stage = Some(classification.stage);
        }

        let exposure = self.total_outstanding();
        let ecl = EclEngine::compute(
            self.id,
            classification.stage,
            exposure,
            params,
            time_provider,
        )?;
        let provision = ProvisioningEngine::new(config.provisioning).compute(
            self.id,
            classification.bucket,
            exposure,
            evaluation_date,
        )?;

        self.events.emit(Event::EclCalculated {
            loan_id: self.id,
            stage: ecl.stage,
            exposure_at_default: ecl.exposure_at_default,
            ecl_value: ecl.ecl_value,
            timestamp: ecl.calculated_at,
        });
        self.events.emit(Event::ProvisionCalculated {
            loan_id: self.id,
            bucket: provision.bucket,
            provision_rate: provision.provision_rate,
            provision_amount: provision.provision_amount,
            effective_date: provision.effective_date,
        });

        Ok(Some(RiskAssessment {
            classification,
            ecl,
            provision,
        }))
    }

    /// write the loan off as a loss
    pub fn write_off(&mut self, time_provider: &SafeTimeProvider) -> Result<()> {
        if matches!(self.state.status, LoanStatus::Closed | LoanStatus::WrittenOff) {
            return Err(EngineError::LoanNotActive {
                status: self.state.status,
            });
        }

        let loss = self.total_outstanding();
        self.transition_status(LoanStatus::WrittenOff, "written off", time_provider);

        self.events.emit(Event::LoanWrittenOff {
            loan_id: self.id,
            loss_amount: loss,
            timestamp: time_provider.now(),
        });

        Ok(())
    }

    /// mark a credit-impaired loan as defaulted
    pub fn mark_defaulted(&mut self, reason: &str, time_provider: &SafeTimeProvider) -> Result<()> {
        if !self.state.status.can_accept_payment() {
            return Err(EngineError::LoanNotActive {
                status: self.state.status,
            });
        }
        self.transition_status(LoanStatus::Defaulted, reason, time_provider);
        Ok(())
    }

    /// drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// move next-due to the first installment whose cumulative scheduled
    /// total is not yet covered by principal + interest received
    fn recompute_next_due(&mut self) {
        if self.state.outstanding.is_settled() {
            self.state.next_due_date = None;
            return;
        }

        let mut cumulative = Money::ZERO;
        let mut next = None;

        for entry in &self.schedule.entries {
            cumulative += entry.scheduled_total;
            if cumulative > self.state.scheduled_paid {
                next = Some(entry.due_date);
                break;
            }
        }

        self.state.next_due_date = next;
    }

    /// flip between Active and Overdue from the current due date
    fn refresh_delinquency(&mut self, as_of: NaiveDate) {
        if !matches!(self.state.status, LoanStatus::Active | LoanStatus::Overdue) {
            return;
        }

        let overdue = self.days_overdue_as_of(as_of) > 0;
        let new_status = if overdue {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        };

        if new_status != self.state.status {
            let old_status = self.state.status;
            self.state.status = new_status;
            self.events.emit(Event::StatusChanged {
                loan_id: self.id,
                old_status,
                new_status,
                reason: format!("{} days past due", self.days_overdue_as_of(as_of)),
                timestamp: as_of
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is valid")
                    .and_utc(),
            });
        }
    }

    fn transition_status(
        &mut self,
        new_status: LoanStatus,
        reason: &str,
        time_provider: &SafeTimeProvider,
    ) {
        if new_status == self.state.status {
            return;
        }
        let old_status = self.state.status;
        self.state.status = new_status;
        self.events.emit(Event::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status,
            reason: reason.to_string(),
            timestamp: time_provider.now(),
        });
    }
}
