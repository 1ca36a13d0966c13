//! Fee engine.
//!
//! Fee schedules live on the contract (bps + flat components); per-user
//! multipliers scale them. All outputs are integers in the fee currency's
//! smallest unit, rounded half away from zero (`f64::round`) — the rounding
//! rule is part of the contract with the ledger, not an implementation
//! accident.

use crate::error::CashierError;
use crate::models::{Contract, Fee, UserFeeProfile};

/// Which side of a trade the user was on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Aggressive,
    Passive,
}

#[derive(Debug, Clone)]
pub struct FeeEngine {
    /// No fees are charged while set
    trial_period: bool,
}

impl FeeEngine {
    pub fn new(trial_period: bool) -> Self {
        Self { trial_period }
    }

    /// Fee for a filled (or hypothetical) transaction of `size` wire units.
    ///
    /// When the side is unknown — typically a pre-order quote — the larger of
    /// the user's aggressive/passive factors applies, so the quote is an
    /// upper bound on what the fill can cost. Denominated in the contract's
    /// denominated ticker.
    pub fn transaction_fee(
        &self,
        user: &UserFeeProfile,
        contract: &Contract,
        size: i64,
        side: Option<Side>,
    ) -> Result<Vec<Fee>, CashierError> {
        if self.trial_period {
            return Ok(Vec::new());
        }

        let denominated = contract.denominated_contract.as_deref().ok_or_else(|| {
            CashierError::ContractNotFound(format!("{} denominated", contract.ticker))
        })?;

        let base_fee = (size * contract.fee_bps) as f64;
        let user_factor = match side {
            Some(Side::Aggressive) => user.aggressive_factor,
            Some(Side::Passive) => user.passive_factor,
            None => user.aggressive_factor.max(user.passive_factor),
        };

        // 100 because factors are in percent, 10000 because fees are in bps
        let final_fee = (base_fee * user_factor / 100.0 / 10000.0).round() as i64;
        Ok(vec![Fee {
            ticker: denominated.ticker.clone(),
            amount: final_fee,
        }])
    }

    /// Fee for depositing `amount` wire units, denominated in the contract's
    /// own ticker.
    pub fn deposit_fee(&self, user: &UserFeeProfile, contract: &Contract, amount: i64) -> Vec<Fee> {
        if self.trial_period {
            return Vec::new();
        }

        let base_fee = contract.deposit_base_fee as f64
            + (amount * contract.deposit_bps_fee) as f64 / 10000.0;
        let final_fee = (base_fee * user.deposit_factor / 100.0).round() as i64;
        vec![Fee {
            ticker: contract.ticker.clone(),
            amount: final_fee,
        }]
    }

    /// Fee for withdrawing `amount` wire units, denominated in the contract's
    /// own ticker.
    pub fn withdraw_fee(
        &self,
        user: &UserFeeProfile,
        contract: &Contract,
        amount: i64,
    ) -> Vec<Fee> {
        if self.trial_period {
            return Vec::new();
        }

        let base_fee = contract.withdraw_base_fee as f64
            + (amount * contract.withdraw_bps_fee) as f64 / 10000.0;
        let final_fee = (base_fee * user.withdraw_factor / 100.0).round() as i64;
        vec![Fee {
            ticker: contract.ticker.clone(),
            amount: final_fee,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contract, ContractType, UserFeeProfile};

    fn peso() -> Contract {
        Contract::cash("MXN", 100, 1, 1)
    }

    fn future_with_fees() -> Contract {
        let mut c = Contract::cash("BTCUSD", 1, 1, 1);
        c.contract_type = ContractType::Futures;
        c.fee_bps = 40;
        c.denominated_contract = Some(Box::new(peso()));
        c
    }

    #[test]
    fn test_deposit_fee_worked_example() {
        let engine = FeeEngine::new(false);
        let contract = peso().with_deposit_fees(10, 50);
        let user = UserFeeProfile::default();

        // base = 10 + 100000 * 50 / 10000 = 510; factor 100% -> 510
        let fees = engine.deposit_fee(&user, &contract, 100_000);
        assert_eq!(fees, vec![Fee { ticker: "MXN".to_string(), amount: 510 }]);
    }

    #[test]
    fn test_deposit_fee_scaled_by_user_factor() {
        let engine = FeeEngine::new(false);
        let contract = peso().with_deposit_fees(10, 50);
        let user = UserFeeProfile {
            deposit_factor: 50.0,
            ..UserFeeProfile::default()
        };

        // 510 * 50% = 255
        assert_eq!(engine.deposit_fee(&user, &contract, 100_000)[0].amount, 255);
    }

    #[test]
    fn test_withdraw_fee() {
        let engine = FeeEngine::new(false);
        let contract = peso().with_withdraw_fees(25, 10);
        let user = UserFeeProfile::default();

        // base = 25 + 200000 * 10 / 10000 = 225
        assert_eq!(engine.withdraw_fee(&user, &contract, 200_000)[0].amount, 225);
    }

    #[test]
    fn test_transaction_fee_known_side() {
        let engine = FeeEngine::new(false);
        let contract = future_with_fees();
        let user = UserFeeProfile {
            aggressive_factor: 100.0,
            passive_factor: 50.0,
            ..UserFeeProfile::default()
        };

        // base = 1_000_000 * 40 bps; aggressive 100% -> 4000, passive 50% -> 2000
        let aggressive = engine
            .transaction_fee(&user, &contract, 1_000_000, Some(Side::Aggressive))
            .unwrap();
        let passive = engine
            .transaction_fee(&user, &contract, 1_000_000, Some(Side::Passive))
            .unwrap();
        assert_eq!(aggressive[0].amount, 4000);
        assert_eq!(passive[0].amount, 2000);
        assert_eq!(aggressive[0].ticker, "MXN");
    }

    #[test]
    fn test_transaction_fee_unknown_side_quotes_upper_bound() {
        let engine = FeeEngine::new(false);
        let contract = future_with_fees();
        let user = UserFeeProfile {
            aggressive_factor: 80.0,
            passive_factor: 120.0,
            ..UserFeeProfile::default()
        };

        let quoted = engine
            .transaction_fee(&user, &contract, 1_000_000, None)
            .unwrap()[0]
            .amount;
        let aggressive = engine
            .transaction_fee(&user, &contract, 1_000_000, Some(Side::Aggressive))
            .unwrap()[0]
            .amount;
        let passive = engine
            .transaction_fee(&user, &contract, 1_000_000, Some(Side::Passive))
            .unwrap()[0]
            .amount;
        assert!(quoted >= aggressive);
        assert!(quoted >= passive);
        assert_eq!(quoted, passive.max(aggressive));
    }

    #[test]
    fn test_trial_period_waives_everything() {
        let engine = FeeEngine::new(true);
        let contract = future_with_fees();
        let user = UserFeeProfile::default();

        assert!(engine
            .transaction_fee(&user, &contract, 1_000_000, None)
            .unwrap()
            .is_empty());
        assert!(engine.deposit_fee(&user, &contract, 1_000_000).is_empty());
        assert!(engine.withdraw_fee(&user, &contract, 1_000_000).is_empty());
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let engine = FeeEngine::new(false);
        // base = 0 + 500 * 10 / 10000 = 0.5 -> rounds up, not to even
        let contract = peso().with_deposit_fees(0, 10);
        let user = UserFeeProfile::default();
        assert_eq!(engine.deposit_fee(&user, &contract, 500)[0].amount, 1);
    }
}
