//! Slippage and fee model expressed in basis points.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Basis points per unit (1 bps = 0.01%).
pub const BPS_PER_UNIT: f64 = 10_000.0;

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Trading cost configuration. All values are basis points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Slippage paid on entry fills.
    pub entry_slippage_bps: f64,
    /// Slippage paid on exit fills.
    pub exit_slippage_bps: f64,
    /// Taker fee charged on both sides.
    pub taker_fee_bps: f64,
    /// Annualized borrow rate for financed positions.
    pub borrow_apr_bps: f64,
}

impl CostConfig {
    /// Create a cost config with symmetric slippage and a taker fee.
    pub fn new(slippage_bps: f64, taker_fee_bps: f64) -> Self {
        Self {
            entry_slippage_bps: slippage_bps,
            exit_slippage_bps: slippage_bps,
            taker_fee_bps,
            borrow_apr_bps: 0.0,
        }
    }

    /// Set the annualized borrow rate.
    pub fn with_borrow_apr(mut self, borrow_apr_bps: f64) -> Self {
        self.borrow_apr_bps = borrow_apr_bps;
        self
    }

    /// Multiplier applied to the raw entry price (>= 1).
    pub fn entry_multiplier(&self) -> f64 {
        1.0 + (self.entry_slippage_bps + self.taker_fee_bps) / BPS_PER_UNIT
    }

    /// Multiplier applied to raw exit prices, floored at zero.
    pub fn exit_multiplier(&self) -> f64 {
        (1.0 - (self.exit_slippage_bps + self.taker_fee_bps) / BPS_PER_UNIT).max(0.0)
    }

    /// Borrow cost for a holding period, as a fraction of notional.
    pub fn borrow_cost_fraction(&self, hold_seconds: i64) -> f64 {
        if hold_seconds <= 0 {
            return 0.0;
        }
        self.borrow_apr_bps / BPS_PER_UNIT * (hold_seconds as f64 / SECONDS_PER_YEAR)
    }

    /// Reject negative or non-finite basis points.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("costs.entry_slippage_bps", self.entry_slippage_bps),
            ("costs.exit_slippage_bps", self.exit_slippage_bps),
            ("costs.taker_fee_bps", self.taker_fee_bps),
            ("costs.borrow_apr_bps", self.borrow_apr_bps),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::out_of_range(field, "must be >= 0"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_costs_are_neutral() {
        let costs = CostConfig::default();
        assert_eq!(costs.entry_multiplier(), 1.0);
        assert_eq!(costs.exit_multiplier(), 1.0);
    }

    #[test]
    fn test_multipliers() {
        let costs = CostConfig {
            entry_slippage_bps: 50.0,
            exit_slippage_bps: 30.0,
            taker_fee_bps: 25.0,
            borrow_apr_bps: 0.0,
        };
        // 1 + 75 / 10000
        assert!((costs.entry_multiplier() - 1.0075).abs() < 1e-12);
        // 1 - 55 / 10000
        assert!((costs.exit_multiplier() - 0.9945).abs() < 1e-12);
    }

    #[test]
    fn test_exit_multiplier_floor() {
        let costs = CostConfig::new(9_000.0, 2_000.0);
        assert_eq!(costs.exit_multiplier(), 0.0);
    }

    #[test]
    fn test_borrow_cost() {
        let costs = CostConfig::default().with_borrow_apr(1_000.0); // 10% APR
        let one_year = 365 * 24 * 3600;
        assert!((costs.borrow_cost_fraction(one_year) - 0.10).abs() < 1e-12);
        assert!((costs.borrow_cost_fraction(one_year / 2) - 0.05).abs() < 1e-12);
        assert_eq!(costs.borrow_cost_fraction(-10), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(CostConfig::new(10.0, 5.0).validate().is_ok());

        let negative = CostConfig::new(-1.0, 5.0);
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::OutOfRange { field: "costs.entry_slippage_bps", .. })
        ));

        let nan = CostConfig::new(1.0, f64::NAN);
        assert_eq!(
            nan.validate(),
            Err(ConfigError::NonFinite { field: "costs.taker_fee_bps" })
        );
    }
}
