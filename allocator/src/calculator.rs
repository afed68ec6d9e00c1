use super::coerce::parse_amount;
use super::types::{
    ANNUITY_AFTER_TAX_FACTOR, ANNUITY_RATE, ANNUITY_YEARS, Allocation, AllocationConfig,
    PayoutMode,
};

/// Turns a jackpot into taxes, net proceeds and the wallet/savings split.
///
/// Pure: the same config and inputs always give the same allocation.
#[derive(Debug, Clone)]
pub struct AllocationCalculator {
    config: AllocationConfig,
}

impl Default for AllocationCalculator {
    fn default() -> Self {
        Self::new(AllocationConfig::default())
    }
}

impl AllocationCalculator {
    pub fn new(config: AllocationConfig) -> Self {
        AllocationCalculator { config }
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// Allocates an amount typed by the player. Malformed text counts as zero.
    pub fn allocate_raw(
        &self,
        raw_amount: &str,
        jurisdiction: &str,
        payout: PayoutMode,
    ) -> Allocation {
        self.allocate(parse_amount(raw_amount), jurisdiction, payout)
    }

    pub fn allocate(
        &self,
        entry_amount: f64,
        jurisdiction: &str,
        payout: PayoutMode,
    ) -> Allocation {
        let mut amount = self.clamp_entry(entry_amount);

        if payout == PayoutMode::Annuity {
            amount = annuity_equivalent(amount);
        }

        let federal_tax = amount * self.config.taxes.federal_rate;
        let jurisdiction_tax = amount * self.config.taxes.jurisdiction_rate(jurisdiction);
        let net = (amount - (federal_tax + jurisdiction_tax)).max(0.0);
        let savings = net * self.config.savings_fraction;
        let wallet = net - savings;

        Allocation {
            gross: amount,
            federal_tax,
            jurisdiction_tax,
            net,
            savings,
            wallet,
        }
    }

    /// Non-finite and negative amounts become 0; large ones are capped at the configured maximum.
    fn clamp_entry(&self, entry_amount: f64) -> f64 {
        if !entry_amount.is_finite() {
            return 0.0;
        }
        entry_amount.max(0.0).min(self.config.max_entry_amount)
    }
}

/// Estimated after-tax total of a 30-year, 4% level annuity funded by `amount`.
pub fn annuity_equivalent(amount: f64) -> f64 {
    if amount == 0.0 {
        return 0.0;
    }
    let payment = amount * ANNUITY_RATE / (1.0 - (1.0 + ANNUITY_RATE).powi(-ANNUITY_YEARS));
    payment * ANNUITY_YEARS as f64 * ANNUITY_AFTER_TAX_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxTable;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        let tolerance = EPS * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn setup_calculator() -> AllocationCalculator {
        AllocationCalculator::default()
    }

    #[test]
    fn test_lump_sum_allocation() {
        let calc = setup_calculator();
        let result = calc.allocate(1_000_000.0, "CA", PayoutMode::Lump);

        assert_approx(result.gross, 1_000_000.0);
        assert_approx(result.federal_tax, 240_000.0);
        assert_approx(result.jurisdiction_tax, 133_000.0);
        assert_approx(result.net, 627_000.0);
        assert_approx(result.savings, 125_400.0);
        assert_approx(result.wallet, 501_600.0);
        assert_approx(result.total_tax(), 373_000.0);
    }

    #[test]
    fn test_unknown_jurisdiction_has_no_local_tax() {
        let calc = setup_calculator();
        let result = calc.allocate(500_000.0, "XX", PayoutMode::Lump);

        assert_eq!(result.jurisdiction_tax, 0.0);
        assert_approx(result.net, 380_000.0);
    }

    #[test]
    fn test_annuity_zero_amount() {
        let calc = setup_calculator();
        let result = calc.allocate(0.0, "MI", PayoutMode::Annuity);

        assert_eq!(result.gross, 0.0);
        assert_eq!(result.net, 0.0);
        assert_eq!(result.wallet, 0.0);
        assert_eq!(result.savings, 0.0);
    }

    #[test]
    fn test_annuity_hundred_million() {
        let calc = setup_calculator();
        let result = calc.allocate(100_000_000.0, "MI", PayoutMode::Annuity);

        let payment = 100_000_000.0 * 0.04 / (1.0 - 1.04f64.powi(-30));
        let expected_gross = payment * 30.0 * 0.55;
        assert_approx(expected_gross, 95_419_663.570_541_17);
        assert_approx(result.gross, expected_gross);
        assert_approx(result.federal_tax, 22_900_719.256_929_88);
        assert_approx(result.jurisdiction_tax, 4_055_335.701_748);
        assert_approx(result.net, 68_463_608.611_863_29);
    }

    #[test]
    fn test_entry_above_cap_is_clamped() {
        let calc = AllocationCalculator::new(AllocationConfig {
            max_entry_amount: 1_000_000.0,
            ..Default::default()
        });
        let clamped = calc.allocate(9_000_000.0, "TX", PayoutMode::Lump);
        let at_cap = calc.allocate(1_000_000.0, "TX", PayoutMode::Lump);

        assert_eq!(clamped, at_cap);
        assert_approx(clamped.federal_tax, 240_000.0);
    }

    #[test]
    fn test_cap_applies_before_annuity_conversion() {
        let calc = AllocationCalculator::new(AllocationConfig {
            max_entry_amount: 1_000_000.0,
            ..Default::default()
        });
        let result = calc.allocate(5_000_000.0, "TX", PayoutMode::Annuity);

        assert_approx(result.gross, annuity_equivalent(1_000_000.0));
    }

    #[test]
    fn test_malformed_amount_yields_zero() {
        let calc = setup_calculator();
        let result = calc.allocate_raw("a billion dollars", "NY", PayoutMode::Lump);

        assert_eq!(result, Allocation::default());
    }

    #[test]
    fn test_raw_amount_with_separators() {
        let calc = setup_calculator();
        let result = calc.allocate_raw("1,000,000", "FL", PayoutMode::Lump);

        assert_approx(result.net, 760_000.0);
    }

    #[test]
    fn test_non_finite_entry_is_zero() {
        let calc = setup_calculator();
        assert_eq!(
            calc.allocate(f64::NAN, "MI", PayoutMode::Lump),
            Allocation::default()
        );
        assert_eq!(
            calc.allocate(f64::INFINITY, "MI", PayoutMode::Lump),
            Allocation::default()
        );
    }

    #[test]
    fn test_custom_savings_fraction() {
        let calc = AllocationCalculator::new(AllocationConfig {
            savings_fraction: 0.10,
            ..Default::default()
        });
        let result = calc.allocate(100.0, "TX", PayoutMode::Lump);

        assert_approx(result.savings, 7.6);
        assert_approx(result.wallet, 68.4);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_wallet_plus_savings_is_net(
            amount in 0.0f64..5_000_000_000.0,
            idx in 0usize..12,
            annuity in proptest::bool::ANY,
        ) {
            let table = TaxTable::default();
            let mut codes: Vec<String> = table.jurisdiction_rates.keys().cloned().collect();
            codes.push("ZZ".to_string());
            codes.push(String::new());
            let code = &codes[idx % codes.len()];
            let payout = if annuity { PayoutMode::Annuity } else { PayoutMode::Lump };

            let result = setup_calculator().allocate(amount, code, payout);

            prop_assert!(result.net >= 0.0);
            prop_assert!(result.wallet >= 0.0);
            prop_assert!(result.savings >= 0.0);
            prop_assert!((result.wallet + result.savings - result.net).abs() <= 1e-6 * result.net.max(1.0));
        }

        #[test]
        fn prop_taxes_follow_flat_rates(amount in 0.0f64..2_500_000_000.0, idx in 0usize..11) {
            let table = TaxTable::default();
            let mut codes: Vec<String> = table.jurisdiction_rates.keys().cloned().collect();
            codes.push("??".to_string());
            let code = &codes[idx % codes.len()];

            let result = setup_calculator().allocate(amount, code, PayoutMode::Lump);

            prop_assert!(result.federal_tax == amount * 0.24);
            prop_assert!(result.jurisdiction_tax == amount * table.jurisdiction_rate(code));
            if code == "??" {
                prop_assert!(result.jurisdiction_tax == 0.0);
            }
        }
    }
}
