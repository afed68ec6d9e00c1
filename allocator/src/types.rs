use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Average federal withholding applied to every jackpot.
pub const FEDERAL_TAX_RATE: f64 = 0.24;

/// Share of net proceeds set aside as savings; the rest lands in the wallet.
pub const DEFAULT_SAVINGS_FRACTION: f64 = 0.20;

/// Largest entry amount accepted before tax computation. Anything above is clamped.
pub const DEFAULT_MAX_ENTRY_AMOUNT: f64 = 2_500_000_000.0;

pub const ANNUITY_YEARS: i32 = 30;
pub const ANNUITY_RATE: f64 = 0.04;
/// Flat multiplier approximating per-payment taxes on annuity proceeds.
pub const ANNUITY_AFTER_TAX_FACTOR: f64 = 0.55;

const JURISDICTION_RATES: [(&str, f64); 10] = [
    ("MI", 0.0425),
    ("CA", 0.133),
    ("TX", 0.00),
    ("FL", 0.00),
    ("NY", 0.109),
    ("IL", 0.0495),
    ("PA", 0.0307),
    ("OH", 0.04),
    ("NJ", 0.1075),
    ("GA", 0.0575),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutMode {
    /// One-time cash payment
    #[default]
    Lump,
    /// 30-year level payments, converted to an estimated after-tax total
    Annuity,
}

impl PayoutMode {
    /// Lenient parse of form input: only "annuity" selects annuity mode.
    pub fn from_form(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("annuity") {
            PayoutMode::Annuity
        } else {
            PayoutMode::Lump
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMode::Lump => "lump",
            PayoutMode::Annuity => "annuity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxTable {
    pub federal_rate: f64,
    pub jurisdiction_rates: BTreeMap<String, f64>,
}

impl Default for TaxTable {
    fn default() -> Self {
        Self {
            federal_rate: FEDERAL_TAX_RATE,
            jurisdiction_rates: JURISDICTION_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl TaxTable {
    /// Rate for a jurisdiction code, 0 when the code is not in the table.
    pub fn jurisdiction_rate(&self, jurisdiction: &str) -> f64 {
        let key = jurisdiction.trim().to_ascii_uppercase();
        self.jurisdiction_rates.get(&key).copied().unwrap_or(0.0)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("savings fraction must be within [0, 1], got {0}")]
    SavingsFraction(f64),

    #[error("maximum entry amount must be a finite non-negative number, got {0}")]
    MaxEntryAmount(f64),
}

/// Process-wide constants injected into the calculator at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationConfig {
    pub taxes: TaxTable,
    pub savings_fraction: f64,
    pub max_entry_amount: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            taxes: TaxTable::default(),
            savings_fraction: DEFAULT_SAVINGS_FRACTION,
            max_entry_amount: DEFAULT_MAX_ENTRY_AMOUNT,
        }
    }
}

impl AllocationConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&self.savings_fraction) {
            return Err(ConfigError::SavingsFraction(self.savings_fraction));
        }
        if !self.max_entry_amount.is_finite() || self.max_entry_amount < 0.0 {
            return Err(ConfigError::MaxEntryAmount(self.max_entry_amount));
        }
        Ok(self)
    }
}

/// Derived figures for one entry submission. Every field is non-negative.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Allocation {
    /// Amount taxes are computed from, after clamping and annuity conversion
    pub gross: f64,
    pub federal_tax: f64,
    pub jurisdiction_tax: f64,
    pub net: f64,
    pub savings: f64,
    pub wallet: f64,
}

impl Allocation {
    pub fn total_tax(&self) -> f64 {
        self.federal_tax + self.jurisdiction_tax
    }
}
