// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-token pricing and cost calculation in integer sub-units.
//!
//! Rates are configured in USD per 1,000 tokens and converted once, at
//! startup, to pico-USD (1e-12 USD) per token. Every cost computed from there
//! on is an exact integer; the running total is kept in micro-USD.
//!
//! input  = prompt_tokens     * input_pico_per_token
//! output = completion_tokens * output_pico_per_token

use serde::Serialize;

use nexus_config::model::CostConfig;
use nexus_core::types::Usage;

/// Pico-USD per USD.
pub const PICO_PER_USD: u64 = 1_000_000_000_000;

/// Pico-USD per micro-USD.
pub const PICO_PER_MICRO: u64 = 1_000_000;

/// Per-token rates in pico-USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub input_pico_per_token: u64,
    pub output_pico_per_token: u64,
}

impl Pricing {
    pub fn new(input_pico_per_token: u64, output_pico_per_token: u64) -> Self {
        Self {
            input_pico_per_token,
            output_pico_per_token,
        }
    }

    /// Converts USD-per-1k rates. Precision below 1e-9 USD per 1k tokens is lost.
    pub fn from_config(config: &CostConfig) -> Self {
        Self::new(
            per_1k_to_pico_per_token(config.input_cost_per_1k),
            per_1k_to_pico_per_token(config.output_cost_per_1k),
        )
    }
}

fn per_1k_to_pico_per_token(usd_per_1k: f64) -> u64 {
    // usd/1k tokens * 1e12 pico/usd / 1e3 tokens
    let pico = (usd_per_1k * 1e9).round();
    if pico.is_finite() && pico > 0.0 {
        pico as u64
    } else {
        0
    }
}

/// Exact cost of one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostBreakdown {
    pub input_pico: u128,
    pub output_pico: u128,
}

impl CostBreakdown {
    pub fn total_pico(&self) -> u128 {
        self.input_pico + self.output_pico
    }

    /// Total rounded half-up to whole micro-USD, the unit of the running counter.
    pub fn total_micro(&self) -> u64 {
        let half = u128::from(PICO_PER_MICRO / 2);
        let micro = (self.total_pico() + half) / u128::from(PICO_PER_MICRO);
        u64::try_from(micro).unwrap_or(u64::MAX)
    }

    pub fn usd(&self) -> CostUsd {
        CostUsd {
            input_cost_usd: pico_to_usd(self.input_pico),
            output_cost_usd: pico_to_usd(self.output_pico),
            total_cost_usd: pico_to_usd(self.total_pico()),
        }
    }
}

/// Display form of a [`CostBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostUsd {
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub total_cost_usd: f64,
}

/// Converts pico-USD to a float for display only.
pub fn pico_to_usd(pico: u128) -> f64 {
    let whole = pico / u128::from(PICO_PER_USD);
    let frac = pico % u128::from(PICO_PER_USD);
    whole as f64 + frac as f64 / PICO_PER_USD as f64
}

/// Converts a micro-USD counter value to a float for display only.
pub fn micro_to_usd(micro: i64) -> f64 {
    micro as f64 / 1_000_000.0
}

/// Cost of a completion from the provider-reported usage.
pub fn calculate_cost(usage: &Usage, pricing: &Pricing) -> CostBreakdown {
    CostBreakdown {
        input_pico: u128::from(usage.prompt_tokens) * u128::from(pricing.input_pico_per_token),
        output_pico: u128::from(usage.completion_tokens)
            * u128::from(pricing.output_pico_per_token),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn default_pricing() -> Pricing {
        Pricing::from_config(&CostConfig::default())
    }

    fn usage(prompt: u64, completion: u64) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[test]
    fn default_rates_convert_exactly() {
        let p = default_pricing();
        assert_eq!(p.input_pico_per_token, 150_000);
        assert_eq!(p.output_pico_per_token, 600_000);
    }

    #[test]
    fn calculate_cost_matches_per_1k_formula() {
        let cost = calculate_cost(&usage(1000, 500), &default_pricing());
        // 1000/1000 * 0.00015 and 500/1000 * 0.0006
        assert_eq!(cost.input_pico, 150_000_000);
        assert_eq!(cost.output_pico, 300_000_000);
        let usd = cost.usd();
        assert!((usd.input_cost_usd - 0.00015).abs() < 1e-15);
        assert!((usd.output_cost_usd - 0.0003).abs() < 1e-15);
        assert!((usd.total_cost_usd - 0.00045).abs() < 1e-15);
        assert_eq!(cost.total_micro(), 450);
    }

    #[test]
    fn zero_tokens_zero_cost() {
        let cost = calculate_cost(&Usage::default(), &default_pricing());
        assert_eq!(cost.total_pico(), 0);
        assert_eq!(cost.total_micro(), 0);
    }

    #[test]
    fn micro_rounding_is_half_up() {
        let cost = CostBreakdown {
            input_pico: 499_999,
            output_pico: 0,
        };
        assert_eq!(cost.total_micro(), 0);
        let cost = CostBreakdown {
            input_pico: 500_000,
            output_pico: 0,
        };
        assert_eq!(cost.total_micro(), 1);
    }

    #[test]
    fn negative_or_nan_rates_are_free() {
        let p = Pricing::from_config(&CostConfig {
            input_cost_per_1k: -1.0,
            output_cost_per_1k: f64::NAN,
        });
        assert_eq!(p, Pricing::new(0, 0));
    }

    #[test]
    fn micro_counter_displays_as_usd() {
        assert!((micro_to_usd(1_234_567) - 1.234567).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn cost_is_additive(
            a in 0u64..1_000_000,
            b in 0u64..1_000_000,
            c in 0u64..1_000_000,
        ) {
            let p = default_pricing();
            let split = calculate_cost(&usage(a, c), &p).total_pico()
                + calculate_cost(&usage(b, 0), &p).total_pico();
            let joined = calculate_cost(&usage(a + b, c), &p).total_pico();
            prop_assert_eq!(split, joined);
        }
    }
}
