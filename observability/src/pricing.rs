//! Per-model token pricing used for derived cost estimates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// USD per 1,000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelPrice {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }
}

const DEFAULT_PRICE: ModelPrice = ModelPrice::new(0.001, 0.002);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
    fallback: ModelPrice,
}

impl Default for PriceTable {
    fn default() -> Self {
        let prices = [
            ("gpt-4o", ModelPrice::new(0.0025, 0.01)),
            ("gpt-4o-mini", ModelPrice::new(0.00015, 0.0006)),
            ("gpt-4", ModelPrice::new(0.03, 0.06)),
            ("gpt-4-turbo", ModelPrice::new(0.01, 0.03)),
            ("gpt-3.5-turbo", ModelPrice::new(0.0005, 0.0015)),
            ("claude-3-opus", ModelPrice::new(0.015, 0.075)),
            ("claude-3-sonnet", ModelPrice::new(0.003, 0.015)),
            ("claude-3-haiku", ModelPrice::new(0.00025, 0.00125)),
            ("gemini-1.5-pro", ModelPrice::new(0.00125, 0.005)),
            ("gemini-1.5-flash", ModelPrice::new(0.000075, 0.0003)),
        ]
        .into_iter()
        .map(|(model, price)| (model.to_string(), price))
        .collect();

        Self {
            prices,
            fallback: DEFAULT_PRICE,
        }
    }
}

impl PriceTable {
    pub fn empty(fallback: ModelPrice) -> Self {
        Self {
            prices: HashMap::new(),
            fallback,
        }
    }

    pub fn with_price(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.prices.insert(model.into(), price);
        self
    }

    pub fn price_for(&self, model: &str) -> ModelPrice {
        self.prices.get(model).copied().unwrap_or(self.fallback)
    }

    pub fn is_known(&self, model: &str) -> bool {
        self.prices.contains_key(model)
    }

    /// Never negative or non-finite, whatever the table holds.
    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        let price = self.price_for(model);
        let cost = input_tokens as f64 / 1000.0 * price.input_per_1k
            + output_tokens as f64 / 1000.0 * price.output_per_1k;
        ai_core::types::sanitize_cost(cost)
    }
}
