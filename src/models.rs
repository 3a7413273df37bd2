//! Supported chat models, their pricing and sampling parameters.

use std::ops::AddAssign;

/// Pricing and sampling parameters for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelData {
    pub name: &'static str,
    /// USD per 1000 prompt tokens
    pub price_per_1000_input_tokens: f64,
    /// USD per 1000 completion tokens
    pub price_per_1000_output_tokens: f64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl ModelData {
    const fn priced(
        name: &'static str,
        price_per_1000_input_tokens: f64,
        price_per_1000_output_tokens: f64,
    ) -> Self {
        Self {
            name,
            price_per_1000_input_tokens,
            price_per_1000_output_tokens,
            temperature: 0.2,
            max_tokens: 2000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }

    /// Cost in USD of the given token usage.
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        usage.input_tokens as f64 * self.price_per_1000_input_tokens / 1000.0
            + usage.output_tokens as f64 * self.price_per_1000_output_tokens / 1000.0
    }
}

const MODELS: &[ModelData] = &[
    ModelData::priced("gpt-3.5-turbo", 0.0015, 0.002),
    ModelData::priced("gpt-3.5-turbo-16k", 0.003, 0.004),
    ModelData::priced("gpt-4", 0.03, 0.06),
    ModelData::priced("gpt-4-1106-preview", 0.01, 0.03),
    ModelData::priced("gpt-4-0125-preview", 0.01, 0.03),
    ModelData::priced("text-davinci-003", 0.02, 0.02),
];

/// Look up a model by identifier.
pub fn model_data(name: &str) -> Option<&'static ModelData> {
    MODELS.iter().find(|model| model.name == name)
}

/// Token counts reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}
