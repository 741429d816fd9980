use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[serde(alias = "payDownExtra", alias = "pay_down_extra")]
    PayDownExtra,
    Invest,
    #[serde(alias = "doNothing", alias = "do_nothing")]
    DoNothing,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::PayDownExtra => "Accelerated mortgage payoff",
            Strategy::Invest => "Invest in index funds",
            Strategy::DoNothing => "Do nothing",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Strategy::PayDownExtra => "Pay down",
            Strategy::Invest => "Invest",
            Strategy::DoNothing => "Nothing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    pub house_value: f64,
    pub principal: f64,
    pub mortgage_rate_annual: f64,
    pub term_years: u32,
    pub investment_rate_annual: f64,
    pub strategy: Strategy,
    /// Yearly amount: extra principal for `PayDownExtra`, extra investment for `Invest`.
    pub extra_contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub accumulated_value: f64,
    pub capital_contributed: f64,
    pub net_return: f64,
    pub return_ratio_percent: f64,
    pub interest_paid: f64,
    pub payoff_months: u32,
    pub summary_text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: u64,
    pub name: String,
    pub input: ScenarioInput,
    pub result: ScenarioResult,
}

impl Scenario {
    pub fn headline(&self) -> String {
        format!(
            "Mortgage: {} years, Principal: {}€, Strategy: {} (Investment: {:.2} €)",
            self.input.term_years,
            self.input.principal,
            self.input.strategy.short_label(),
            self.result.accumulated_value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{quantity} is not a finite number for these inputs")]
    NumericDegeneracy { quantity: &'static str },
}

impl SimulationError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SimulationError::Validation {
            field,
            message: message.into(),
        }
    }
}
