mod engine;
mod financing;
mod types;

pub use engine::{
    AmortizationSchedule, AmortizationState, COMPARISON_HORIZON_YEARS, MONTHS_PER_YEAR, amortize,
    future_value_of_annuity, monthly_payment, monthly_rate, return_ratio_percent, run_simulation,
};
pub use financing::{financed_percent, principal_for_percent};
pub use types::{Scenario, ScenarioInput, ScenarioResult, SimulationError, Strategy};
