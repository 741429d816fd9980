use super::types::{ScenarioInput, ScenarioResult, SimulationError, Strategy};

pub const COMPARISON_HORIZON_YEARS: u32 = 30;
pub const MONTHS_PER_YEAR: u32 = 12;

const COMPARISON_HORIZON_MONTHS: u32 = COMPARISON_HORIZON_YEARS * MONTHS_PER_YEAR;
/// Half a cent. Anything below this is floating-point residue, not debt.
const SETTLED_BALANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy)]
pub struct AmortizationSchedule {
    pub monthly_rate: f64,
    pub payment: f64,
    pub annual_extra: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationState {
    pub balance: f64,
    pub interest_paid: f64,
    pub month: u32,
}

impl AmortizationState {
    pub fn start(principal: f64) -> Self {
        Self {
            balance: principal,
            interest_paid: 0.0,
            month: 0,
        }
    }

    pub fn is_settled(self) -> bool {
        self.balance <= SETTLED_BALANCE
    }

    pub fn step(self, schedule: &AmortizationSchedule) -> Self {
        let month = self.month + 1;
        let interest = self.balance * schedule.monthly_rate;
        let amortized = (schedule.payment - interest).min(self.balance);
        let mut balance = self.balance - amortized;

        if month % MONTHS_PER_YEAR == 0 && balance > 0.0 {
            balance -= schedule.annual_extra.min(balance);
        }

        Self {
            balance,
            interest_paid: self.interest_paid + interest,
            month,
        }
    }
}

pub fn amortize(
    principal: f64,
    schedule: &AmortizationSchedule,
    max_months: u32,
) -> AmortizationState {
    let mut state = AmortizationState::start(principal);
    while !state.is_settled() && state.month < max_months {
        state = state.step(schedule);
    }
    state
}

pub fn monthly_rate(annual_percent: f64) -> f64 {
    annual_percent / 100.0 / 12.0
}

/// A zero rate degrades to straight-line repayment. Growth terms go through
/// `ln_1p`/`exp_m1` so tiny positive rates converge on the same limit.
pub fn monthly_payment(principal: f64, monthly_rate: f64, term_months: u32) -> f64 {
    let periods = term_months as f64;
    if monthly_rate == 0.0 {
        return principal / periods;
    }
    let discounted = -(-periods * monthly_rate.ln_1p()).exp_m1();
    principal * monthly_rate / discounted
}

/// Contributions at period end. A zero rate degrades to the plain sum.
pub fn future_value_of_annuity(payment: f64, rate: f64, periods: u32) -> f64 {
    let periods = periods as f64;
    if rate == 0.0 {
        return payment * periods;
    }
    payment * (periods * rate.ln_1p()).exp_m1() / rate
}

pub fn return_ratio_percent(net_return: f64, capital_contributed: f64) -> f64 {
    if capital_contributed > 0.0 {
        net_return / capital_contributed * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
struct StrategyOutcome {
    accumulated_value: f64,
    capital_contributed: f64,
    interest_paid: f64,
    payoff_months: u32,
}

#[derive(Debug, Clone, Copy)]
struct Rates {
    mortgage_monthly: f64,
    investment_monthly: f64,
    investment_annual: f64,
}

pub fn run_simulation(input: &ScenarioInput) -> Result<ScenarioResult, SimulationError> {
    validate_input(input)?;

    let term_months = input.term_years * MONTHS_PER_YEAR;
    let rates = Rates {
        mortgage_monthly: monthly_rate(input.mortgage_rate_annual),
        investment_monthly: monthly_rate(input.investment_rate_annual),
        investment_annual: input.investment_rate_annual / 100.0,
    };
    let payment = monthly_payment(input.principal, rates.mortgage_monthly, term_months);
    if !payment.is_finite() {
        return Err(SimulationError::NumericDegeneracy {
            quantity: "monthlyPayment",
        });
    }

    let outcome = match input.strategy {
        Strategy::PayDownExtra => simulate_pay_down_extra(input, payment, rates, term_months),
        Strategy::Invest => simulate_invest(input, payment, rates, term_months),
        Strategy::DoNothing => simulate_do_nothing(input, payment, term_months),
    };

    let net_return = outcome.accumulated_value - outcome.capital_contributed;
    let ratio = return_ratio_percent(net_return, outcome.capital_contributed);
    ensure_finite(&[
        ("accumulatedValue", outcome.accumulated_value),
        ("capitalContributed", outcome.capital_contributed),
        ("interestPaid", outcome.interest_paid),
        ("netReturn", net_return),
        ("returnRatioPercent", ratio),
    ])?;

    tracing::debug!(
        strategy = ?input.strategy,
        payment,
        payoff_months = outcome.payoff_months,
        accumulated_value = outcome.accumulated_value,
        capital_contributed = outcome.capital_contributed,
        "simulation complete"
    );

    Ok(ScenarioResult {
        accumulated_value: outcome.accumulated_value,
        capital_contributed: outcome.capital_contributed,
        net_return,
        return_ratio_percent: ratio,
        interest_paid: outcome.interest_paid,
        payoff_months: outcome.payoff_months,
        summary_text: summary_text(input, &outcome, net_return, ratio),
    })
}

fn simulate_pay_down_extra(
    input: &ScenarioInput,
    payment: f64,
    rates: Rates,
    term_months: u32,
) -> StrategyOutcome {
    let schedule = AmortizationSchedule {
        monthly_rate: rates.mortgage_monthly,
        payment,
        annual_extra: input.extra_contribution,
    };
    let payoff = amortize(input.principal, &schedule, term_months * 2);
    let months_investing = COMPARISON_HORIZON_MONTHS.saturating_sub(payoff.month);

    StrategyOutcome {
        accumulated_value: future_value_of_annuity(
            payment,
            rates.investment_monthly,
            months_investing,
        ),
        capital_contributed: payment * months_investing as f64,
        interest_paid: payoff.interest_paid,
        payoff_months: payoff.month,
    }
}

fn simulate_invest(
    input: &ScenarioInput,
    payment: f64,
    rates: Rates,
    term_months: u32,
) -> StrategyOutcome {
    let growth_years = COMPARISON_HORIZON_YEARS - input.term_years;
    let freed_months = growth_years * MONTHS_PER_YEAR;

    let contributions_at_payoff = future_value_of_annuity(
        input.extra_contribution,
        rates.investment_annual,
        input.term_years,
    );
    let contributions_at_horizon =
        contributions_at_payoff * (1.0 + rates.investment_annual).powf(growth_years as f64);
    let freed_payment_value =
        future_value_of_annuity(payment, rates.investment_monthly, freed_months);

    StrategyOutcome {
        accumulated_value: contributions_at_horizon + freed_payment_value,
        capital_contributed: input.extra_contribution * input.term_years as f64
            + payment * freed_months as f64,
        interest_paid: nominal_interest(input.principal, payment, term_months),
        payoff_months: term_months,
    }
}

fn simulate_do_nothing(input: &ScenarioInput, payment: f64, term_months: u32) -> StrategyOutcome {
    StrategyOutcome {
        accumulated_value: 0.0,
        capital_contributed: 0.0,
        interest_paid: nominal_interest(input.principal, payment, term_months),
        payoff_months: term_months,
    }
}

// Rounding can leave a sub-cent negative residue when the rate is near zero.
fn nominal_interest(principal: f64, payment: f64, term_months: u32) -> f64 {
    (payment * term_months as f64 - principal).max(0.0)
}

fn summary_text(
    input: &ScenarioInput,
    outcome: &StrategyOutcome,
    net_return: f64,
    ratio: f64,
) -> String {
    let strategy = input.strategy.label();
    match input.strategy {
        Strategy::PayDownExtra => format!(
            "Strategy: {strategy}\n\
             Effective term: {:.1} years\n\
             Interest paid: {:.2} €\n\
             Accumulated value investing the freed payment: {:.2} €\n\
             Total capital invested: {:.2} €\n\
             Net return: {:.2} €\n\
             Return ratio: {:.2} %",
            outcome.payoff_months as f64 / MONTHS_PER_YEAR as f64,
            outcome.interest_paid,
            outcome.accumulated_value,
            outcome.capital_contributed,
            net_return,
            ratio,
        ),
        Strategy::Invest => format!(
            "Strategy: {strategy}\n\
             Mortgage term: {} years\n\
             Interest paid: {:.2} €\n\
             Accumulated value investing extra contributions and the freed payment: {:.2} €\n\
             Total capital invested: {:.2} €\n\
             Net return: {:.2} €\n\
             Return ratio: {:.2} %",
            input.term_years,
            outcome.interest_paid,
            outcome.accumulated_value,
            outcome.capital_contributed,
            net_return,
            ratio,
        ),
        Strategy::DoNothing => format!(
            "Strategy: {strategy}\n\
             Mortgage term: {} years\n\
             Interest paid: {:.2} €\n\
             No investment made, so there is no financial return.",
            input.term_years, outcome.interest_paid,
        ),
    }
}

fn ensure_finite(values: &[(&'static str, f64)]) -> Result<(), SimulationError> {
    for &(quantity, value) in values {
        if !value.is_finite() {
            return Err(SimulationError::NumericDegeneracy { quantity });
        }
    }
    Ok(())
}

fn validate_input(input: &ScenarioInput) -> Result<(), SimulationError> {
    if !input.principal.is_finite() || input.principal <= 0.0 {
        return Err(SimulationError::validation(
            "principal",
            "must be a finite number > 0",
        ));
    }
    if input.term_years == 0 {
        return Err(SimulationError::validation("termYears", "must be > 0"));
    }
    if input.term_years > COMPARISON_HORIZON_YEARS {
        return Err(SimulationError::validation(
            "termYears",
            format!("must be <= {COMPARISON_HORIZON_YEARS}"),
        ));
    }

    let non_negative = [
        ("houseValue", input.house_value),
        ("mortgageRateAnnual", input.mortgage_rate_annual),
        ("investmentRateAnnual", input.investment_rate_annual),
        ("extraContribution", input.extra_contribution),
    ];
    for (field, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::validation(
                field,
                "must be a finite number >= 0",
            ));
        }
    }
    Ok(())
}
