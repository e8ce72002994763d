use super::types::{
    BENCHMARK_GROWTH_RATE, DEFAULT_HORIZON_YEARS, FALLBACK_YIELD, FireResult, MAX_PROJECTION_YEARS,
    Milestone, PortfolioMetrics, ProjectionAssumptions, ProjectionRow, SAFE_WITHDRAWAL_RATE,
    SCENARIO_COMPARISON_YEARS, Scenario, ScenarioResult,
};

pub fn assumed_yield(metrics: &PortfolioMetrics) -> f64 {
    if metrics.portfolio_yield > 0.0 {
        metrics.portfolio_yield / 100.0
    } else {
        FALLBACK_YIELD
    }
}

// Row 0 is the snapshot itself. Rows keep full precision, see `round_rows`.
pub fn project(
    metrics: &PortfolioMetrics,
    assumptions: &ProjectionAssumptions,
    horizon_years: u32,
) -> Vec<ProjectionRow> {
    let horizon_years = horizon_years.min(MAX_PROJECTION_YEARS);
    let metrics = metrics.sanitized();
    let assumptions = assumptions.sanitized();

    let mut portfolio_value = metrics.total_portfolio_value;
    let mut sp500_value = metrics.total_portfolio_value;
    let mut cumulative_contributions = metrics.total_portfolio_value;
    let yield_rate = assumed_yield(&metrics);
    let dividend_growth = 1.0 + assumptions.dividend_growth_rate / 100.0;
    let yearly_investment = assumptions.yearly_investment();

    let mut rows = Vec::with_capacity(horizon_years as usize + 1);
    rows.push(ProjectionRow::new(
        0,
        portfolio_value,
        metrics.total_annual_dividends,
        cumulative_contributions,
        sp500_value,
    ));

    for year in 1..=horizon_years {
        portfolio_value += yearly_investment;
        cumulative_contributions += yearly_investment;
        portfolio_value *= 1.0 + assumptions.portfolio_growth_rate;
        sp500_value = (sp500_value + yearly_investment) * (1.0 + BENCHMARK_GROWTH_RATE);

        // Growth compounds from the start of the run, not from last year's payout.
        let annual_dividends = portfolio_value * yield_rate * dividend_growth.powi(year as i32);
        if assumptions.reinvest_dividends {
            portfolio_value += annual_dividends;
        }

        rows.push(ProjectionRow::new(
            year,
            portfolio_value,
            annual_dividends,
            cumulative_contributions,
            sp500_value,
        ));
    }

    rows
}

pub fn round_rows(rows: &[ProjectionRow]) -> Vec<ProjectionRow> {
    rows.iter().map(ProjectionRow::rounded).collect()
}

pub fn compute_fire(
    metrics: &PortfolioMetrics,
    assumptions: &ProjectionAssumptions,
    series: &[ProjectionRow],
) -> FireResult {
    let metrics = metrics.sanitized();
    let monthly_expenses = assumptions.sanitized().monthly_expenses_in_retirement;
    let annual_expenses = monthly_expenses * 12.0;
    let current_yield = assumed_yield(&metrics);
    let current_monthly_dividends = metrics.total_annual_dividends / 12.0;

    let progress_percentage = if monthly_expenses > 0.0 {
        (current_monthly_dividends / monthly_expenses * 100.0).min(100.0)
    } else {
        0.0
    };

    FireResult {
        fire_number: annual_expenses / SAFE_WITHDRAWAL_RATE,
        dividend_fire_number: annual_expenses / current_yield,
        annual_expenses,
        current_yield_percent: current_yield * 100.0,
        current_monthly_dividends,
        progress_percentage,
        years_to_fire: years_to_fire(series, monthly_expenses),
        milestone: Milestone::from_progress(progress_percentage),
    }
}

// Income is not monotonic under negative growth, so scan every row.
pub fn years_to_fire(series: &[ProjectionRow], monthly_expenses: f64) -> Option<u32> {
    series
        .iter()
        .find(|row| row.monthly_income >= monthly_expenses)
        .map(|row| row.year)
}

pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "Conservative".to_string(),
            portfolio_growth: 0.05,
            dividend_growth: 3.0,
        },
        Scenario {
            name: "Moderate".to_string(),
            portfolio_growth: 0.07,
            dividend_growth: 5.0,
        },
        Scenario {
            name: "Aggressive".to_string(),
            portfolio_growth: 0.10,
            dividend_growth: 7.0,
        },
    ]
}

pub fn compare_scenarios(
    metrics: &PortfolioMetrics,
    base: &ProjectionAssumptions,
    scenarios: &[Scenario],
) -> Vec<ScenarioResult> {
    scenarios
        .iter()
        .map(|scenario| {
            let assumptions = ProjectionAssumptions {
                portfolio_growth_rate: scenario.portfolio_growth,
                dividend_growth_rate: scenario.dividend_growth,
                ..*base
            };

            let short = project(metrics, &assumptions, SCENARIO_COMPARISON_YEARS);
            let full = project(metrics, &assumptions, DEFAULT_HORIZON_YEARS);
            let fire = compute_fire(metrics, &assumptions, &full);

            ScenarioResult {
                name: scenario.name.clone(),
                portfolio_growth: scenario.portfolio_growth,
                dividend_growth: scenario.dividend_growth,
                ten_year_monthly_income: short.last().map_or(0.0, |row| row.monthly_income),
                final_portfolio_value: full.last().map_or(0.0, |row| row.portfolio_value),
                years_to_fire: fire.years_to_fire,
            }
        })
        .collect()
}
