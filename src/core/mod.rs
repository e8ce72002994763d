mod calculators;
mod engine;
mod metrics;
mod types;

pub use calculators::{SIMPLE_FIRE_MAX_MONTHS, dividend_yield, drip, simple_fire};
pub use engine::{
    assumed_yield, compare_scenarios, compute_fire, default_scenarios, project, round_rows,
    years_to_fire,
};
pub use metrics::{holding_annual_income, holding_market_value, income_breakdown, portfolio_metrics};
pub use types::{
    BENCHMARK_GROWTH_RATE, DEFAULT_HORIZON_YEARS, DripResult, DripYear, FALLBACK_YIELD, FireResult,
    Holding, HoldingIncome, MAX_PROJECTION_YEARS, Milestone, PortfolioMetrics,
    ProjectionAssumptions, ProjectionRow, SAFE_WITHDRAWAL_RATE, SCENARIO_COMPARISON_YEARS, Scenario,
    ScenarioResult, SimpleFireResult, StockQuote, YieldResult,
};
