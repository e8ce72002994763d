use serde::{Deserialize, Serialize};

pub const DEFAULT_HORIZON_YEARS: u32 = 30;
pub const MAX_PROJECTION_YEARS: u32 = 100;
pub const SCENARIO_COMPARISON_YEARS: u32 = 10;
pub const FALLBACK_YIELD: f64 = 0.04;
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;
pub const BENCHMARK_GROWTH_RATE: f64 = 0.07;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,
    pub shares: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub dividend_per_share: Option<f64>,
    #[serde(default)]
    pub annual_dividend: Option<f64>,
}

impl Holding {
    pub fn new(symbol: &str, shares: f64) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            shares,
            current_price: None,
            dividend_yield: None,
            dividend_per_share: None,
            annual_dividend: None,
        }
    }

    pub fn apply_quote(&mut self, quote: &StockQuote) {
        self.current_price = quote.price;
        self.dividend_yield = quote.dividend_yield;
        self.dividend_per_share = quote.dividend_per_share;
        self.annual_dividend = quote.annual_dividend;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub dividend_per_share: Option<f64>,
    #[serde(default)]
    pub annual_dividend: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub total_portfolio_value: f64,
    pub total_annual_dividends: f64,
    /// Percent, e.g. 4.5 for 4.5%.
    pub portfolio_yield: f64,
}

impl PortfolioMetrics {
    pub fn sanitized(self) -> Self {
        Self {
            total_portfolio_value: finite_or_zero(self.total_portfolio_value),
            total_annual_dividends: finite_or_zero(self.total_annual_dividends),
            portfolio_yield: finite_or_zero(self.portfolio_yield),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingIncome {
    pub symbol: String,
    pub market_value: f64,
    pub annual_income: f64,
    pub yield_percent: f64,
    pub share_of_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionAssumptions {
    pub monthly_investment: f64,
    pub additional_yearly_contribution: f64,
    /// Fraction, e.g. 0.07 for 7% a year.
    pub portfolio_growth_rate: f64,
    /// Percent, e.g. 5 for 5% a year.
    pub dividend_growth_rate: f64,
    pub reinvest_dividends: bool,
    pub monthly_expenses_in_retirement: f64,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            monthly_investment: 0.0,
            additional_yearly_contribution: 0.0,
            portfolio_growth_rate: 0.07,
            dividend_growth_rate: 5.0,
            reinvest_dividends: true,
            monthly_expenses_in_retirement: 4_000.0,
        }
    }
}

impl ProjectionAssumptions {
    pub fn sanitized(self) -> Self {
        Self {
            monthly_investment: finite_or_zero(self.monthly_investment),
            additional_yearly_contribution: finite_or_zero(self.additional_yearly_contribution),
            portfolio_growth_rate: finite_or_zero(self.portfolio_growth_rate),
            dividend_growth_rate: finite_or_zero(self.dividend_growth_rate),
            reinvest_dividends: self.reinvest_dividends,
            monthly_expenses_in_retirement: finite_or_zero(self.monthly_expenses_in_retirement),
        }
    }

    pub fn yearly_investment(&self) -> f64 {
        self.monthly_investment * 12.0 + self.additional_yearly_contribution
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub year: u32,
    pub portfolio_value: f64,
    pub annual_dividends: f64,
    pub monthly_income: f64,
    pub quarterly_income: f64,
    pub cumulative_contributions: f64,
    pub sp500_value: f64,
}

impl ProjectionRow {
    pub fn new(
        year: u32,
        portfolio_value: f64,
        annual_dividends: f64,
        cumulative_contributions: f64,
        sp500_value: f64,
    ) -> Self {
        Self {
            year,
            portfolio_value,
            annual_dividends,
            monthly_income: annual_dividends / 12.0,
            quarterly_income: annual_dividends / 4.0,
            cumulative_contributions,
            sp500_value,
        }
    }

    // Income columns round from the precise dividend figure.
    pub fn rounded(&self) -> Self {
        Self {
            year: self.year,
            portfolio_value: self.portfolio_value.round(),
            annual_dividends: self.annual_dividends.round(),
            monthly_income: self.monthly_income.round(),
            quarterly_income: self.quarterly_income.round(),
            cumulative_contributions: self.cumulative_contributions.round(),
            sp500_value: self.sp500_value.round(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Milestone {
    #[serde(rename = "Coast FIRE")]
    CoastFire,
    #[serde(rename = "Barista FIRE")]
    BaristaFire,
    #[serde(rename = "Almost There")]
    AlmostThere,
    #[serde(rename = "FIRE Achieved")]
    FireAchieved,
}

impl Milestone {
    pub fn from_progress(progress_percentage: f64) -> Option<Self> {
        if progress_percentage >= 100.0 {
            Some(Milestone::FireAchieved)
        } else if progress_percentage >= 75.0 {
            Some(Milestone::AlmostThere)
        } else if progress_percentage >= 50.0 {
            Some(Milestone::BaristaFire)
        } else if progress_percentage >= 25.0 {
            Some(Milestone::CoastFire)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Milestone::CoastFire => "Coast FIRE",
            Milestone::BaristaFire => "Barista FIRE",
            Milestone::AlmostThere => "Almost There",
            Milestone::FireAchieved => "FIRE Achieved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireResult {
    pub fire_number: f64,
    pub dividend_fire_number: f64,
    pub annual_expenses: f64,
    pub current_yield_percent: f64,
    pub current_monthly_dividends: f64,
    pub progress_percentage: f64,
    pub years_to_fire: Option<u32>,
    pub milestone: Option<Milestone>,
}

impl FireResult {
    pub fn years_to_fire_label(&self, horizon_years: u32) -> String {
        match self.years_to_fire {
            Some(0) => "Now".to_string(),
            Some(1) => "1 year".to_string(),
            Some(years) => format!("{years} years"),
            None => format!("{horizon_years}+ years"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub name: String,
    /// Fraction, like `ProjectionAssumptions::portfolio_growth_rate`.
    pub portfolio_growth: f64,
    /// Percent, like `ProjectionAssumptions::dividend_growth_rate`.
    pub dividend_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub portfolio_growth: f64,
    pub dividend_growth: f64,
    pub ten_year_monthly_income: f64,
    pub final_portfolio_value: f64,
    pub years_to_fire: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldResult {
    pub yield_percent: f64,
    pub annual_income_per_100_shares: f64,
    pub monthly_income_per_100_shares: f64,
    pub annual_income_per_1000_shares: f64,
    pub monthly_income_per_1000_shares: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripYear {
    pub year: u32,
    pub portfolio_value: f64,
    pub total_contributions: f64,
    pub total_dividends: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripResult {
    pub final_value: f64,
    pub total_contributions: f64,
    pub total_dividends: f64,
    pub final_annual_income: f64,
    pub years: Vec<DripYear>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleFireResult {
    pub fire_number: f64,
    pub monthly_passive_income: f64,
    pub years_to_fire: Option<f64>,
    pub final_value: f64,
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
