use super::types::{
    DripResult, DripYear, MAX_PROJECTION_YEARS, SAFE_WITHDRAWAL_RATE, SimpleFireResult,
    YieldResult, finite_or_zero,
};

pub const SIMPLE_FIRE_MAX_MONTHS: u32 = 100 * 12;

pub fn dividend_yield(annual_dividend_per_share: f64, stock_price: f64) -> YieldResult {
    let annual_dividend_per_share = finite_or_zero(annual_dividend_per_share);
    let stock_price = finite_or_zero(stock_price);

    let yield_percent = if stock_price > 0.0 {
        annual_dividend_per_share / stock_price * 100.0
    } else {
        0.0
    };
    let per_100 = annual_dividend_per_share * 100.0;
    let per_1000 = annual_dividend_per_share * 1_000.0;

    YieldResult {
        yield_percent,
        annual_income_per_100_shares: per_100,
        monthly_income_per_100_shares: per_100 / 12.0,
        annual_income_per_1000_shares: per_1000,
        monthly_income_per_1000_shares: per_1000 / 12.0,
    }
}

// Contribution lands before the month's dividend is paid on it.
pub fn drip(
    initial_investment: f64,
    monthly_contribution: f64,
    yield_percent: f64,
    years: u32,
) -> DripResult {
    let years = years.min(MAX_PROJECTION_YEARS);
    let monthly_rate = finite_or_zero(yield_percent) / 100.0 / 12.0;
    let monthly_contribution = finite_or_zero(monthly_contribution);

    let mut portfolio_value = finite_or_zero(initial_investment);
    let mut total_contributions = portfolio_value;
    let mut total_dividends = 0.0;
    let mut yearly = Vec::with_capacity(years as usize);

    for month in 1..=years * 12 {
        portfolio_value += monthly_contribution;
        total_contributions += monthly_contribution;

        let monthly_dividend = portfolio_value * monthly_rate;
        portfolio_value += monthly_dividend;
        total_dividends += monthly_dividend;

        if month % 12 == 0 {
            yearly.push(DripYear {
                year: month / 12,
                portfolio_value,
                total_contributions,
                total_dividends,
            });
        }
    }

    DripResult {
        final_value: portfolio_value,
        total_contributions,
        total_dividends,
        final_annual_income: portfolio_value * monthly_rate * 12.0,
        years: yearly,
    }
}

pub fn simple_fire(
    current_savings: f64,
    monthly_contribution: f64,
    annual_expenses: f64,
    expected_return_percent: f64,
) -> SimpleFireResult {
    let fire_number = finite_or_zero(annual_expenses) * 25.0;
    let monthly_return = finite_or_zero(expected_return_percent) / 100.0 / 12.0;
    let monthly_contribution = finite_or_zero(monthly_contribution);

    let mut current_value = finite_or_zero(current_savings);
    let mut months = 0;
    while current_value < fire_number && months < SIMPLE_FIRE_MAX_MONTHS {
        current_value = current_value * (1.0 + monthly_return) + monthly_contribution;
        months += 1;
    }

    SimpleFireResult {
        fire_number,
        monthly_passive_income: fire_number * SAFE_WITHDRAWAL_RATE / 12.0,
        years_to_fire: (current_value >= fire_number).then(|| months as f64 / 12.0),
        final_value: current_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn yield_and_share_scales() {
        let result = dividend_yield(2.0, 50.0);
        assert_approx(result.yield_percent, 4.0);
        assert_approx(result.annual_income_per_100_shares, 200.0);
        assert_approx(result.monthly_income_per_100_shares, 200.0 / 12.0);
        assert_approx(result.annual_income_per_1000_shares, 2_000.0);
    }

    #[test]
    fn yield_with_zero_price_is_zero() {
        let result = dividend_yield(2.0, 0.0);
        assert_approx(result.yield_percent, 0.0);
        assert_approx(result.annual_income_per_100_shares, 200.0);
    }

    #[test]
    fn drip_one_year_matches_monthly_compounding() {
        let result = drip(10_000.0, 0.0, 4.0, 1);
        let closed_form = 10_000.0 * (1.0_f64 + 0.04 / 12.0).powi(12);

        assert_approx(result.final_value, closed_form);
        assert!(result.final_value > 10_000.0 * 1.04);
        assert_approx(result.total_dividends, closed_form - 10_000.0);
        assert_approx(result.total_contributions, 10_000.0);
        assert_eq!(result.years.len(), 1);
        assert_approx(result.years[0].portfolio_value, result.final_value);
    }

    #[test]
    fn drip_contribution_earns_dividend_in_its_own_month() {
        let result = drip(0.0, 1_200.0, 12.0, 1);

        // One month: 1200 in, then 1% of 1200 paid on it.
        let mut expected = 0.0;
        for _ in 0..12 {
            expected = (expected + 1_200.0) * 1.01;
        }
        assert_approx(result.final_value, expected);
        assert_approx(result.total_contributions, 14_400.0);
        assert_approx(result.final_annual_income, expected * 0.12);
    }

    #[test]
    fn drip_reports_each_year_end() {
        let result = drip(1_000.0, 100.0, 5.0, 3);
        let years = result.years.iter().map(|y| y.year).collect::<Vec<_>>();
        assert_eq!(years, vec![1, 2, 3]);
        assert!(
            result
                .years
                .windows(2)
                .all(|w| w[1].portfolio_value > w[0].portfolio_value)
        );
        assert_approx(result.years[2].total_contributions, 1_000.0 + 3_600.0);
    }

    #[test]
    fn drip_zero_years_returns_initial() {
        let result = drip(5_000.0, 100.0, 4.0, 0);
        assert_approx(result.final_value, 5_000.0);
        assert_approx(result.total_dividends, 0.0);
        assert!(result.years.is_empty());
    }

    #[test]
    fn drip_caps_very_long_horizons() {
        let result = drip(1_000.0, 0.0, 4.0, u32::MAX / 12 + 1);
        assert_eq!(result.years.len(), MAX_PROJECTION_YEARS as usize);
        assert_eq!(result.years.last().map(|y| y.year), Some(MAX_PROJECTION_YEARS));

        let capped = drip(1_000.0, 0.0, 4.0, MAX_PROJECTION_YEARS);
        assert_approx(result.final_value, capped.final_value);
    }

    #[test]
    fn simple_fire_uses_25x_expenses() {
        let result = simple_fire(0.0, 1_000.0, 40_000.0, 7.0);
        assert_approx(result.fire_number, 1_000_000.0);
        assert_approx(result.monthly_passive_income, 1_000_000.0 * 0.04 / 12.0);

        let years = result.years_to_fire.expect("reachable within 100 years");
        assert!(years > 20.0 && years < 40.0);
        assert!(result.final_value >= result.fire_number);
        assert_approx((years * 12.0).fract(), 0.0);
    }

    #[test]
    fn simple_fire_already_reached_is_zero_years() {
        let result = simple_fire(2_000_000.0, 0.0, 40_000.0, 7.0);
        assert_eq!(result.years_to_fire, Some(0.0));
    }

    #[test]
    fn simple_fire_unreachable_gives_up_after_a_century() {
        let result = simple_fire(0.0, 0.0, 40_000.0, 7.0);
        assert_eq!(result.years_to_fire, None);
        assert_approx(result.final_value, 0.0);
    }

    #[test]
    fn simple_fire_with_zero_return_is_linear() {
        let result = simple_fire(0.0, 1_000.0, 12_000.0, 0.0);
        assert_eq!(result.years_to_fire, Some(25.0));
    }
}
