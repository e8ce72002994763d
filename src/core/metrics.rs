use log::debug;

use super::types::{Holding, HoldingIncome, PortfolioMetrics};

pub fn holding_market_value(holding: &Holding) -> Option<f64> {
    let price = holding.current_price?;
    if holding.shares <= 0.0 || !price.is_finite() || !holding.shares.is_finite() {
        return None;
    }
    Some(price * holding.shares)
}

// A reported per-share annual dividend wins over the yield-derived estimate.
pub fn holding_annual_income(holding: &Holding) -> Option<f64> {
    if holding.shares <= 0.0 || !holding.shares.is_finite() {
        return None;
    }
    if let Some(per_share) = holding.annual_dividend.filter(|v| v.is_finite()) {
        return Some(per_share * holding.shares);
    }
    let yield_pct = holding.dividend_yield.filter(|v| v.is_finite())?;
    let price = holding.current_price.filter(|v| v.is_finite())?;
    Some((yield_pct / 100.0 * price) * holding.shares)
}

pub fn portfolio_metrics(holdings: &[Holding]) -> PortfolioMetrics {
    let mut total_portfolio_value = 0.0;
    let mut total_annual_dividends = 0.0;

    for holding in holdings {
        match holding_market_value(holding) {
            Some(value) => total_portfolio_value += value,
            None => debug!(
                "{} excluded from portfolio value (price {:?}, shares {})",
                holding.symbol, holding.current_price, holding.shares
            ),
        }
        if let Some(income) = holding_annual_income(holding) {
            total_annual_dividends += income;
        }
    }

    PortfolioMetrics {
        total_portfolio_value,
        total_annual_dividends,
        portfolio_yield: yield_percent(total_annual_dividends, total_portfolio_value),
    }
}

pub fn income_breakdown(holdings: &[Holding]) -> Vec<HoldingIncome> {
    let rows = holdings
        .iter()
        .map(|holding| {
            let market_value = holding_market_value(holding).unwrap_or(0.0);
            let annual_income = holding_annual_income(holding).unwrap_or(0.0);
            (holding, market_value, annual_income)
        })
        .collect::<Vec<_>>();
    let total_income = rows.iter().map(|(_, _, income)| income).sum::<f64>();

    let mut breakdown = rows
        .into_iter()
        .map(|(holding, market_value, annual_income)| HoldingIncome {
            symbol: holding.symbol.clone(),
            market_value,
            annual_income,
            yield_percent: yield_percent(annual_income, market_value),
            share_of_income: if total_income > 0.0 {
                annual_income / total_income * 100.0
            } else {
                0.0
            },
        })
        .collect::<Vec<_>>();

    breakdown.sort_by(|a, b| {
        b.annual_income
            .total_cmp(&a.annual_income)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    breakdown
}

fn yield_percent(income: f64, value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        income / value * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn priced(symbol: &str, shares: f64, price: f64) -> Holding {
        let mut holding = Holding::new(symbol, shares);
        holding.current_price = Some(price);
        holding
    }

    #[test]
    fn annual_dividend_takes_precedence_over_yield() {
        let mut holding = priced("ko", 10.0, 60.0);
        holding.annual_dividend = Some(2.0);
        holding.dividend_yield = Some(10.0);

        assert_eq!(holding.symbol, "KO");
        assert_approx(holding_annual_income(&holding).unwrap_or_default(), 20.0);
    }

    #[test]
    fn yield_fallback_uses_price() {
        let mut holding = priced("O", 100.0, 50.0);
        holding.dividend_yield = Some(6.0);

        assert_approx(holding_annual_income(&holding).unwrap_or_default(), 300.0);
    }

    #[test]
    fn metrics_skip_unpriced_and_empty_positions() {
        let mut unpriced = Holding::new("XYZ", 10.0);
        unpriced.dividend_yield = Some(5.0);
        let mut sold = priced("PEP", 0.0, 170.0);
        sold.annual_dividend = Some(5.0);
        let mut jnj = priced("JNJ", 10.0, 150.0);
        jnj.annual_dividend = Some(4.5);
        let mut vz = priced("VZ", 100.0, 40.0);
        vz.dividend_yield = Some(6.5);

        let metrics = portfolio_metrics(&[unpriced, sold, jnj, vz]);
        assert_approx(metrics.total_portfolio_value, 5_500.0);
        assert_approx(metrics.total_annual_dividends, 45.0 + 260.0);
        assert_approx(metrics.portfolio_yield, 305.0 / 5_500.0 * 100.0);
    }

    #[test]
    fn negative_shares_earn_nothing() {
        let mut short = priced("BBB", -10.0, 10.0);
        short.annual_dividend = Some(1.0);
        assert_eq!(holding_annual_income(&short), None);
        assert_eq!(holding_market_value(&short), None);

        let mut long = priced("AAA", 100.0, 10.0);
        long.annual_dividend = Some(1.0);
        let metrics = portfolio_metrics(&[long, short]);
        assert_approx(metrics.total_portfolio_value, 1_000.0);
        assert_approx(metrics.total_annual_dividends, 100.0);
        assert_approx(metrics.portfolio_yield, 10.0);
    }

    #[test]
    fn empty_portfolio_has_zero_yield() {
        let metrics = portfolio_metrics(&[]);
        assert_eq!(metrics, PortfolioMetrics::default());
    }

    #[test]
    fn dividends_without_value_do_not_divide_by_zero() {
        let mut holding = Holding::new("ABC", 10.0);
        holding.annual_dividend = Some(1.0);

        let metrics = portfolio_metrics(&[holding]);
        assert_approx(metrics.total_annual_dividends, 10.0);
        assert_approx(metrics.portfolio_yield, 0.0);
    }

    #[test]
    fn income_breakdown_sorts_by_income_and_sums_to_hundred() {
        let mut a = priced("AAA", 10.0, 10.0);
        a.annual_dividend = Some(1.0);
        let mut b = priced("BBB", 10.0, 10.0);
        b.annual_dividend = Some(3.0);
        let c = priced("CCC", 10.0, 10.0);

        let breakdown = income_breakdown(&[a, b, c]);
        let symbols = breakdown.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>();
        assert_eq!(symbols, vec!["BBB", "AAA", "CCC"]);
        assert_approx(breakdown[0].share_of_income, 75.0);
        assert_approx(breakdown[0].yield_percent, 30.0);
        assert_approx(
            breakdown.iter().map(|r| r.share_of_income).sum::<f64>(),
            100.0,
        );
    }
}
