use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use clap::{ArgAction, Parser};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    DEFAULT_HORIZON_YEARS, DripResult, FireResult, Holding, HoldingIncome, MAX_PROJECTION_YEARS,
    PortfolioMetrics, ProjectionAssumptions, ProjectionRow, Scenario, ScenarioResult,
    SimpleFireResult, StockQuote, YieldResult, assumed_yield, compare_scenarios, compute_fire,
    default_scenarios, dividend_yield, drip, income_breakdown, portfolio_metrics, project,
    round_rows, simple_fire,
};
use crate::store::{HoldingStore, InMemoryHoldingStore, StoreError};

#[derive(Parser, Debug)]
#[command(
    name = "dividend-fire",
    about = "Dividend income projection and FIRE timeline estimator"
)]
struct Cli {
    #[arg(long, help = "Current market value of the portfolio")]
    total_portfolio_value: f64,
    #[arg(long, default_value_t = 0.0, help = "Current annual dividend income")]
    total_annual_dividends: f64,
    #[arg(
        long,
        help = "Portfolio yield in percent; derived from value and dividends when omitted"
    )]
    portfolio_yield: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    monthly_investment: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Lump sum added once a year on top of monthly investments"
    )]
    additional_yearly_contribution: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual price appreciation in percent"
    )]
    portfolio_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual dividend growth in percent"
    )]
    dividend_growth_rate: f64,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    reinvest_dividends: bool,
    #[arg(
        long,
        default_value_t = 4000.0,
        help = "Monthly income needed in retirement"
    )]
    monthly_expenses_in_retirement: f64,
    #[arg(long, default_value_t = DEFAULT_HORIZON_YEARS)]
    horizon_years: u32,
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Round monetary columns to whole currency units"
    )]
    round_rows: bool,
    #[arg(
        long = "scenario",
        value_parser = parse_scenario_arg,
        help = "Scenario as NAME:GROWTH:DIVIDEND_GROWTH in percent, repeatable"
    )]
    scenarios: Vec<Scenario>,
}

fn parse_scenario_arg(raw: &str) -> Result<Scenario, String> {
    let parts = raw.split(':').collect::<Vec<_>>();
    let [name, growth, dividend_growth] = parts.as_slice() else {
        return Err(format!("expected NAME:GROWTH:DIVIDEND_GROWTH, got '{raw}'"));
    };
    if name.trim().is_empty() {
        return Err("scenario name must not be empty".to_string());
    }
    let growth = growth
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid scenario growth '{growth}': {e}"))?;
    let dividend_growth = dividend_growth
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid scenario dividend growth '{dividend_growth}': {e}"))?;
    Ok(Scenario {
        name: name.trim().to_string(),
        portfolio_growth: growth / 100.0,
        dividend_growth,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScenario {
    name: String,
    portfolio_growth: f64,
    dividend_growth: f64,
}

impl From<ApiScenario> for Scenario {
    fn from(value: ApiScenario) -> Self {
        Scenario {
            name: value.name,
            portfolio_growth: value.portfolio_growth / 100.0,
            dividend_growth: value.dividend_growth,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    holdings: Option<Vec<Holding>>,
    total_portfolio_value: Option<f64>,
    total_annual_dividends: Option<f64>,
    portfolio_yield: Option<f64>,

    monthly_investment: Option<f64>,
    additional_yearly_contribution: Option<f64>,
    portfolio_growth_rate: Option<f64>,
    dividend_growth_rate: Option<f64>,
    reinvest_dividends: Option<bool>,
    monthly_expenses_in_retirement: Option<f64>,

    horizon_years: Option<u32>,
    round_rows: Option<bool>,
    scenarios: Option<Vec<ApiScenario>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct YieldPayload {
    annual_dividend: Option<f64>,
    stock_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DripPayload {
    initial_investment: Option<f64>,
    monthly_contribution: Option<f64>,
    dividend_yield: Option<f64>,
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimpleFirePayload {
    current_savings: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_expenses: Option<f64>,
    expected_return: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HoldingUpdatePayload {
    shares: Option<f64>,
    current_price: Option<f64>,
    dividend_yield: Option<f64>,
    dividend_per_share: Option<f64>,
    annual_dividend: Option<f64>,
}

impl HoldingUpdatePayload {
    fn quote(&self, symbol: &str) -> Option<StockQuote> {
        let has_quote = self.current_price.is_some()
            || self.dividend_yield.is_some()
            || self.dividend_per_share.is_some()
            || self.annual_dividend.is_some();
        has_quote.then(|| StockQuote {
            symbol: symbol.to_string(),
            price: self.current_price,
            dividend_yield: self.dividend_yield,
            dividend_per_share: self.dividend_per_share,
            annual_dividend: self.annual_dividend,
        })
    }
}

#[derive(Debug, Clone)]
struct ProjectionRequest {
    metrics: PortfolioMetrics,
    assumptions: ProjectionAssumptions,
    horizon_years: u32,
    round_rows: bool,
    scenarios: Vec<Scenario>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    metrics: PortfolioMetrics,
    assumptions: ProjectionAssumptions,
    horizon_years: u32,
    assumed_yield_percent: f64,
    rows: Vec<ProjectionRow>,
    fire: FireResult,
    years_to_fire_label: String,
    scenarios: Vec<ScenarioResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    income_breakdown: Option<Vec<HoldingIncome>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HoldingsResponse {
    user_id: String,
    holdings: Vec<Holding>,
    metrics: PortfolioMetrics,
    income_breakdown: Vec<HoldingIncome>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn HoldingStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn HoldingStore>) -> Self {
        Self { store }
    }
}

fn build_request(cli: Cli) -> Result<ProjectionRequest, String> {
    for (name, value) in [
        ("--total-portfolio-value", cli.total_portfolio_value),
        ("--total-annual-dividends", cli.total_annual_dividends),
        ("--monthly-investment", cli.monthly_investment),
        (
            "--additional-yearly-contribution",
            cli.additional_yearly_contribution,
        ),
        (
            "--monthly-expenses-in-retirement",
            cli.monthly_expenses_in_retirement,
        ),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if let Some(portfolio_yield) = cli.portfolio_yield {
        if !portfolio_yield.is_finite() || portfolio_yield < 0.0 {
            return Err("--portfolio-yield must be >= 0".to_string());
        }
    }

    if !cli.portfolio_growth_rate.is_finite() || cli.portfolio_growth_rate <= -100.0 {
        return Err("--portfolio-growth-rate must be > -100".to_string());
    }

    if !cli.dividend_growth_rate.is_finite() || cli.dividend_growth_rate <= -100.0 {
        return Err("--dividend-growth-rate must be > -100".to_string());
    }

    if cli.horizon_years == 0 || cli.horizon_years > MAX_PROJECTION_YEARS {
        return Err(format!("--horizon-years must be between 1 and {MAX_PROJECTION_YEARS}"));
    }

    for scenario in &cli.scenarios {
        if !scenario.portfolio_growth.is_finite() || scenario.portfolio_growth <= -1.0 {
            return Err(format!("scenario '{}' growth must be > -100", scenario.name));
        }
        if !scenario.dividend_growth.is_finite() || scenario.dividend_growth <= -100.0 {
            return Err(format!("scenario '{}' dividend growth must be > -100", scenario.name));
        }
    }

    let portfolio_yield = cli.portfolio_yield.unwrap_or_else(|| {
        if cli.total_portfolio_value > 0.0 {
            cli.total_annual_dividends / cli.total_portfolio_value * 100.0
        } else {
            0.0
        }
    });

    Ok(ProjectionRequest {
        metrics: PortfolioMetrics {
            total_portfolio_value: cli.total_portfolio_value,
            total_annual_dividends: cli.total_annual_dividends,
            portfolio_yield,
        },
        assumptions: ProjectionAssumptions {
            monthly_investment: cli.monthly_investment,
            additional_yearly_contribution: cli.additional_yearly_contribution,
            portfolio_growth_rate: cli.portfolio_growth_rate / 100.0,
            dividend_growth_rate: cli.dividend_growth_rate,
            reinvest_dividends: cli.reinvest_dividends,
            monthly_expenses_in_retirement: cli.monthly_expenses_in_retirement,
        },
        horizon_years: cli.horizon_years,
        round_rows: cli.round_rows,
        scenarios: if cli.scenarios.is_empty() {
            default_scenarios()
        } else {
            cli.scenarios
        },
    })
}

fn default_cli_for_api() -> Cli {
    let defaults = ProjectionAssumptions::default();
    Cli {
        total_portfolio_value: 0.0,
        total_annual_dividends: 0.0,
        portfolio_yield: None,
        monthly_investment: defaults.monthly_investment,
        additional_yearly_contribution: defaults.additional_yearly_contribution,
        portfolio_growth_rate: 7.0,
        dividend_growth_rate: defaults.dividend_growth_rate,
        reinvest_dividends: defaults.reinvest_dividends,
        monthly_expenses_in_retirement: defaults.monthly_expenses_in_retirement,
        horizon_years: DEFAULT_HORIZON_YEARS,
        round_rows: true,
        scenarios: Vec::new(),
    }
}

// Holdings, when present, replace the three portfolio figures.
fn api_request_from_payload(
    payload: ProjectPayload,
) -> Result<(ProjectionRequest, Option<Vec<HoldingIncome>>), String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.total_portfolio_value {
        cli.total_portfolio_value = v;
    }
    if let Some(v) = payload.total_annual_dividends {
        cli.total_annual_dividends = v;
    }
    if let Some(v) = payload.portfolio_yield {
        cli.portfolio_yield = Some(v);
    }

    if let Some(v) = payload.monthly_investment {
        cli.monthly_investment = v;
    }
    if let Some(v) = payload.additional_yearly_contribution {
        cli.additional_yearly_contribution = v;
    }
    if let Some(v) = payload.portfolio_growth_rate {
        cli.portfolio_growth_rate = v;
    }
    if let Some(v) = payload.dividend_growth_rate {
        cli.dividend_growth_rate = v;
    }
    if let Some(v) = payload.reinvest_dividends {
        cli.reinvest_dividends = v;
    }
    if let Some(v) = payload.monthly_expenses_in_retirement {
        cli.monthly_expenses_in_retirement = v;
    }

    if let Some(v) = payload.horizon_years {
        cli.horizon_years = v;
    }
    if let Some(v) = payload.round_rows {
        cli.round_rows = v;
    }
    if let Some(v) = payload.scenarios {
        cli.scenarios = v.into_iter().map(Scenario::from).collect();
    }

    if let Some(holdings) = &payload.holdings {
        validate_holdings(holdings)?;
    }

    let breakdown = payload.holdings.map(|holdings| {
        let metrics = portfolio_metrics(&holdings);
        cli.total_portfolio_value = metrics.total_portfolio_value;
        cli.total_annual_dividends = metrics.total_annual_dividends;
        cli.portfolio_yield = Some(metrics.portfolio_yield);
        income_breakdown(&holdings)
    });

    Ok((build_request(cli)?, breakdown))
}

fn validate_holdings(holdings: &[Holding]) -> Result<(), String> {
    for holding in holdings {
        if !holding.shares.is_finite() || holding.shares < 0.0 {
            return Err(format!("holding {} shares must be >= 0", holding.symbol));
        }
    }
    Ok(())
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map(|(request, _)| request)
}

fn build_projection_response(
    request: &ProjectionRequest,
    breakdown: Option<Vec<HoldingIncome>>,
) -> ProjectionResponse {
    let rows = project(&request.metrics, &request.assumptions, request.horizon_years);
    let fire = compute_fire(&request.metrics, &request.assumptions, &rows);
    let scenarios = compare_scenarios(&request.metrics, &request.assumptions, &request.scenarios);
    debug!(
        "projected {} years from {:.2}, years to FIRE {:?}, milestone {}",
        request.horizon_years,
        request.metrics.total_portfolio_value,
        fire.years_to_fire,
        fire.milestone.map_or("none", |m| m.label())
    );

    ProjectionResponse {
        metrics: request.metrics,
        assumptions: request.assumptions,
        horizon_years: request.horizon_years,
        assumed_yield_percent: assumed_yield(&request.metrics.sanitized()) * 100.0,
        rows: if request.round_rows {
            round_rows(&rows)
        } else {
            rows
        },
        years_to_fire_label: fire.years_to_fire_label(request.horizon_years),
        fire,
        scenarios,
        income_breakdown: breakdown,
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be >= 0"));
    }
    Ok(value)
}

fn yield_from_payload(payload: YieldPayload) -> Result<YieldResult, String> {
    let annual_dividend = payload
        .annual_dividend
        .ok_or_else(|| "annualDividend is required".to_string())?;
    let stock_price = payload
        .stock_price
        .ok_or_else(|| "stockPrice is required".to_string())?;
    Ok(dividend_yield(
        non_negative("annualDividend", annual_dividend)?,
        non_negative("stockPrice", stock_price)?,
    ))
}

fn drip_from_payload(payload: DripPayload) -> Result<DripResult, String> {
    let years = payload.years.unwrap_or(10);
    if years > MAX_PROJECTION_YEARS {
        return Err(format!("years must be <= {MAX_PROJECTION_YEARS}"));
    }
    Ok(drip(
        non_negative(
            "initialInvestment",
            payload.initial_investment.unwrap_or(10_000.0),
        )?,
        non_negative(
            "monthlyContribution",
            payload.monthly_contribution.unwrap_or(500.0),
        )?,
        non_negative("dividendYield", payload.dividend_yield.unwrap_or(4.0))?,
        years,
    ))
}

fn simple_fire_from_payload(payload: SimpleFirePayload) -> Result<SimpleFireResult, String> {
    let expected_return = payload.expected_return.unwrap_or(7.0);
    if !expected_return.is_finite() || expected_return <= -100.0 {
        return Err("expectedReturn must be > -100".to_string());
    }
    Ok(simple_fire(
        non_negative("currentSavings", payload.current_savings.unwrap_or(50_000.0))?,
        non_negative(
            "monthlyContribution",
            payload.monthly_contribution.unwrap_or(2_000.0),
        )?,
        non_negative("annualExpenses", payload.annual_expenses.unwrap_or(40_000.0))?,
        expected_return,
    ))
}

fn holdings_response(
    store: &dyn HoldingStore,
    user_id: &str,
) -> Result<HoldingsResponse, StoreError> {
    let holdings = store.load_holdings(user_id)?;
    Ok(HoldingsResponse {
        user_id: user_id.to_string(),
        metrics: portfolio_metrics(&holdings),
        income_breakdown: income_breakdown(&holdings),
        holdings,
    })
}

fn apply_holding_update(
    store: &dyn HoldingStore,
    user_id: &str,
    symbol: &str,
    payload: &HoldingUpdatePayload,
) -> Result<(), StoreError> {
    let shares = payload.shares.ok_or(StoreError::MissingShares)?;
    match payload.quote(symbol) {
        Some(quote) if shares > 0.0 => {
            let mut holding = Holding::new(symbol, shares);
            holding.apply_quote(&quote);
            store.upsert_holding(user_id, holding)
        }
        _ => store.save_shares(user_id, symbol, shares),
    }
}

pub fn router(store: Arc<dyn HoldingStore>) -> Router {
    Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/calculators/yield",
            get(yield_get_handler).post(yield_post_handler),
        )
        .route(
            "/api/calculators/drip",
            get(drip_get_handler).post(drip_post_handler),
        )
        .route(
            "/api/calculators/fire",
            get(simple_fire_get_handler).post(simple_fire_post_handler),
        )
        .route("/api/users/:user_id/holdings", get(holdings_handler))
        .route(
            "/api/users/:user_id/holdings/:symbol",
            put(put_holding_handler),
        )
        .route("/api/users/:user_id/projection", get(user_projection_handler))
        .fallback(not_found_handler)
        .with_state(AppState::new(store))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(Arc::new(InMemoryHoldingStore::new()));

    let listener = TcpListener::bind(addr).await?;
    info!("Dividend FIRE HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    let request = build_request(cli)?;
    info!(
        "projecting {} years for a portfolio of {:.2}",
        request.horizon_years, request.metrics.total_portfolio_value
    );
    let response = build_projection_response(&request, None);
    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| format!("failed to serialize projection: {e}"))?;
    println!("{json}");
    Ok(())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload)
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    match api_request_from_payload(payload) {
        Ok((request, breakdown)) => json_response(
            StatusCode::OK,
            build_projection_response(&request, breakdown),
        ),
        Err(msg) => bad_request(&msg),
    }
}

async fn yield_get_handler(Query(payload): Query<YieldPayload>) -> Response {
    calculator_response(yield_from_payload(payload))
}

async fn yield_post_handler(Json(payload): Json<YieldPayload>) -> Response {
    calculator_response(yield_from_payload(payload))
}

async fn drip_get_handler(Query(payload): Query<DripPayload>) -> Response {
    calculator_response(drip_from_payload(payload))
}

async fn drip_post_handler(Json(payload): Json<DripPayload>) -> Response {
    calculator_response(drip_from_payload(payload))
}

async fn simple_fire_get_handler(Query(payload): Query<SimpleFirePayload>) -> Response {
    calculator_response(simple_fire_from_payload(payload))
}

async fn simple_fire_post_handler(Json(payload): Json<SimpleFirePayload>) -> Response {
    calculator_response(simple_fire_from_payload(payload))
}

async fn holdings_handler(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match holdings_response(state.store.as_ref(), &user_id) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => store_error_response(&err),
    }
}

async fn put_holding_handler(
    State(state): State<AppState>,
    Path((user_id, symbol)): Path<(String, String)>,
    Json(payload): Json<HoldingUpdatePayload>,
) -> Response {
    let store = state.store.as_ref();
    let result = apply_holding_update(store, &user_id, &symbol, &payload)
        .and_then(|()| holdings_response(store, &user_id));
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => store_error_response(&err),
    }
}

async fn user_projection_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(mut payload): Query<ProjectPayload>,
) -> Response {
    match state.store.load_holdings(&user_id) {
        Ok(holdings) => {
            payload.holdings = Some(holdings);
            project_handler_impl(payload)
        }
        Err(err) => store_error_response(&err),
    }
}

fn calculator_response<T: Serialize>(result: Result<T, String>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(msg) => bad_request(&msg),
    }
}

fn store_error_response(err: &StoreError) -> Response {
    match err {
        StoreError::Unavailable => {
            warn!("holding store error: {err}");
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        _ => bad_request(&err.to_string()),
    }
}

fn bad_request(msg: &str) -> Response {
    warn!("rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
