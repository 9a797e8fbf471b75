use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::core::{AssetSnapshot, ProjectionInputs, project_semi_annual_assets};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Values the form is pre-filled with; absent request fields fall back to these.
pub const FORM_DEFAULTS: ProjectionInputs = ProjectionInputs {
    current_age: 20,
    retirement_age: 65,
    monthly_savings: 1_000,
    monthly_investment: 1_000,
    annual_return_rate: 5,
};

/// Oldest age the form accepts. Bounds the projection loop to one entry per year of a lifetime.
pub const MAX_AGE: u32 = 150;

/// A single raw form field. The page submits strings, API clients may send numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Integer(i64),
    Fractional(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionForm {
    pub current_age: Option<FormValue>,
    pub retirement_age: Option<FormValue>,
    pub monthly_savings: Option<FormValue>,
    pub monthly_investment: Option<FormValue>,
    pub annual_return_rate: Option<FormValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub inputs: ProjectionInputs,
    pub snapshots: Vec<AssetSnapshot>,
    pub final_total: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

/// Flags for the `project` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(
        long,
        default_value_t = FORM_DEFAULTS.current_age,
        value_parser = clap::value_parser!(u32).range(..=MAX_AGE as i64)
    )]
    pub current_age: u32,
    #[arg(
        long,
        default_value_t = FORM_DEFAULTS.retirement_age,
        value_parser = clap::value_parser!(u32).range(..=MAX_AGE as i64)
    )]
    pub retirement_age: u32,
    #[arg(
        long,
        default_value_t = FORM_DEFAULTS.monthly_savings,
        help = "Cash set aside each month; never grows"
    )]
    pub monthly_savings: u32,
    #[arg(
        long,
        default_value_t = FORM_DEFAULTS.monthly_investment,
        help = "Amount invested each month; compounds semi-annually"
    )]
    pub monthly_investment: u32,
    #[arg(
        long,
        default_value_t = FORM_DEFAULTS.annual_return_rate,
        help = "Expected annual investment return in percent, e.g. 5"
    )]
    pub annual_return_rate: u32,
    #[arg(long, help = "Print the API JSON body instead of a table")]
    pub json: bool,
}

impl From<&ProjectArgs> for ProjectionInputs {
    fn from(args: &ProjectArgs) -> Self {
        ProjectionInputs {
            current_age: args.current_age,
            retirement_age: args.retirement_age,
            monthly_savings: args.monthly_savings,
            monthly_investment: args.monthly_investment,
            annual_return_rate: args.annual_return_rate,
        }
    }
}

/// Turns raw form fields into projection inputs, collecting every field error.
///
/// A retirement age below the current age is accepted; the projection for it
/// is simply empty.
pub fn validate_form(form: ProjectionForm) -> Result<ProjectionInputs, Vec<FieldError>> {
    let mut errors = Vec::new();
    let inputs = ProjectionInputs {
        current_age: parse_age_field(
            "currentAge",
            form.current_age,
            FORM_DEFAULTS.current_age,
            &mut errors,
        ),
        retirement_age: parse_age_field(
            "retirementAge",
            form.retirement_age,
            FORM_DEFAULTS.retirement_age,
            &mut errors,
        ),
        monthly_savings: parse_field(
            "monthlySavings",
            form.monthly_savings,
            FORM_DEFAULTS.monthly_savings,
            &mut errors,
        ),
        monthly_investment: parse_field(
            "monthlyInvestment",
            form.monthly_investment,
            FORM_DEFAULTS.monthly_investment,
            &mut errors,
        ),
        annual_return_rate: parse_field(
            "annualReturnRate",
            form.annual_return_rate,
            FORM_DEFAULTS.annual_return_rate,
            &mut errors,
        ),
    };

    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(errors)
    }
}

fn parse_age_field(
    field: &'static str,
    value: Option<FormValue>,
    default: u32,
    errors: &mut Vec<FieldError>,
) -> u32 {
    let age = parse_field(field, value, default, errors);
    if age > MAX_AGE {
        errors.push(FieldError {
            field,
            message: format!("must be at most {MAX_AGE}"),
        });
        return default;
    }
    age
}

fn parse_field(
    field: &'static str,
    value: Option<FormValue>,
    default: u32,
    errors: &mut Vec<FieldError>,
) -> u32 {
    let Some(value) = value else {
        return default;
    };
    match parse_form_value(&value) {
        Ok(v) => v,
        Err(message) => {
            errors.push(FieldError { field, message });
            default
        }
    }
}

fn parse_form_value(value: &FormValue) -> Result<u32, String> {
    let integer = match value {
        FormValue::Integer(v) => *v,
        FormValue::Fractional(_) => return Err("must be a whole number".to_string()),
        FormValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err("is required".to_string());
            }
            trimmed
                .parse::<i64>()
                .map_err(|_| format!("must be a whole number, got {trimmed:?}"))?
        }
    };

    if integer < 0 {
        return Err("must not be negative".to_string());
    }
    u32::try_from(integer).map_err(|_| format!("must be at most {}", u32::MAX))
}

/// Runs the projection for the response body.
///
/// JSON has no representation for infinite balances, so a projection whose
/// investment overflows `f64` is reported as an error naming the first such age.
pub fn build_project_response(inputs: ProjectionInputs) -> Result<ProjectResponse, String> {
    let snapshots = project_semi_annual_assets(&inputs);
    if let Some(year) = snapshots.iter().find(|year| !year.total.is_finite()) {
        return Err(format!(
            "projected balance exceeds the representable range at age {}",
            year.age
        ));
    }

    let final_total = snapshots.last().map(|year| year.total);
    Ok(ProjectResponse {
        inputs,
        snapshots,
        final_total,
    })
}

/// Renders the `project` subcommand output, either as JSON or a text table.
pub fn render_project_output(args: &ProjectArgs) -> Result<String, String> {
    let response = build_project_response(args.into())?;
    if args.json {
        let mut out = serde_json::to_string_pretty(&response)
            .map_err(|e| format!("failed to serialize projection: {e}"))?;
        out.push('\n');
        return Ok(out);
    }
    Ok(render_table(&response.snapshots))
}

fn render_table(snapshots: &[AssetSnapshot]) -> String {
    let mut out = format!(
        "{:>4}  {:>14}  {:>14}  {:>14}\n",
        "Age", "Savings", "Investment", "Total"
    );
    if snapshots.is_empty() {
        out.push_str("(retirement age is below current age; nothing to project)\n");
        return out;
    }
    for year in snapshots {
        out.push_str(&format!(
            "{:>4}  {:>14}  {:>14}  {:>14}\n",
            year.age,
            format_amount(year.savings),
            format_amount(year.investment),
            format_amount(year.total)
        ));
    }
    out
}

/// Rounds to whole currency units and groups thousands, e.g. `1234567.6` -> `1,234,568`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    if !rounded.is_finite() {
        return rounded.to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/healthz", get(healthz_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "nestegg HTTP API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn healthz_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", Vec::new())
}

async fn project_get_handler(query: Result<Query<ProjectionForm>, QueryRejection>) -> Response {
    match query {
        Ok(Query(form)) => project_handler_impl(form),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected projection query");
            error_response(rejection.status(), &rejection.body_text(), Vec::new())
        }
    }
}

async fn project_post_handler(body: Result<Json<ProjectionForm>, JsonRejection>) -> Response {
    match body {
        Ok(Json(form)) => project_handler_impl(form),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected projection body");
            error_response(rejection.status(), &rejection.body_text(), Vec::new())
        }
    }
}

fn project_handler_impl(form: ProjectionForm) -> Response {
    let inputs = match validate_form(form) {
        Ok(inputs) => inputs,
        Err(field_errors) => {
            tracing::debug!(errors = field_errors.len(), "rejected projection form");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid projection inputs",
                field_errors,
            );
        }
    };

    let response = match build_project_response(inputs) {
        Ok(response) => response,
        Err(msg) => {
            tracing::warn!(
                annual_return_rate = inputs.annual_return_rate,
                "projection overflowed"
            );
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                &msg,
                vec![FieldError {
                    field: "annualReturnRate",
                    message: "is too large to project".to_string(),
                }],
            );
        }
    };
    tracing::debug!(
        current_age = inputs.current_age,
        retirement_age = inputs.retirement_age,
        years = response.snapshots.len(),
        "projected assets"
    );
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str, field_errors: Vec<FieldError>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field_errors,
        },
    )
}
