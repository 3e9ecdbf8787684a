use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use trendscan_core::{AnalysisResult, ScanConfig, Watchlist};

use crate::{ApiError, AppState};

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/scan", post(scan))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "Trendscan API is live" }))
}

/// Form fields of `POST /scan`.
#[derive(Debug, Default)]
struct ScanForm {
    file: Option<String>,
    min_price: Option<String>,
    min_vol: Option<String>,
    limit: Option<String>,
}

impl ScanForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "file" => {
                    let bytes = field.bytes().await?;
                    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                        ApiError::BadRequest(String::from("watchlist file must be UTF-8 text"))
                    })?;
                    form.file = Some(text);
                }
                "min_price" => form.min_price = Some(field.text().await?),
                "min_vol" => form.min_vol = Some(field.text().await?),
                "limit" => form.limit = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    fn config(&self) -> Result<ScanConfig, ApiError> {
        let defaults = ScanConfig::default();
        let config = ScanConfig {
            min_price: match &self.min_price {
                Some(raw) => parse_field(raw, "min_price")?,
                None => defaults.min_price,
            },
            min_volume: match &self.min_vol {
                Some(raw) => parse_volume(raw)?,
                None => defaults.min_volume,
            },
            candidate_limit: match &self.limit {
                Some(raw) => parse_field(raw, "limit")?,
                None => defaults.candidate_limit,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("field '{field}' is not a valid number: '{raw}'")))
}

/// `min_vol` arrives as a float from browser forms (`200000.0`).
fn parse_volume(raw: &str) -> Result<u64, ApiError> {
    let value: f64 = parse_field(raw, "min_vol")?;
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "field 'min_vol' must be a non-negative number: '{raw}'"
        )));
    }
    Ok(value.trunc() as u64)
}

async fn scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vec<AnalysisResult>>, ApiError> {
    let form = ScanForm::read(multipart).await?;
    let config = form.config()?;
    let text = form
        .file
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest(String::from("missing 'file' field")))?;

    let watchlist = Watchlist::parse(text)?;
    let candidates = watchlist.screen(&config);
    info!(
        rows = watchlist.len(),
        skipped = watchlist.skipped(),
        candidates = candidates.len(),
        "watchlist screened"
    );

    let results = state.orchestrator.scan(&candidates, &config).await?;
    Ok(Json(results))
}
