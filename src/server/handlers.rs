use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::places::{canonical_of, flag_code_for, PlaceKind};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

#[derive(Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
}

fn required_country(params: &CountryQuery) -> Result<&str, ApiError> {
    let country = params.country.as_deref().unwrap_or("").trim();
    if country.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'country' parameter"));
    }
    Ok(country)
}

// ─── GET /api/places ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct PlacesResponse {
    pub country: String,
    pub kind: PlaceKind,
    pub items: Vec<String>,
    pub flag_code: Option<&'static str>,
}

pub async fn places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountryQuery>,
) -> Result<Json<PlacesResponse>, ApiError> {
    let start = Instant::now();
    let country = required_country(&params)?;

    let result = state.resolver.resolve_places(country).await;

    tracing::info!(
        "GET /api/places?country={} -> {} {} ({:.1}ms)",
        country,
        result.len(),
        result.kind,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(PlacesResponse {
        country: canonical_of(country).name,
        kind: result.kind,
        items: result.items,
        flag_code: flag_code_for(country),
    }))
}

// ─── GET /api/flag ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct FlagResponse {
    pub country: String,
    pub flag_code: Option<&'static str>,
}

pub async fn flag(Query(params): Query<CountryQuery>) -> Result<Json<FlagResponse>, ApiError> {
    let country = required_country(&params)?;
    Ok(Json(FlagResponse {
        country: country.to_string(),
        flag_code: flag_code_for(country),
    }))
}

// ─── GET /api/variants ───────────────────────────────────────────

#[derive(Serialize)]
pub struct VariantsResponse {
    pub canonical: String,
    pub variants: Vec<String>,
}

pub async fn variants(Query(params): Query<CountryQuery>) -> Result<Json<VariantsResponse>, ApiError> {
    let country = required_country(&params)?;
    let canonical = canonical_of(country);
    Ok(Json(VariantsResponse {
        canonical: canonical.name,
        variants: canonical.variants,
    }))
}
