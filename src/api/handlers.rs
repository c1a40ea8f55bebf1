use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;

use super::{dto::ErrorResponse, errors::ApiError};
use crate::home::{
    validate, FanMode, OperatingMode, Thermostat, ThermostatField, ThermostatStore,
    ThermostatUpdate,
};

// ---------------------------------------------------------------------------
// Thermostats
// ---------------------------------------------------------------------------

/// List every thermostat in the home. An empty home is reported as 404.
#[utoipa::path(
    get,
    path = "/v1/thermostats",
    responses(
        (status = 200, description = "All thermostats", body = Vec<Thermostat>),
        (status = 404, description = "No thermostats in the home", body = ErrorResponse),
    ),
    tag = "thermostats"
)]
pub async fn list_thermostats(
    State(store): State<ThermostatStore>,
) -> Result<Json<Vec<Thermostat>>, ApiError> {
    let thermostats = store.list().await;
    if thermostats.is_empty() {
        return Err(ApiError::NoThermostats);
    }

    Ok(Json(thermostats))
}

/// Add a thermostat. Fields left out take their defaults: name
/// `Thermostat #{id}`, mode `off`, both set points 71, fan `auto`.
#[utoipa::path(
    post,
    path = "/v1/thermostats",
    request_body = ThermostatUpdate,
    responses(
        (status = 200, description = "The new thermostat, including its id", body = Thermostat),
        (status = 400, description = "Malformed body or invalid field", body = ErrorResponse),
    ),
    tag = "thermostats"
)]
pub async fn create_thermostat(
    State(store): State<ThermostatStore>,
    body: Bytes,
) -> Result<Json<Thermostat>, ApiError> {
    let desired: ThermostatUpdate = serde_json::from_slice(&body)?;
    let changes = validate(desired)?;

    let id = store.create(&changes).await;
    let created = store.get(id).await?;

    Ok(Json(created))
}

/// Fetch a single thermostat.
#[utoipa::path(
    get,
    path = "/v1/thermostats/{id}",
    params(
        ("id" = u32, Path, description = "Thermostat id"),
    ),
    responses(
        (status = 200, description = "The thermostat", body = Thermostat),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "No thermostat with this id", body = ErrorResponse),
    ),
    tag = "thermostats"
)]
pub async fn get_thermostat(Extension(thermostat): Extension<Thermostat>) -> Json<Thermostat> {
    Json(thermostat)
}

/// Read one property of a thermostat as a bare JSON value.
#[utoipa::path(
    get,
    path = "/v1/thermostats/{id}/{field}",
    params(
        ("id" = u32, Path, description = "Thermostat id"),
        ("field" = String, Path, description = "One of name, currentTemp, mode, coolSetPoint, heatSetPoint, fan"),
    ),
    responses(
        (status = 200, description = "The bare field value"),
        (status = 400, description = "Malformed id or unknown property", body = ErrorResponse),
        (status = 404, description = "No thermostat with this id, or the field is empty", body = ErrorResponse),
    ),
    tag = "thermostats"
)]
pub async fn get_field(
    Extension(thermostat): Extension<Thermostat>,
    Path((_id, field)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let parsed: ThermostatField = field
        .parse()
        .map_err(|_| ApiError::InvalidProperty(field.clone()))?;

    thermostat
        .field(parsed)
        .map(Json)
        .ok_or(ApiError::EmptyField(field))
}

/// Apply a partial update. Only the keys present in the body change.
#[utoipa::path(
    put,
    path = "/v1/thermostats/{id}",
    params(
        ("id" = u32, Path, description = "Thermostat id"),
    ),
    request_body = ThermostatUpdate,
    responses(
        (status = 200, description = "Updated; empty body"),
        (status = 400, description = "Malformed id, malformed body or invalid field", body = ErrorResponse),
        (status = 404, description = "No thermostat with this id", body = ErrorResponse),
    ),
    tag = "thermostats"
)]
pub async fn put_thermostat(
    State(store): State<ThermostatStore>,
    Extension(target): Extension<Thermostat>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let desired: ThermostatUpdate = serde_json::from_slice(&body)?;
    let changes = validate(desired)?;

    let updated = store.update(target.id, &changes).await?;
    info!(
        id = updated.id,
        mode = %updated.mode,
        fan = %updated.fan,
        current_temp = updated.current_temp,
        "Thermostat settings changed"
    );

    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Index & health check
// ---------------------------------------------------------------------------

pub async fn index() -> &'static str {
    "Index Page"
}

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        list_thermostats,
        create_thermostat,
        get_thermostat,
        get_field,
        put_thermostat,
        health
    ),
    components(schemas(Thermostat, ThermostatUpdate, ErrorResponse, OperatingMode, FanMode)),
    tags(
        (name = "thermostats", description = "Thermostat endpoints"),
        (name = "system",      description = "System endpoints"),
    ),
    info(
        title = "Thermostat API",
        version = "0.1.0",
        description = "REST API for the thermostats in a home"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
