use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};

use super::errors::ApiError;
use crate::home::ThermostatStore;

/// Route middleware for every path carrying an `{id}` segment.
///
/// Parses the id, looks the thermostat up and stores the record in the
/// request extensions, where handlers pick it up with `Extension<Thermostat>`.
/// Requests with a malformed id (400) or an unknown one (404) never reach the
/// handler.
pub async fn resolve_thermostat(
    State(store): State<ThermostatStore>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(raw) = params.get("id") {
        let id = raw
            .parse::<u32>()
            .map_err(|_| ApiError::InvalidIdentifier(raw.clone()))?;
        let thermostat = store.get(id).await?;
        request.extensions_mut().insert(thermostat);
    }

    Ok(next.run(request).await)
}
