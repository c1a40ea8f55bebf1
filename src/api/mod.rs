pub mod dto;
pub mod errors;
pub mod handlers;
pub mod resolve;

use axum::{middleware, routing::get, Json, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::home::ThermostatStore;
use handlers::ApiDoc;

pub fn router(store: ThermostatStore) -> Router {
    let (collection, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/thermostats",
            get(handlers::list_thermostats).post(handlers::create_thermostat),
        )
        .with_state(store.clone())
        .split_for_parts();

    // Routes addressing one thermostat go through the resolve step first.
    let single = Router::new()
        .route(
            "/thermostats/{id}",
            get(handlers::get_thermostat).put(handlers::put_thermostat),
        )
        .route("/thermostats/{id}/{field}", get(handlers::get_field))
        .route_layer(middleware::from_fn_with_state(
            store.clone(),
            resolve::resolve_thermostat,
        ))
        .with_state(store);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { Json(api) }),
        )
        .nest("/v1", collection.merge(single))
        .layer(TraceLayer::new_for_http())
}
