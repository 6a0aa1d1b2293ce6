//! Router assembly.
//!
//! Each resource gets its own sub-router carrying just the service it needs,
//! then everything is merged under one trace and CORS layer.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Prefix of every versioned route.
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router with all routes.
pub fn router(state: AppState) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let services = state.services.clone();

    // Health check routes (no tenant required)
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::api_health))
        .with_state(state.clone());

    let database_routes = Router::new()
        .route("/admin/db/init", post(handlers::database::init_database))
        .route("/admin/db/validate", get(handlers::database::validate_database))
        .with_state(state.db.clone());

    let agency_routes = Router::new()
        .route("/admin/agencies", post(handlers::agency::create))
        .route(
            "/agency",
            get(handlers::agency::get).patch(handlers::agency::update),
        )
        .with_state(services.agencies);

    let contact_routes = Router::new()
        .route(
            "/contacts",
            get(handlers::contacts::list).post(handlers::contacts::create),
        )
        .route(
            "/contacts/{id}",
            get(handlers::contacts::get)
                .patch(handlers::contacts::update)
                .delete(handlers::contacts::delete),
        )
        .with_state(services.contacts);

    let trip_routes = Router::new()
        .route("/trips", get(handlers::trips::list).post(handlers::trips::create))
        .route(
            "/trips/{id}",
            get(handlers::trips::get)
                .patch(handlers::trips::update)
                .delete(handlers::trips::delete),
        )
        .route("/trips/{id}/summary", get(handlers::trips::summary))
        .with_state(services.trips);

    let traveler_routes = Router::new()
        .route(
            "/trips/{id}/travelers",
            get(handlers::travelers::list).post(handlers::travelers::add),
        )
        .route(
            "/trips/{id}/travelers/{tid}",
            axum::routing::delete(handlers::travelers::remove),
        )
        .route("/trips/{id}/travelers/{tid}/diff", get(handlers::travelers::diff))
        .route(
            "/trips/{id}/travelers/{tid}/refresh",
            post(handlers::travelers::refresh),
        )
        .with_state(services.travelers);

    let itinerary_routes = Router::new()
        .route(
            "/trips/{id}/days",
            get(handlers::itinerary::list).post(handlers::itinerary::create),
        )
        .route(
            "/trips/{id}/days/{day}",
            axum::routing::patch(handlers::itinerary::update).delete(handlers::itinerary::delete),
        )
        .route(
            "/trips/{id}/days/{day}/location",
            put(handlers::itinerary::set_location),
        )
        .with_state(services.itinerary);

    let activity_routes = Router::new()
        .route(
            "/trips/{id}/days/{day}/activities",
            post(handlers::activities::create),
        )
        .route(
            "/trips/{id}/activities/{aid}",
            get(handlers::activities::get)
                .patch(handlers::activities::update)
                .delete(handlers::activities::delete),
        )
        .route(
            "/trips/{id}/activities/{aid}/split",
            get(handlers::activities::get_split).put(handlers::activities::set_split),
        )
        .route(
            "/activities/name-preview",
            post(handlers::activities::name_preview),
        )
        .with_state(services.activities);

    let booking_routes = Router::new()
        .route(
            "/trips/{id}/bookings",
            get(handlers::bookings::list).post(handlers::bookings::create),
        )
        .route(
            "/trips/{id}/bookings/{bid}",
            axum::routing::patch(handlers::bookings::update).delete(handlers::bookings::delete),
        )
        .with_state(services.bookings);

    let pricing_routes = Router::new()
        .route("/pricing/quote", post(handlers::pricing::quote))
        .with_state(state.config.clone());

    let dashboard_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_stats))
        .with_state(services.dashboard);

    let portal_routes = Router::new()
        .route("/portal/{share_token}", get(handlers::portal::get_trip))
        .with_state(services.portal);

    let api = Router::new()
        .merge(database_routes)
        .merge(agency_routes)
        .merge(contact_routes)
        .merge(trip_routes)
        .merge(traveler_routes)
        .merge(itinerary_routes)
        .merge(activity_routes)
        .merge(booking_routes)
        .merge(pricing_routes)
        .merge(dashboard_routes)
        .merge(portal_routes);

    Router::new()
        .merge(health_routes)
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{AppConfig, DatabaseConfig};
    use crate::db::pool::create_lazy_pool;

    fn app() -> Router {
        let pool = create_lazy_pool(&DatabaseConfig::default());
        router(AppState::new(pool, AppConfig::default()).unwrap())
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_quote_uses_default_share() {
        let (status, body) = send(post_json(
            "/api/v1/pricing/quote",
            json!({"cost_cents": 100_000, "markup_bps": 2_000, "tax_cents": 5_000, "currency": "usd"}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["advisor_share_bps"], 7_000);
        assert_eq!(body["client_total_cents"], 125_000);
        assert_eq!(body["agency_revenue_cents"], 20_000);
        assert_eq!(body["advisor_payout_cents"], 14_000);
        assert!(body["formatted"]["client_total"].is_string());
    }

    #[tokio::test]
    async fn test_quote_rejects_negative_cost() {
        let (status, body) = send(post_json(
            "/api/v1/pricing/quote",
            json!({"cost_cents": -1}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_quote_rejects_unknown_model_with_json_error() {
        let (status, body) = send(post_json(
            "/api/v1/pricing/quote",
            json!({"model": "gross", "cost_cents": 100}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().contains("gross"));
    }

    #[tokio::test]
    async fn test_quote_rejects_oversized_cost() {
        let (status, body) = send(post_json(
            "/api/v1/pricing/quote",
            json!({"cost_cents": i64::MAX / 4, "markup_bps": 100_000}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("cost_cents"));
    }

    #[tokio::test]
    async fn test_name_preview_rejects_unknown_kind() {
        let (status, body) = send(post_json(
            "/api/v1/activities/name-preview",
            json!({"kind": "submarine", "details": {}}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_malformed_path_ids_are_400_json() {
        let request = Request::builder()
            .uri("/api/v1/portal/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);

        let request = Request::builder()
            .uri("/api/v1/trips/abc/summary")
            .header("x-agency-id", "1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_name_preview_without_tenant() {
        let (status, body) = send(post_json(
            "/api/v1/activities/name-preview",
            json!({
                "kind": "flight",
                "details": {"carrier": "UA", "flight_number": "123", "origin": "SFO", "destination": "JFK"}
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "UA 123: SFO → JFK");
    }

    #[tokio::test]
    async fn test_tenant_routes_require_agency_header() {
        for uri in ["/api/v1/trips", "/api/v1/contacts", "/api/v1/dashboard", "/api/v1/agency"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert!(body["error"].as_str().unwrap().contains("x-agency-id"));
        }
    }

    #[tokio::test]
    async fn test_malformed_agency_header() {
        let request = Request::builder()
            .uri("/api/v1/trips")
            .header("x-agency-id", "acme")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
