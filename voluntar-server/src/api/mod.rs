//! API Module
//!
//! HTTP layer for the service: the REST endpoints, the GraphQL endpoint
//! and the WebSocket feed all hang off one router.

pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod listing;
pub mod user;

use async_graphql_axum::GraphQLSubscription;
use axum::{
    Extension, Router,
    http::Uri,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::error::ApiError;
use crate::graphql;
use crate::realtime::socket;
use crate::state::AppState;

/// Create the main router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let schema = graphql::build_schema(state.clone());

    Router::new()
        // Service info
        .route("/", get(health::index))
        .route("/health", get(health::health_check))
        // User endpoints
        .route("/api/users/login", post(user::login))
        .route("/api/users", get(user::list_users).post(user::create_user))
        .route(
            "/api/users/{email}",
            get(user::get_user).delete(user::delete_user),
        )
        // Listing endpoints
        .route(
            "/api/listings",
            get(listing::list_listings).post(listing::create_listing),
        )
        .route("/api/listings/kind", get(listing::list_listings_by_kind))
        .route("/api/listings/mine", get(listing::list_my_listings))
        .route(
            "/api/listings/{id}",
            get(listing::get_listing)
                .patch(listing::update_listing)
                .delete(listing::delete_listing),
        )
        // GraphQL
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .route_service("/graphql/ws", GraphQLSubscription::new(schema.clone()))
        // Live listing feed
        .route("/ws", get(socket::ws_handler))
        .fallback(not_found)
        // Add state and middleware
        .with_state(state)
        .layer(Extension(schema))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!("No route for {}", uri.path());
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seeded_state, token_for};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    #[tokio::test]
    async fn test_health_index_and_fallback() {
        let app = create_router(seeded_state().await);

        let (status, _) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["graphql"], json!("/graphql"));

        let (status, body) = send(&app, "GET", "/api/nothing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Route /api/nothing not found" }));
    }

    #[tokio::test]
    async fn test_login() {
        let app = create_router(seeded_state().await);

        let (status, body) = send(
            &app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "l@a.u", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some());
        assert_eq!(body["user"]["role"], json!("admin"));
        assert!(body["user"].get("password_hash").is_none());

        let (status, _) = send(
            &app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "l@a.u", "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "who@x.y", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_board() {
        let app = create_router(seeded_state().await);

        let (status, body) = send(&app, "GET", "/api/listings", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, body) = send(&app, "GET", "/api/listings/kind?kind=offer", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "GET", "/api/listings/kind", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("kind"));

        let (status, body) = send(&app, "GET", "/api/listings/2", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owner_email"], json!("M@R.C"));

        let (status, _) = send(&app, "GET", "/api/listings/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing_lifecycle() {
        let state = seeded_state().await;
        let sonia = token_for(&state, "S@O.N").await;
        let marcos = token_for(&state, "M@R.C").await;
        let app = create_router(state);

        let new_listing = json!({
            "title": "soup kitchen",
            "date": "2025-12-24",
            "description": "serve dinner",
            "kind": "request"
        });

        let (status, _) = send(&app, "POST", "/api/listings", None, Some(new_listing.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) = send(
            &app,
            "POST",
            "/api/listings",
            Some(&sonia),
            Some(new_listing),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], json!("SOUP KITCHEN"));
        assert_eq!(created["owner_email"], json!("S@O.N"));
        let id = created["id"].as_i64().unwrap();

        let (status, mine) = send(&app, "GET", "/api/listings/mine", Some(&sonia), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 2);

        let uri = format!("/api/listings/{}", id);
        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(&marcos),
            Some(json!({ "title": "mine now" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, updated) = send(
            &app,
            "PATCH",
            &uri,
            Some(&sonia),
            Some(json!({ "kind": "offer" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["kind"], json!("offer"));

        let (status, _) = send(&app, "DELETE", &uri, Some(&marcos), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", &uri, Some(&sonia), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_user_endpoints() {
        let state = seeded_state().await;
        let admin = token_for(&state, "L@A.U").await;
        let marcos = token_for(&state, "M@R.C").await;
        let app = create_router(state);

        let (status, _) = send(&app, "GET", "/api/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, body) = send(&app, "GET", "/api/users", Some(&marcos), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", "/api/users", Some(&admin), None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (status, _) = send(&app, "GET", "/api/users/S@O.N", Some(&marcos), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "boss", "email": "b@o.ss", "password": "123", "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created) = send(
            &app,
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "name": "boss", "email": "b@o.ss", "password": "123", "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], json!("admin"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "again", "email": "b@o.ss", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "DELETE", "/api/users/b@o.ss", Some(&marcos), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", "/api/users/b@o.ss", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_malformed_input_gets_json_errors() {
        let state = seeded_state().await;
        let sonia = token_for(&state, "S@O.N").await;
        let app = create_router(state);

        let listing = |kind: &str| {
            json!({
                "title": "BEACH CLEANUP",
                "date": "2025-11-02",
                "description": "Bring gloves",
                "kind": kind,
            })
        };

        let (status, body) = send(
            &app,
            "POST",
            "/api/listings",
            Some(&sonia),
            Some(listing("gift")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("gift"));

        let (status, created) = send(
            &app,
            "POST",
            "/api/listings",
            Some(&sonia),
            Some(listing("Offer")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["kind"], json!("offer"));

        let (status, body) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "only a name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", "/api/listings/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", "/api/listings/kind?kind=gift", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_registration_conflicts_ignore_email_case() {
        let app = create_router(seeded_state().await);

        let (status, body) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(json!({ "name": "copy", "email": "m@r.c", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("m@r.c"));
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let app = create_router(seeded_state().await);

        let (status, body) = send(&app, "GET", "/api/listings/mine", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "invalid token" }));
    }

    #[tokio::test]
    async fn test_graphql_over_http_uses_bearer_token() {
        let state = seeded_state().await;
        let marcos = token_for(&state, "M@R.C").await;
        let app = create_router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/graphql",
            Some(&marcos),
            Some(json!({ "query": "{ listings { id } }" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": { "listings": [{ "id": 2 }] } }));
    }
}
