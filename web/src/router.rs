use crate::controller::{health_check_controller, notification_controller};
use crate::sse::handler::notifications_feed;
use crate::AppState;
use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use log::*;
use tower_http::cors::CorsLayer;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(notification_routes(app_state.clone()))
        .merge(realtime_routes(app_state))
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications", post(notification_controller::create))
        .with_state(app_state)
}

fn realtime_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            &format!("/realtime/v1/{}", domain::notification::TABLE),
            get(notifications_feed),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use clap::Parser as _;
    use domain::Id;
    use serde_json::{json, Value};
    use service::config::Config;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Config::parse_from(["mei_dashboard"]))
    }

    fn post_notification(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/notifications")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_check_responds_healthy() {
        let response = define_routes(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn create_notification_returns_created_row() {
        let user_id = Id::new_v4();

        let response = define_routes(test_state())
            .oneshot(post_notification(json!({
                "user_id": user_id,
                "title": "Invoice due",
                "body": "Client X"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status_code"], 201);
        assert_eq!(value["data"]["title"], "Invoice due");
        assert_eq!(value["data"]["user_id"], user_id.to_string());
    }

    #[tokio::test]
    async fn create_notification_with_blank_title_is_unprocessable() {
        let response = define_routes(test_state())
            .oneshot(post_notification(json!({
                "user_id": Id::new_v4(),
                "title": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn created_notification_is_routed_to_owner_connection() {
        let state = test_state();
        let user_id = Id::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state
            .sse_manager
            .register_connection(user_id.to_string(), tx);

        let response = define_routes(state)
            .oneshot(post_notification(json!({
                "user_id": user_id,
                "title": "Stock low",
                "body": "Item 42"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn realtime_feed_requires_a_user_filter() {
        let response = define_routes(test_state())
            .oneshot(
                Request::get("/realtime/v1/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn realtime_feed_opens_event_stream_and_cleans_up_on_drop() {
        let state = test_state();
        let uri = format!(
            "/realtime/v1/notifications?filter=user_id%3Deq.{}",
            Id::new_v4()
        );

        let response = define_routes(state.clone())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(state.sse_manager.connection_count(), 1);

        // Dropping the body is what a client disconnect looks like to the handler
        drop(response);
        assert_eq!(state.sse_manager.connection_count(), 0);
    }

    async fn serve(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, define_routes(state)).await.unwrap();
        });
        format!("http://{address}")
    }

    async fn post_over_http(base_url: &str, user_id: &str, title: &str) {
        let response = reqwest::Client::new()
            .post(format!("{base_url}/notifications"))
            .json(&json!({ "user_id": user_id, "title": title, "body": "Client X" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn bridge_over_sse_renders_inserts_until_unmounted() {
        use bridge::alert::AlertHistory;
        use bridge::error::{ErrorKind, SubscribeErrorKind};
        use bridge::feed::SseFeed;
        use bridge::{BridgeState, NotificationBridge, Session};

        const WAIT: Duration = Duration::from_secs(5);

        let state = test_state();
        let base_url = serve(state.clone()).await;
        let user_id = Id::new_v4().to_string();
        let history = Arc::new(AlertHistory::new());
        let notification_bridge =
            NotificationBridge::new(Arc::new(SseFeed::new(&base_url)), history.clone());

        let mut handle = notification_bridge.mount(Session::new(&user_id));
        let settled = tokio::time::timeout(WAIT, handle.settled()).await.unwrap();
        assert_eq!(settled, BridgeState::Subscribed);
        assert_eq!(state.sse_manager.connection_count(), 1);

        post_over_http(&base_url, &user_id, "Invoice due").await;
        assert!(history.wait_for(1, WAIT).await);
        let alerts = history.alerts();
        assert_eq!(alerts[0].title, "Invoice due");
        assert_eq!(alerts[0].description, "Client X");

        handle.unmount().await.unwrap();
        post_over_http(&base_url, &user_id, "After unmount").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(history.len(), 1);

        // The server rejects a filter that is not a uuid
        let mut handle = notification_bridge.mount(Session::new("u1"));
        let settled = tokio::time::timeout(WAIT, handle.settled()).await.unwrap();
        assert_eq!(settled, BridgeState::Inactive);
        let err = handle.unmount().await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Subscribe(SubscribeErrorKind::Unavailable)
        );
        assert_eq!(history.len(), 1);
    }
}
