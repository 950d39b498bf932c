use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::profile;
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1.0",
            Router::new()
                .merge(profile::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::build_app;
    use crate::config::MailConfig;
    use crate::mail::{
        testing::{FailingMailer, RecordingMailer},
        LogMailer, Mailer,
    };
    use crate::profile::repo::InMemoryUserStore;
    use crate::state::AppState;

    fn register_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1.0/register")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app_with(store: Arc<InMemoryUserStore>, mailer: Arc<dyn Mailer>) -> axum::Router {
        build_app(AppState::fake(store, mailer))
    }

    #[tokio::test]
    async fn register_returns_created_profile() {
        let store = Arc::new(InMemoryUserStore::new());
        let app = app_with(store, Arc::new(LogMailer));

        let res = app
            .oneshot(register_request(
                json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = json_body(res).await;
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["email"], "ada@x.com");
        assert_eq!(body["isAccountVerified"], false);
        let id = body["userId"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());

        let keys = body.as_object().unwrap();
        assert_eq!(keys.len(), 4);
        for hidden in ["password", "verifyOtp", "resetOtp", "verifyOtpExpireAt", "resetOtpExpireAt"] {
            assert!(!keys.contains_key(hidden), "{hidden} leaked");
        }
        assert!(!body.to_string().contains("p1"));
    }

    #[tokio::test]
    async fn second_registration_is_conflict() {
        let store = Arc::new(InMemoryUserStore::new());
        let app = app_with(store.clone(), Arc::new(LogMailer));
        let payload = json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" });

        let first = app
            .clone()
            .oneshot(register_request(payload.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(register_request(payload)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(
            json_body(second).await,
            json!({ "message": "Email already exists" })
        );
        assert_eq!(store.count_by_email("ada@x.com"), 1);
    }

    #[tokio::test]
    async fn welcome_mail_goes_to_new_user() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(Arc::new(InMemoryUserStore::new()), mailer.clone());

        let res = app
            .oneshot(register_request(
                json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@x.com");
        assert_eq!(sent[0].from, "test@triagentdesk.local");
    }

    #[tokio::test]
    async fn disabled_welcome_mail_is_not_sent() {
        let store = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::fake_with_mail(
            store.clone(),
            mailer.clone(),
            MailConfig {
                welcome_enabled: false,
                from: "test@triagentdesk.local".into(),
            },
        );

        let res = build_app(state)
            .oneshot(register_request(
                json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(store.count_by_email("ada@x.com"), 1);
        assert_eq!(mailer.sent.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn conflict_sends_no_mail() {
        let store = Arc::new(InMemoryUserStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(store, mailer.clone());
        let payload = json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" });

        app.clone()
            .oneshot(register_request(payload.clone()))
            .await
            .unwrap();
        let res = app.oneshot(register_request(payload)).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mail_failure_does_not_fail_registration() {
        let store = Arc::new(InMemoryUserStore::new());
        let app = app_with(store.clone(), Arc::new(FailingMailer));

        let res = app
            .oneshot(register_request(
                json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(store.count_by_email("ada@x.com"), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_client_error() {
        let app = app_with(Arc::new(InMemoryUserStore::new()), Arc::new(LogMailer));

        let res = app
            .oneshot(register_request(json!({ "name": "Ada", "email": "ada@x.com" })))
            .await
            .unwrap();
        assert!(res.status().is_client_error());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_with(Arc::new(InMemoryUserStore::new()), Arc::new(LogMailer));
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1.0/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn unknown_version_prefix_is_not_found() {
        let app = app_with(Arc::new(InMemoryUserStore::new()), Arc::new(LogMailer));
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/register")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "name": "Ada", "email": "ada@x.com", "password": "p1" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
