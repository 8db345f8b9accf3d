use super::*;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use shared::{
    domain::FieldName,
    error::ErrorCode,
    protocol::OwnerNotificationParams,
};
use std::time::Duration;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct ServerState {
    received: Arc<Mutex<Vec<SendEmailRequest>>>,
    status: StatusCode,
    delay: Duration,
}

async fn handle_send(
    State(state): State<ServerState>,
    Json(payload): Json<SendEmailRequest>,
) -> (StatusCode, &'static str) {
    tokio::time::sleep(state.delay).await;
    state.received.lock().await.push(payload);
    if state.status.is_success() {
        (state.status, "OK")
    } else {
        (state.status, "The template ID is invalid")
    }
}

async fn spawn_email_server(
    status: StatusCode,
    delay: Duration,
) -> (String, Arc<Mutex<Vec<SendEmailRequest>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        received: Arc::clone(&received),
        status,
        delay,
    };
    let app = Router::new()
        .route("/api/v1.0/email/send", post(handle_send))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api/v1.0/email/send"), received)
}

fn settings_for(endpoint: String) -> Settings {
    Settings {
        email_endpoint: endpoint,
        public_key: "public-key".into(),
        ..Settings::default()
    }
}

fn owner_notification() -> Notification {
    Notification::owner(OwnerNotificationParams {
        from_name: "Ada Lovelace".into(),
        from_email: "ada@example.org".into(),
        subject: "collaboration".into(),
        message: "Let's build an engine together.".into(),
    })
}

#[tokio::test]
async fn owner_notification_posts_owner_template_and_params() {
    let (endpoint, received) = spawn_email_server(StatusCode::OK, Duration::ZERO).await;
    let transport = EmailJsTransport::new(&settings_for(endpoint)).expect("transport");

    transport.send(owner_notification()).await.expect("send");

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.service_id.as_str(), "service_p8mb7fk");
    assert_eq!(request.template_id.as_str(), "template_1hojypr");
    assert_eq!(request.user_id, "public-key");
    assert_eq!(request.template_params["from_name"], "Ada Lovelace");
    assert_eq!(request.template_params["from_email"], "ada@example.org");
    assert_eq!(request.template_params.len(), 4);
}

#[tokio::test]
async fn auto_reply_uses_auto_reply_template_and_field_names() {
    let (endpoint, received) = spawn_email_server(StatusCode::OK, Duration::ZERO).await;
    let transport = EmailJsTransport::new(&settings_for(endpoint)).expect("transport");

    transport
        .send(Notification::auto_reply([
            (FieldName::Name, "Ada".to_string()),
            (FieldName::Email, "ada@example.org".to_string()),
        ]))
        .await
        .expect("send");

    let received = received.lock().await;
    assert_eq!(received[0].template_id.as_str(), "template_crvnpvk");
    assert_eq!(received[0].template_params["email"], "ada@example.org");
}

#[tokio::test]
async fn non_success_status_is_rejected_with_body() {
    let (endpoint, _received) = spawn_email_server(StatusCode::BAD_REQUEST, Duration::ZERO).await;
    let transport = EmailJsTransport::new(&settings_for(endpoint)).expect("transport");

    let err = transport
        .send(owner_notification())
        .await
        .expect_err("must fail");
    assert_eq!(err.code, ErrorCode::Rejected);
    assert_eq!(err.message, "status 400: The template ID is invalid");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let transport = EmailJsTransport::new(&settings_for(format!("http://{addr}/send")))
        .expect("transport");
    let err = transport
        .send(owner_notification())
        .await
        .expect_err("must fail");
    assert_eq!(err.code, ErrorCode::Transport);
}

#[tokio::test]
async fn slow_service_times_out() {
    let (endpoint, _received) = spawn_email_server(StatusCode::OK, Duration::from_secs(5)).await;
    let settings = Settings {
        request_timeout_secs: 1,
        ..settings_for(endpoint)
    };
    let transport = EmailJsTransport::new(&settings).expect("transport");

    let err = transport
        .send(owner_notification())
        .await
        .expect_err("must time out");
    assert_eq!(err.code, ErrorCode::Timeout);
}

#[tokio::test]
async fn missing_public_key_selects_missing_transport() {
    let transport = build_transport(&Settings::default()).expect("transport");
    let err = transport
        .send(owner_notification())
        .await
        .expect_err("must fail");
    assert_eq!(err.code, ErrorCode::Misconfigured);
}

#[test]
fn invalid_endpoint_is_reported() {
    let err = EmailJsTransport::new(&settings_for("not a url".into()))
        .err()
        .expect("must fail");
    assert!(err.to_string().contains("invalid email endpoint"));
}
