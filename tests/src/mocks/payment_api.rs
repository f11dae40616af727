use std::sync::{Arc, Mutex};

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer,
    dev::ServerHandle,
    http::StatusCode,
    web,
};
use serde_json::{Value, json};

/// One call received by [`MockPaymentApi`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub idempotency_key: Option<String>,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct ApiState {
    status: StatusCode,
    response_body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Stand-in for the hosted payment API. Answers every `POST /api/generate`
/// with a fixed status and body and records what it was sent.
pub struct MockPaymentApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: ServerHandle,
}

impl MockPaymentApi {
    pub fn start(status: u16, response_body: impl Into<String>) -> std::io::Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ApiState {
            status: StatusCode::from_u16(status).map_err(std::io::Error::other)?,
            response_body: response_body.into(),
            requests: requests.clone(),
        };

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .route("/api/generate", web::post().to(generate))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))?;

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        tokio::spawn(server);

        Ok(Self {
            base_url: format!("http://{addr}/api"),
            requests,
            handle,
        })
    }

    /// Answers with a created payment.
    pub fn created(id: &str, url: &str) -> std::io::Result<Self> {
        Self::start(200, json!({ "id": id, "url": url }).to_string())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn generate(req: HttpRequest, body: web::Bytes, state: web::Data<ApiState>) -> HttpResponse {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        path: req.path().to_string(),
        idempotency_key: header("Idempotency-Key"),
        api_key: header("Api-Key"),
        content_type: header("Content-Type"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    HttpResponse::build(state.status)
        .content_type("application/json")
        .body(state.response_body.clone())
}
