use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sms_core::InboundMessage;
use sms_twilio::TwilioInbound;
use sms_web_generic::{ResponseConverter, WebhookProcessor};

/// Name reported by the health check.
pub const SERVICE_NAME: &str = "phone-ai";

#[derive(Clone)]
pub struct AppState {
    pub processor: WebhookProcessor,
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = Response;

    fn from_webhook_response(response: sms_core::WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if response.is_empty() {
            return status.into_response();
        }
        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Health check: GET /
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Twilio messaging webhook: POST /sms
///
/// Missing `Body` or `From` fields are rejected by the `Form` extractor.
pub async fn sms_webhook(
    State(state): State<AppState>,
    Form(inbound): Form<TwilioInbound>,
) -> Response {
    let message: InboundMessage = inbound.into();
    let response = state.processor.process_webhook(&message).await;
    AxumResponseConverter::from_webhook_response(response)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/sms", post(sms_webhook))
        .with_state(state)
}
