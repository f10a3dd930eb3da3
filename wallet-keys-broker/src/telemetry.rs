use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{Instrument, Span, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false),
        )
        .try_init()
        .ok();

    Ok(())
}

pub fn correlation_header_value(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(value).ok()
}

pub async fn correlation_layer(mut req: Request<Body>, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header = correlation_header_value(&correlation_id);

    req.extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));
    if let Some(value) = header.clone() {
        req.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let span = info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        correlation_id = %correlation_id
    );

    let mut response = next.run(req).instrument(span).await;
    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

pub fn request_span(name: &str, correlation_id: &str) -> Span {
    info_span!(
        "broker.op",
        operation = name,
        correlation_id = %correlation_id
    )
}
