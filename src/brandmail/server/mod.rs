// SPDX-License-Identifier: MIT

//! HTTP surface for the email workflow, mounted at `/generatemail`

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::brandmail::error::{BrandmailError, WorkflowError};
use crate::brandmail::workflow::{EmailWorkflow, WorkflowEvent, WorkflowState};

type SharedWorkflow = Arc<EmailWorkflow>;

pub fn router(workflow: SharedWorkflow) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/generatemail/input_schema") }))
        .route("/api/health", get(health_check))
        .route("/generatemail/invoke", post(invoke))
        .route("/generatemail/batch", post(batch))
        .route("/generatemail/stream", post(stream))
        .route("/generatemail/input_schema", get(record_schema))
        .route("/generatemail/output_schema", get(record_schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(workflow)
}

/// Bind a listener on `host:port`, resolving hostnames such as `localhost`
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, BrandmailError> {
    Ok(TcpListener::bind((host, port)).await?)
}

pub async fn serve(
    workflow: SharedWorkflow,
    host: &str,
    port: u16,
) -> Result<(), BrandmailError> {
    let listener = bind(host, port).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(workflow)).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub input: WorkflowState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub output: WorkflowState,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub inputs: Vec<WorkflowState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub output: Vec<WorkflowState>,
}

/// Workflow failures surface as a bare 500
pub struct ApiError(WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn record_schema() -> Json<Value> {
    Json(json!(schema_for!(WorkflowState)))
}

async fn invoke(
    State(workflow): State<SharedWorkflow>,
    Json(payload): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let output = workflow.run(payload.input).await?;
    Ok(Json(InvokeResponse { output }))
}

async fn batch(
    State(workflow): State<SharedWorkflow>,
    Json(payload): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    log::info!("Running batch of {} workflows", payload.inputs.len());
    let runs = payload
        .inputs
        .into_iter()
        .map(|input| workflow.run(input));
    let output = futures::future::try_join_all(runs).await?;
    Ok(Json(BatchResponse { output }))
}

async fn stream(
    State(workflow): State<SharedWorkflow>,
    Json(payload): Json<InvokeRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        if let Err(e) = workflow.run_stream(payload.input, tx).await {
            log::error!("Streaming workflow failed: {}", e);
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| Ok(to_sse_event(event)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}

fn to_sse_event(event: WorkflowEvent) -> Event {
    let built = match event {
        WorkflowEvent::NodeCompleted { node, state } => Event::default()
            .event("data")
            .json_data(json!({ "node": node.name(), "state": state })),
        WorkflowEvent::Completed { state } => Event::default()
            .event("end")
            .json_data(json!({ "output": state })),
        WorkflowEvent::Error { message } => Ok(Event::default().event("error").data(message)),
    };

    built.unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
