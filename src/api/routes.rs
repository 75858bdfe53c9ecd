/*
* Flavor Plugin Endpoint
* ----------------------
*
* JSON over HTTP, one POST route per plugin method:
*
* POST /Plugin.Implements  - which plugin interfaces we speak
* POST /Flavor.Validate    - {"Properties": ...}                 -> {"Type", "AllocationMethod"}
* POST /Flavor.Prepare     - {"Properties": ..., "Spec": {...}}  -> {"Spec": {...}}
* POST /Flavor.Healthy     - {"Instance": {...}}                 -> {"Healthy": bool}
*
* Handlers are thin: decode, call the Flavor, encode. Errors map to status
* codes in api::error.
*/

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::error::ErrorResponse;
use crate::core::instance::{AllocationMethod, InstanceDescription, InstanceSpec, Role};
use crate::flavor::Flavor;

pub const FLAVOR_INTERFACE_VERSION: &str = "0.1.0";

#[derive(Clone)]
pub struct AppState {
    pub flavor: Arc<dyn Flavor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InterfaceSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Version")]
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImplementsResponse {
    #[serde(rename = "Interfaces")]
    pub interfaces: Vec<InterfaceSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(rename = "Properties", default)]
    pub properties: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    #[serde(rename = "Type")]
    pub role: Role,
    #[serde(rename = "AllocationMethod")]
    pub allocation: AllocationMethod,
}

#[derive(Debug, Deserialize)]
pub struct PrepareRequest {
    #[serde(rename = "Properties", default)]
    pub properties: Value,
    #[serde(rename = "Spec", default)]
    pub spec: InstanceSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrepareResponse {
    #[serde(rename = "Spec")]
    pub spec: InstanceSpec,
}

#[derive(Debug, Deserialize)]
pub struct HealthyRequest {
    #[serde(rename = "Instance", default)]
    pub instance: InstanceDescription,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthyResponse {
    #[serde(rename = "Healthy")]
    pub healthy: bool,
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/Plugin.Implements", post(implements))
        .route("/Flavor.Validate", post(validate))
        .route("/Flavor.Prepare", post(prepare))
        .route("/Flavor.Healthy", post(healthy))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn implements() -> Json<ImplementsResponse> {
    Json(ImplementsResponse {
        interfaces: vec![InterfaceSpec {
            name: "Flavor".to_string(),
            version: FLAVOR_INTERFACE_VERSION.to_string(),
        }],
    })
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ErrorResponse> {
    let (role, allocation) = state.flavor.validate_group(&req.properties)?;
    Ok(Json(ValidateResponse { role, allocation }))
}

async fn prepare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PrepareRequest>,
) -> Result<Json<PrepareResponse>, ErrorResponse> {
    let spec = state.flavor.prepare(&req.properties, req.spec).await?;
    Ok(Json(PrepareResponse { spec }))
}

async fn healthy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HealthyRequest>,
) -> Result<Json<HealthyResponse>, ErrorResponse> {
    let healthy = state.flavor.healthy(&req.instance).await?;
    Ok(Json(HealthyResponse { healthy }))
}

/// Bind and serve until the process is stopped.
pub async fn serve(app_state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Flavor plugin listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(app_state)).await?;
    Ok(())
}
