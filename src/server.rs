use crate::config::AppConfig;
use crate::data::EducationIndex;
use crate::index::CountyIndex;
use crate::scene::{tooltip_lines, CountyShape, Tooltip};
use crate::types::EducationRecord;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub shapes: Vec<CountyShape>,
    pub tree: CountyIndex,
    pub education: EducationIndex,
}

impl AppState {
    pub fn new(shapes: Vec<CountyShape>, education: EducationIndex) -> Self {
        info!("Building spatial index for {} shapes...", shapes.len());
        let tree = CountyIndex::build(&shapes);
        Self { shapes, tree, education }
    }
}

#[derive(Deserialize)]
pub struct PointParams {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
pub struct CountyParams {
    fips: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QueryResponse {
    pub fips: Option<String>,
    pub education: f64,
    pub fill: String,
    pub area_name: Option<String>,
    pub state: Option<String>,
    /// Tooltip text as the page would show it, with its position for a
    /// pointer at the queried point.
    pub tooltip: Option<TooltipResponse>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TooltipResponse {
    pub lines: Vec<String>,
    pub left: f64,
    pub top: f64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/query", get(query_handler))
        .route("/api/county", get(county_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = router(Arc::new(state)).fallback_service(ServeDir::new(&config.output.dir));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// County under a surface point.
pub fn query(state: &AppState, x: f64, y: f64) -> Option<QueryResponse> {
    let shape = state.shapes.get(state.tree.locate(&state.shapes, x, y)?)?;
    let tooltip = shape.record.as_ref().map(|record| TooltipResponse {
        lines: tooltip_lines(record).to_vec(),
        left: x + Tooltip::OFFSET_X,
        top: y + Tooltip::OFFSET_Y,
    });
    Some(QueryResponse {
        fips: shape.fips.as_ref().map(|f| f.to_string()),
        education: shape.education,
        fill: shape.fill.to_hex(),
        area_name: shape.record.as_ref().map(|r| r.area_name.clone()),
        state: shape.record.as_ref().map(|r| r.state.clone()),
        tooltip,
    })
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PointParams>,
) -> Json<Option<QueryResponse>> {
    Json(query(&state, params.x, params.y))
}

async fn county_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountyParams>,
) -> Json<Option<EducationRecord>> {
    Json(state.education.lookup_str(&params.fips).cloned())
}
