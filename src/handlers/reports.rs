use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::BuyerUser;
use crate::entities::RfqStatus;
use crate::errors::ApiError;
use crate::handlers::AppState;
use crate::services::reports::ReportFile;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/rfqs", get(portfolio_report))
        .route("/quotations/:rfq_id", get(quotes_report))
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub status: Option<RfqStatus>,
}

fn download_response(report: ReportFile) -> Result<impl IntoResponse, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(XLSX_CONTENT_TYPE),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.filename))
            .map_err(|_| ApiError::InternalServerError)?,
    );
    Ok((headers, report.bytes))
}

/// Portfolio-wide replies report, optionally filtered by RFQ status.
async fn portfolio_report(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.services.reports.portfolio_report(params.status).await?;
    download_response(report)
}

/// Quote comparison for one RFQ, covering every revision of every reply.
async fn quotes_report(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.services.reports.quotes_report(rfq_id).await?;
    download_response(report)
}
