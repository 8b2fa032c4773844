use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::auth::BuyerUser;
use crate::entities::rfq_part::OrderType;
use crate::entities::RfqStatus;
use crate::errors::ApiError;
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::handlers::AppState;
use crate::services::quotations::{CreateRfqInput, NewRfqPart};

pub fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rfqs).post(create_rfq))
        .route("/:id/parts", put(update_parts))
        .route("/:id/request-requote", post(request_requote))
        .route("/:id/replies", get(list_replies))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RfqPartRequest {
    #[validate(length(min = 1, message = "part number is required"))]
    pub part_no: String,
    #[validate(length(min = 1, message = "part description is required"))]
    pub part_description: String,
    #[serde(default)]
    pub draw_revision: String,
    pub order_type: OrderType,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
}

impl From<RfqPartRequest> for NewRfqPart {
    fn from(p: RfqPartRequest) -> Self {
        NewRfqPart {
            part_no: p.part_no,
            part_description: p.part_description,
            draw_revision: p.draw_revision,
            order_type: p.order_type,
            quantity: p.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRfqRequest {
    #[validate(length(min = 1, message = "project name is required"))]
    pub project_name: String,
    pub submission_date: DateTime<Utc>,
    #[serde(default)]
    pub comments: String,
    pub drawing_file_name: Option<String>,
    // emptiness is checked in the service layer
    #[validate]
    pub parts: Vec<RfqPartRequest>,
    #[validate(length(min = 1, message = "at least one supplier is required"))]
    pub supplier_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRfqResponse {
    id: Uuid,
    rfq_number: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRfqsParams {
    pub status: Option<RfqStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartsRequest {
    #[validate]
    pub parts: Vec<RfqPartRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestRequoteRequest {
    #[validate(length(min = 1, message = "at least one supplier is required"))]
    pub supplier_ids: Vec<Uuid>,
}

/// Lists RFQs, newest first. Runs the expiry sweep first so the listing never
/// shows a pending RFQ past its grace period.
async fn list_rfqs(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Query(params): Query<ListRfqsParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.expiry.sweep(Utc::now()).await?;
    let rfqs = state.services.quotations.list_rfqs(params.status).await?;
    Ok(success_response(rfqs))
}

/// Creates an RFQ and emails the invited suppliers asynchronously.
async fn create_rfq(
    State(state): State<AppState>,
    buyer: BuyerUser,
    Json(payload): Json<CreateRfqRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateRfqInput {
        project_name: payload.project_name,
        submission_date: payload.submission_date,
        comments: payload.comments,
        drawing_file_name: payload.drawing_file_name,
        parts: payload.parts.into_iter().map(Into::into).collect(),
        supplier_ids: payload.supplier_ids.clone(),
    };

    let detail = state
        .services
        .quotations
        .create_rfq(buyer.user.id, input)
        .await?;

    // Fire-and-forget: the invitation emails must not delay or fail creation.
    let services = state.services.clone();
    let rfq = detail.rfq.clone();
    let parts = detail.parts.clone();
    let supplier_ids = payload.supplier_ids;
    tokio::spawn(async move {
        match services.suppliers.list_by_ids(&supplier_ids).await {
            Ok(suppliers) => {
                let recipients: Vec<String> = suppliers.into_iter().map(|s| s.email).collect();
                services
                    .notifications
                    .notify_rfq_created(&rfq, &parts, recipients)
                    .await;
            }
            Err(e) => error!("could not load invited suppliers for notification: {}", e),
        }
    });

    Ok(created_response(CreateRfqResponse {
        id: detail.rfq.id,
        rfq_number: detail.rfq.rfq_number,
    }))
}

/// Overwrites the parts list of a pending RFQ.
async fn update_parts(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let detail = state
        .services
        .quotations
        .update_parts(id, payload.parts.into_iter().map(Into::into).collect())
        .await?;

    Ok(success_response(detail))
}

/// Flags the named suppliers for a re-quote and notifies them by email.
async fn request_requote(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequestRequoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    state
        .services
        .quotations
        .request_requote(id, payload.supplier_ids.clone())
        .await?;

    let detail = state.services.quotations.get_rfq(id).await?;

    let services = state.services.clone();
    let rfq = detail.rfq.clone();
    let supplier_ids = payload.supplier_ids;
    tokio::spawn(async move {
        match services.suppliers.list_by_ids(&supplier_ids).await {
            Ok(suppliers) => {
                let recipients: Vec<String> = suppliers.into_iter().map(|s| s.email).collect();
                services
                    .notifications
                    .notify_requote_requested(&rfq, recipients)
                    .await;
            }
            Err(e) => error!("could not load suppliers for re-quote notification: {}", e),
        }
    });

    Ok(success_response(detail))
}

/// Full reply and revision history for one RFQ, for buyer comparison.
async fn list_replies(
    State(state): State<AppState>,
    _buyer: BuyerUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let replies = state.services.replies.list_replies(id).await?;
    Ok(success_response(replies))
}
