use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::entities::rfq_part::OrderType;
use crate::entities::supplier;
use crate::errors::{ApiError, ServiceError};
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::handlers::AppState;
use crate::services::replies::{NewReplyInput, QuotePartInput, RequoteInput, TermsInput};

pub fn reply_routes() -> Router<AppState> {
    Router::new()
        .route("/reply", post(submit_reply))
        .route("/reply/:id/requote", post(submit_requote))
}

/// Quoted costs for one part, as sent by the supplier UI.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuotePartRequest {
    #[validate(length(min = 1, message = "part number is required"))]
    pub part_no: String,
    #[serde(default)]
    pub part_description: String,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    pub order_type: OrderType,
    pub unit_rate: Option<Decimal>,
    pub material_cost: Option<Decimal>,
    pub process_cost: Option<Decimal>,
    pub overhead_cost: Option<Decimal>,
    pub packing_cost: Option<Decimal>,
    pub tool_cost: Option<Decimal>,
    pub tool_lead_time: Option<i32>,
    pub tool_cavity: Option<i32>,
    pub tool_life: Option<i32>,
    #[serde(default)]
    pub sample_lead_time: i32,
    #[serde(default)]
    pub production_lead_time: i32,
}

impl From<QuotePartRequest> for QuotePartInput {
    fn from(p: QuotePartRequest) -> Self {
        QuotePartInput {
            part_no: p.part_no,
            part_description: p.part_description,
            quantity: p.quantity,
            order_type: p.order_type,
            unit_rate: p.unit_rate,
            material_cost: p.material_cost,
            process_cost: p.process_cost,
            overhead_cost: p.overhead_cost,
            packing_cost: p.packing_cost,
            tool_cost: p.tool_cost,
            tool_lead_time: p.tool_lead_time,
            tool_cavity: p.tool_cavity,
            tool_life: p.tool_life,
            sample_lead_time: p.sample_lead_time,
            production_lead_time: p.production_lead_time,
        }
    }
}

/// The `quoteDetails` multipart field.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDetailsRequest {
    pub rfq_id: Option<Uuid>,
    #[serde(default = "default_currency")]
    pub currency: String,
    // emptiness is checked in the service layer
    #[validate]
    pub parts: Vec<QuotePartRequest>,
}

fn default_currency() -> String {
    "INR".to_string()
}

/// The `terms` multipart field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsRequest {
    #[serde(default)]
    pub payment_terms: String,
    #[serde(default)]
    pub delivery_terms: String,
    #[serde(default)]
    pub freight_terms: String,
    #[serde(default)]
    pub remarks: String,
}

impl From<TermsRequest> for TermsInput {
    fn from(t: TermsRequest) -> Self {
        TermsInput {
            payment_terms: t.payment_terms,
            delivery_terms: t.delivery_terms,
            freight_terms: t.freight_terms,
            remarks: t.remarks,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReplyResponse {
    reply_id: Uuid,
}

/// An uploaded attachment, buffered until the storage path is known.
struct BufferedFile {
    field: String,
    extension: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Parsed form data shared by the submit and re-quote endpoints.
struct ReplyForm {
    details: QuoteDetailsRequest,
    terms: TermsRequest,
    files: Vec<BufferedFile>,
}

fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!(".{ext}"),
        _ => String::new(),
    }
}

/// Reads the multipart body: JSON fields parsed, attachments buffered.
///
/// Multipart is single-pass and the storage path depends on the RFQ id inside
/// `quoteDetails`, so files are held in memory and uploaded afterwards.
async fn parse_reply_form(mut multipart: Multipart) -> Result<ReplyForm, ApiError> {
    let mut details: Option<QuoteDetailsRequest> = None;
    let mut terms = TermsRequest::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "quoteDetails" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable quoteDetails: {e}")))?;
                details = Some(serde_json::from_str(&text).map_err(|e| {
                    ApiError::BadRequest(format!("invalid quoteDetails JSON: {e}"))
                })?);
            }
            "terms" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable terms: {e}")))?;
                terms = serde_json::from_str(&text)
                    .map_err(|e| ApiError::BadRequest(format!("invalid terms JSON: {e}")))?;
            }
            "breakupFile" | "drawingFile" => {
                let extension = file_extension(field.file_name().unwrap_or_default());
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("unreadable {name}: {e}")))?;

                files.push(BufferedFile {
                    field: name,
                    extension,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let details = details
        .ok_or_else(|| ApiError::BadRequest("missing quoteDetails field".to_string()))?;
    validate_input(&details)?;

    Ok(ReplyForm {
        details,
        terms,
        files,
    })
}

/// Stores the buffered attachments under the RFQ's folder and returns
/// (cost breakup URL, drawing URL).
async fn store_attachments(
    state: &AppState,
    rfq_id: Uuid,
    files: Vec<BufferedFile>,
) -> Result<(Option<String>, Option<String>), ApiError> {
    let mut cost_breakup_url = None;
    let mut drawing_url = None;

    for file in files {
        let path = format!(
            "supplier_replies/{rfq_id}/{}_{}{}",
            file.field,
            Utc::now().timestamp_millis(),
            file.extension
        );
        let url = state
            .storage
            .upload(&path, &file.content_type, file.bytes)
            .await?;

        if file.field == "breakupFile" {
            cost_breakup_url = Some(url);
        } else {
            drawing_url = Some(url);
        }
    }

    Ok((cost_breakup_url, drawing_url))
}

/// Resolves the caller to a supplier profile; non-supplier accounts get 403.
async fn require_supplier(
    state: &AppState,
    caller: &AuthenticatedUser,
) -> Result<supplier::Model, ApiError> {
    match state.services.suppliers.get_supplier(caller.uid).await {
        Ok(supplier) => Ok(supplier),
        Err(ServiceError::NotFound(_)) => Err(ApiError::Forbidden(
            "supplier account required".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Supplier submits the first quotation for an RFQ (multipart).
async fn submit_reply(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = require_supplier(&state, &caller).await?;
    let form = parse_reply_form(multipart).await?;

    let rfq_id = form
        .details
        .rfq_id
        .ok_or_else(|| ApiError::BadRequest("quoteDetails.rfqId is required".to_string()))?;

    let (cost_breakup_url, drawing_url) = store_attachments(&state, rfq_id, form.files).await?;

    let input = NewReplyInput {
        rfq_id,
        currency: form.details.currency,
        terms: form.terms.into(),
        parts: form.details.parts.into_iter().map(Into::into).collect(),
        cost_breakup_url,
        drawing_url,
    };

    let detail = state.services.replies.submit_reply(&supplier, input).await?;

    Ok(created_response(SubmitReplyResponse {
        reply_id: detail.reply.id,
    }))
}

/// Supplier appends a re-quote revision to their reply (multipart).
async fn submit_requote(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(reply_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = require_supplier(&state, &caller).await?;
    let form = parse_reply_form(multipart).await?;

    // Attachment folder follows the reply's RFQ, same as the original submit.
    let reply = state.services.replies.get_reply(reply_id).await?;
    let (cost_breakup_url, drawing_url) =
        store_attachments(&state, reply.reply.rfq_id, form.files).await?;

    let input = RequoteInput {
        terms: form.terms.into(),
        parts: form.details.parts.into_iter().map(Into::into).collect(),
        cost_breakup_url,
        drawing_url,
    };

    let detail = state
        .services
        .replies
        .submit_requote(&supplier, reply_id, input)
        .await?;

    Ok(success_response(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_preserved() {
        assert_eq!(file_extension("costs.xlsx"), ".xlsx");
        assert_eq!(file_extension("drawing.rev2.pdf"), ".pdf");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn quote_details_parse_from_portal_json() {
        let json = r#"{
            "rfqId": "7f2c1c2e-5a85-4f3e-9d1c-111111111111",
            "currency": "INR",
            "parts": [{
                "partNo": "P-100",
                "partDescription": "Bracket",
                "quantity": 100,
                "orderType": "annual",
                "materialCost": "10.00",
                "processCost": 5.0,
                "sampleLeadTime": 14,
                "productionLeadTime": 30
            }]
        }"#;
        let details: QuoteDetailsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(details.parts.len(), 1);
        assert_eq!(details.parts[0].part_no, "P-100");
        assert!(details.parts[0].unit_rate.is_none());
    }

    #[test]
    fn missing_currency_defaults() {
        let json = r#"{"parts": [{"partNo": "P-1", "quantity": 1, "orderType": "oneTime"}]}"#;
        let details: QuoteDetailsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(details.currency, "INR");
    }
}
