use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use sea_orm::EntityTrait;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::entities::{user, SupplierType, UserRole};
use crate::errors::ApiError;
use crate::handlers::common::{created_response, no_content_response, success_response, validate_input};
use crate::handlers::AppState;
use crate::services::suppliers::{CreateSupplierInput, UpdateSupplierInput};

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/create-supplier", post(create_supplier))
        .route("/update-supplier/:uid", put(update_supplier))
        .route("/supplierdetails", get(supplier_details))
        .route("/delete-supplier/:uid", delete(delete_supplier))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub vendor_id: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub supplier_type: SupplierType,
    #[serde(default = "default_msme_status")]
    pub msme_status: String,
}

fn default_msme_status() -> String {
    "Not MSME".to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub msme_status: Option<String>,
}

async fn is_admin(state: &AppState, uid: Uuid) -> Result<bool, ApiError> {
    let user = user::Entity::find_by_id(uid)
        .one(state.db.as_ref())
        .await
        .map_err(|_| ApiError::InternalServerError)?;
    Ok(matches!(user, Some(u) if u.role == UserRole::Admin))
}

/// Admin onboards a supplier (identity account + profile).
async fn create_supplier(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .create_supplier(CreateSupplierInput {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            vendor_id: payload.vendor_id,
            phone: payload.phone,
            country: payload.country,
            location: payload.location,
            category: payload.category,
            sub_category: payload.sub_category,
            supplier_type: payload.supplier_type,
            msme_status: payload.msme_status,
        })
        .await?;

    Ok(created_response(supplier))
}

/// Updates a supplier profile. Suppliers may edit their own; anyone else
/// needs the admin role.
async fn update_supplier(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(uid): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.uid != uid && !is_admin(&state, caller.uid).await? {
        return Err(ApiError::Forbidden(
            "cannot edit another supplier's profile".to_string(),
        ));
    }

    let supplier = state
        .services
        .suppliers
        .update_supplier(
            uid,
            UpdateSupplierInput {
                name: payload.name,
                phone: payload.phone,
                country: payload.country,
                location: payload.location,
                category: payload.category,
                sub_category: payload.sub_category,
                msme_status: payload.msme_status,
            },
        )
        .await?;

    Ok(success_response(supplier))
}

/// The calling supplier's own profile.
async fn supplier_details(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state.services.suppliers.get_supplier(caller.uid).await?;
    Ok(success_response(supplier))
}

/// Admin removes a supplier, upstream account included.
async fn delete_supplier(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete_supplier(admin.user.id, uid)
        .await?;

    Ok(no_content_response())
}
