//! Sourcing API Library
//!
//! Backend for a B2B sourcing portal: buyers issue RFQs to suppliers,
//! suppliers answer with quotations and re-quotes, buyers compare and export.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;

use crate::clients::identity::IdentityProvider;
use crate::clients::storage::ObjectStore;

/// Shared application state carried by every handler.
///
/// All external handles (database, identity provider, downstream services) are
/// constructed once at startup and injected here; nothing in the crate reaches
/// for process-global state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub services: handlers::AppServices,
}

/// Full route tree for the portal API.
///
/// Paths mirror the portal's public surface: RFQ and reply flows under `/api`,
/// admin user management at the root, supplier account management under
/// `/supplier`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/quotations", handlers::quotations::quotation_routes())
        .nest("/api/supplier", handlers::replies::reply_routes())
        .nest("/api/reports", handlers::reports::report_routes())
        .merge(handlers::users::user_routes())
        .nest("/supplier", handlers::suppliers::supplier_routes())
        .merge(handlers::health::health_routes())
}
