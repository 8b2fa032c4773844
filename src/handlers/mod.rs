pub mod common;
pub mod health;
pub mod quotations;
pub mod replies;
pub mod reports;
pub mod suppliers;
pub mod users;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::clients::email::Mailer;
use crate::clients::identity::IdentityProvider;
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    ExpiryService, NotificationService, QuotationService, ReplyService, ReportService,
    SupplierService, UserService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub quotations: QuotationService,
    pub replies: ReplyService,
    pub reports: ReportService,
    pub users: UserService,
    pub suppliers: SupplierService,
    pub expiry: ExpiryService,
    pub notifications: NotificationService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn Mailer>,
        config: &AppConfig,
    ) -> Self {
        let quotations = QuotationService::new(db.clone(), event_sender.clone());
        let replies = ReplyService::new(db.clone(), event_sender.clone());
        let reports = ReportService::new(quotations.clone(), replies.clone());
        let users = UserService::new(db.clone(), identity.clone(), event_sender.clone());
        let suppliers = SupplierService::new(db.clone(), identity, event_sender.clone());
        let expiry = ExpiryService::new(db, event_sender);
        let notifications = NotificationService::new(mailer, config.portal_url.clone());

        Self {
            quotations,
            replies,
            reports,
            users,
            suppliers,
            expiry,
            notifications,
        }
    }
}
