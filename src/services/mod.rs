//! Business logic for the sourcing portal.
//!
//! Services own all database access and status transitions; handlers stay
//! thin and translate between HTTP and these methods.

pub mod expiry;
pub mod notifications;
pub mod quotations;
pub mod replies;
pub mod reports;
pub mod suppliers;
pub mod users;

pub use expiry::ExpiryService;
pub use notifications::NotificationService;
pub use quotations::QuotationService;
pub use replies::ReplyService;
pub use reports::ReportService;
pub use suppliers::SupplierService;
pub use users::UserService;
