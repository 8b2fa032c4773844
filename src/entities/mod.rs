pub mod reply_revision;
pub mod revision_part;
pub mod rfq;
pub mod rfq_counter;
pub mod rfq_invitation;
pub mod rfq_part;
pub mod supplier;
pub mod supplier_reply;
pub mod user;

pub use rfq::RfqStatus;
pub use rfq_part::OrderType;
pub use supplier::SupplierType;
pub use supplier_reply::ReplyStatus;
pub use user::UserRole;
