//! HTTP clients for the portal's external collaborators.
//!
//! Each collaborator sits behind a trait so that handler and service tests can
//! substitute stubs; production wiring uses the `Http*` implementations built
//! on `reqwest`.

pub mod email;
pub mod identity;
pub mod storage;

pub use email::{HttpMailer, Mailer};
pub use identity::{HttpIdentityProvider, IdentityProvider, VerifiedToken};
pub use storage::{HttpObjectStore, ObjectStore};
