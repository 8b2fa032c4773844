use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tracing::{error, info, instrument};

use crate::entities::{rfq, RfqStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Grace period after the submission deadline before an RFQ expires.
pub const EXPIRY_GRACE: chrono::Duration = chrono::Duration::hours(24);

/// Sole owner of the Pending → Expired transition.
///
/// The sweep runs on a schedule and is also invoked by the RFQ list handler,
/// so a list-read always reflects (and persists) expiry. Both paths share this
/// one implementation and the sweep is idempotent.
#[derive(Clone)]
pub struct ExpiryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ExpiryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Returns whether an RFQ with the given deadline is overdue at `now`.
    pub fn is_overdue(submission_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        submission_date < now - EXPIRY_GRACE
    }

    /// Flips every overdue pending RFQ to Expired. Returns how many flipped.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, ServiceError> {
        let cutoff = now - EXPIRY_GRACE;

        let stale = rfq::Entity::find()
            .filter(rfq::Column::Status.eq(RfqStatus::Pending))
            .filter(rfq::Column::SubmissionDate.lt(cutoff))
            .all(self.db.as_ref())
            .await?;

        let mut expired = 0usize;
        for rfq in stale {
            if !rfq.status.can_transition_to(RfqStatus::Expired) {
                continue;
            }
            let rfq_id = rfq.id;
            let rfq_number = rfq.rfq_number.clone();

            let mut active: rfq::ActiveModel = rfq.into();
            active.status = Set(RfqStatus::Expired);
            active.updated_at = Set(now);
            active.update(self.db.as_ref()).await?;

            self.event_sender
                .send(Event::RfqExpired { rfq_id, rfq_number })
                .await;
            expired += 1;
        }

        if expired > 0 {
            info!(expired, "expired overdue rfqs");
        }
        Ok(expired)
    }

    /// Spawns the periodic sweep task. Runs until the process shuts down.
    pub fn spawn(self, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep(Utc::now()).await {
                    error!("expiry sweep failed: {}", e);
                }
            }
        })
    }
}
