use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::clients::email::Mailer;
use crate::entities::{rfq, rfq_part};

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders the invitation email sent to suppliers when an RFQ opens.
pub fn rfq_invitation_html(rfq: &rfq::Model, parts: &[rfq_part::Model], portal_url: &str) -> String {
    let mut rows = String::new();
    for part in parts {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&part.part_no),
            html_escape(&part.part_description),
            part.order_type.label(),
            part.quantity,
        ));
    }

    format!(
        concat!(
            "<p>You have been invited to quote for RFQ <b>{number}</b> ",
            "({project}).</p>",
            "<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\">",
            "<tr><th>Part No</th><th>Description</th><th>Order Type</th>",
            "<th>Quantity</th></tr>{rows}</table>",
            "<p>Submission deadline: {deadline}.</p>",
            "<p><a href=\"{portal}\">Open the sourcing portal</a> to submit ",
            "your quotation.</p>"
        ),
        number = html_escape(&rfq.rfq_number),
        project = html_escape(&rfq.project_name),
        rows = rows,
        deadline = rfq.submission_date.format("%Y-%m-%d"),
        portal = portal_url,
    )
}

/// Renders the email asking a supplier for a revised quotation.
pub fn requote_request_html(rfq: &rfq::Model, portal_url: &str) -> String {
    format!(
        concat!(
            "<p>The buyer has requested a revised quotation for RFQ ",
            "<b>{number}</b> ({project}).</p>",
            "<p><a href=\"{portal}\">Open the sourcing portal</a> to submit ",
            "your re-quote.</p>"
        ),
        number = html_escape(&rfq.rfq_number),
        project = html_escape(&rfq.project_name),
        portal = portal_url,
    )
}

/// Outbound supplier notifications.
///
/// All sends are fire-and-forget: callers spawn these methods and every
/// failure is logged, never propagated to the originating request.
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    portal_url: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, portal_url: String) -> Self {
        Self { mailer, portal_url }
    }

    /// Emails invited suppliers that a new RFQ is open.
    #[instrument(skip(self, rfq, parts, recipients), fields(rfq_number = %rfq.rfq_number))]
    pub async fn notify_rfq_created(
        &self,
        rfq: &rfq::Model,
        parts: &[rfq_part::Model],
        recipients: Vec<String>,
    ) {
        let subject = format!("New RFQ {} - {}", rfq.rfq_number, rfq.project_name);
        let html = rfq_invitation_html(rfq, parts, &self.portal_url);
        self.deliver(&recipients, &subject, &html).await;
    }

    /// Emails the flagged suppliers that a re-quote has been requested.
    #[instrument(skip(self, rfq, recipients), fields(rfq_number = %rfq.rfq_number))]
    pub async fn notify_requote_requested(&self, rfq: &rfq::Model, recipients: Vec<String>) {
        let subject = format!("Re-quote requested for RFQ {}", rfq.rfq_number);
        let html = requote_request_html(rfq, &self.portal_url);
        self.deliver(&recipients, &subject, &html).await;
    }

    async fn deliver(&self, recipients: &[String], subject: &str, html: &str) {
        // Per-recipient sends so one bad address cannot sink the batch.
        for recipient in recipients {
            match self
                .mailer
                .send_html(std::slice::from_ref(recipient), subject, html)
                .await
            {
                Ok(()) => info!(%recipient, subject, "notification sent"),
                Err(e) => error!(%recipient, subject, "notification failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::rfq_part::OrderType;
    use crate::entities::RfqStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_rfq() -> rfq::Model {
        rfq::Model {
            id: Uuid::new_v4(),
            rfq_number: "RFQ-2503-001".to_string(),
            sequence: 1,
            project_name: "Line 4 <retooling>".to_string(),
            submission_date: Utc::now(),
            status: RfqStatus::Pending,
            created_by: Uuid::new_v4(),
            comments: String::new(),
            drawing_file_name: None,
            requote_requested: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn invitation_lists_every_part() {
        let rfq = sample_rfq();
        let parts = vec![
            rfq_part::Model {
                id: Uuid::new_v4(),
                rfq_id: rfq.id,
                part_no: "P-100".to_string(),
                part_description: "Bracket".to_string(),
                draw_revision: "B".to_string(),
                order_type: OrderType::Annual,
                quantity: 100,
            },
            rfq_part::Model {
                id: Uuid::new_v4(),
                rfq_id: rfq.id,
                part_no: "P-200".to_string(),
                part_description: "Housing".to_string(),
                draw_revision: "A".to_string(),
                order_type: OrderType::OneTime,
                quantity: 10,
            },
        ];

        let html = rfq_invitation_html(&rfq, &parts, "https://portal.example.com");
        assert!(html.contains("RFQ-2503-001"));
        assert!(html.contains("P-100"));
        assert!(html.contains("P-200"));
        assert!(html.contains("https://portal.example.com"));
    }

    #[test]
    fn project_names_are_escaped() {
        let rfq = sample_rfq();
        let html = requote_request_html(&rfq, "https://portal.example.com");
        assert!(html.contains("Line 4 &lt;retooling&gt;"));
        assert!(!html.contains("<retooling>"));
    }
}
