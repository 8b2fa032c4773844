use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::RfqStatus;
use crate::errors::ServiceError;
use crate::services::quotations::{QuotationService, RfqDetail};
use crate::services::replies::{ReplyDetail, ReplyService};

const NA: &str = "N/A";

const PORTFOLIO_SHEET: &str = "RFQ Replies Report";
const QUOTES_SHEET: &str = "Supplier Quotes";

const PORTFOLIO_HEADERS: [&str; 34] = [
    "RFQ Number",
    "Project Name",
    "Created Date",
    "Submission Date",
    "RFQ Status",
    "Comments",
    "Part No",
    "Part Description",
    "Draw Revision",
    "Order Type",
    "Quantity",
    "Supplier Name",
    "Supplier Type",
    "MSME Status",
    "Reply Status",
    "Currency",
    "Unit Rate",
    "Material Cost",
    "Process Cost",
    "Overhead Cost",
    "Packing Cost",
    "Tool Cost",
    "Tool Lead Time",
    "Tool Cavity",
    "Tool Life",
    "Sample Lead Time",
    "Production Lead Time",
    "Total Cost",
    "Payment Terms",
    "Delivery Terms",
    "Freight Terms",
    "Remarks",
    "Quote Revision",
    "Quoted At",
];

const QUOTES_HEADERS: [&str; 22] = [
    "Supplier Name",
    "Supplier Type",
    "MSME Status",
    "Quote Type",
    "Quoted At",
    "Currency",
    "Part No",
    "Part Description",
    "Quantity",
    "Unit Rate",
    "Material Cost",
    "Process Cost",
    "Overhead Cost",
    "Packing Cost",
    "Tool Cost",
    "Tool Lead Time",
    "Tool Cavity",
    "Tool Life",
    "Sample Lead Time",
    "Production Lead Time",
    "Total Cost",
    "Changes",
];

fn fmt_decimal(value: Decimal) -> String {
    value.to_string()
}

fn fmt_opt_decimal(value: Option<Decimal>) -> String {
    value.map(fmt_decimal).unwrap_or_else(|| NA.to_string())
}

fn fmt_opt_i32(value: Option<i32>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NA.to_string())
}

fn fmt_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Display label for a revision: revision 0 is the original submission, every
/// later one a numbered re-quote.
fn quote_type(revision_number: i32) -> String {
    if revision_number == 0 {
        "Original".to_string()
    } else {
        format!("Re-quote {revision_number}")
    }
}

/// Flattens RFQs and their replies into portfolio report rows.
///
/// One row per (rfq, reply, part of the reply's latest revision). An RFQ with
/// no replies contributes a single row with the supplier section all `"N/A"`.
pub fn portfolio_rows(entries: &[(RfqDetail, Vec<ReplyDetail>)]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for (detail, replies) in entries {
        let rfq_cells = [
            detail.rfq.rfq_number.clone(),
            detail.rfq.project_name.clone(),
            fmt_date(detail.rfq.created_at),
            fmt_date(detail.rfq.submission_date),
            detail.rfq.status.as_str().to_string(),
            detail.rfq.comments.clone(),
        ];

        if replies.is_empty() {
            let mut row: Vec<String> = rfq_cells.to_vec();
            row.extend(std::iter::repeat(NA.to_string()).take(PORTFOLIO_HEADERS.len() - 6));
            rows.push(row);
            continue;
        }

        for reply in replies {
            // Latest revision is the current quote; revisions are ordered.
            let Some(latest) = reply.revisions.last() else {
                continue;
            };
            for part in &latest.parts {
                let mut row: Vec<String> = rfq_cells.to_vec();
                let rfq_part = detail.parts.iter().find(|p| p.part_no == part.part_no);
                row.push(part.part_no.clone());
                row.push(part.part_description.clone());
                row.push(
                    rfq_part
                        .map(|p| p.draw_revision.clone())
                        .unwrap_or_else(|| NA.to_string()),
                );
                row.push(part.order_type.label().to_string());
                row.push(part.quantity.to_string());
                row.push(reply.reply.supplier_name.clone());
                row.push(reply.reply.supplier_type.label().to_string());
                row.push(reply.reply.msme_status.clone());
                row.push(reply.reply.status.as_str().to_string());
                row.push(reply.reply.currency.clone());
                row.push(fmt_decimal(part.unit_rate));
                row.push(fmt_opt_decimal(part.material_cost));
                row.push(fmt_opt_decimal(part.process_cost));
                row.push(fmt_opt_decimal(part.overhead_cost));
                row.push(fmt_opt_decimal(part.packing_cost));
                row.push(fmt_opt_decimal(part.tool_cost));
                row.push(fmt_opt_i32(part.tool_lead_time));
                row.push(fmt_opt_i32(part.tool_cavity));
                row.push(fmt_opt_i32(part.tool_life));
                row.push(part.sample_lead_time.to_string());
                row.push(part.production_lead_time.to_string());
                row.push(fmt_decimal(part.total_cost));
                row.push(latest.revision.payment_terms.clone());
                row.push(latest.revision.delivery_terms.clone());
                row.push(latest.revision.freight_terms.clone());
                row.push(if latest.revision.remarks.is_empty() {
                    NA.to_string()
                } else {
                    latest.revision.remarks.clone()
                });
                row.push(quote_type(latest.revision.revision_number));
                row.push(fmt_date(latest.revision.submitted_at));
                rows.push(row);
            }
        }
    }

    rows
}

/// Flattens every revision of every reply into per-RFQ quote rows, one row
/// per part per revision, with the Changes column summarizing the diff flags.
pub fn quote_rows(replies: &[ReplyDetail]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for reply in replies {
        for revision in &reply.revisions {
            for part in &revision.parts {
                rows.push(vec![
                    reply.reply.supplier_name.clone(),
                    reply.reply.supplier_type.label().to_string(),
                    reply.reply.msme_status.clone(),
                    quote_type(revision.revision.revision_number),
                    fmt_date(revision.revision.submitted_at),
                    reply.reply.currency.clone(),
                    part.part_no.clone(),
                    part.part_description.clone(),
                    part.quantity.to_string(),
                    fmt_decimal(part.unit_rate),
                    fmt_opt_decimal(part.material_cost),
                    fmt_opt_decimal(part.process_cost),
                    fmt_opt_decimal(part.overhead_cost),
                    fmt_opt_decimal(part.packing_cost),
                    fmt_opt_decimal(part.tool_cost),
                    fmt_opt_i32(part.tool_lead_time),
                    fmt_opt_i32(part.tool_cavity),
                    fmt_opt_i32(part.tool_life),
                    part.sample_lead_time.to_string(),
                    part.production_lead_time.to_string(),
                    fmt_decimal(part.total_cost),
                    part.changes_summary(),
                ]);
            }
        }
    }

    rows
}

/// A rendered report ready to be served as a download.
pub struct ReportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// xlsx exports for buyers: the portfolio-wide replies report and the
/// per-RFQ quote comparison.
#[derive(Clone)]
pub struct ReportService {
    quotations: QuotationService,
    replies: ReplyService,
}

impl ReportService {
    pub fn new(quotations: QuotationService, replies: ReplyService) -> Self {
        Self {
            quotations,
            replies,
        }
    }

    /// Builds the portfolio report over all RFQs (optionally status-filtered).
    #[instrument(skip(self))]
    pub async fn portfolio_report(
        &self,
        status: Option<RfqStatus>,
    ) -> Result<ReportFile, ServiceError> {
        let rfqs = self.quotations.list_rfqs(status).await?;

        let mut entries = Vec::with_capacity(rfqs.len());
        for detail in rfqs {
            let replies = self.replies.list_replies(detail.rfq.id).await?;
            entries.push((detail, replies));
        }

        let rows = portfolio_rows(&entries);
        let bytes = write_sheet(PORTFOLIO_SHEET, &PORTFOLIO_HEADERS, &rows)?;
        let filename = format!("RFQ_Report_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S"));

        Ok(ReportFile { filename, bytes })
    }

    /// Builds the quote comparison for one RFQ, covering every revision.
    #[instrument(skip(self))]
    pub async fn quotes_report(&self, rfq_id: Uuid) -> Result<ReportFile, ServiceError> {
        let detail = self.quotations.get_rfq(rfq_id).await?;
        let replies = self.replies.list_replies(rfq_id).await?;

        let rows = quote_rows(&replies);
        let bytes = write_sheet(QUOTES_SHEET, &QUOTES_HEADERS, &rows)?;
        let filename = format!(
            "RFQ_{}_Quotes_{}.xlsx",
            detail.rfq.rfq_number,
            Utc::now().format("%Y-%m-%d")
        );

        Ok(ReportFile { filename, bytes })
    }
}

/// Writes one worksheet with a header row, data rows and fixed column widths.
fn write_sheet(
    sheet_name: &str,
    headers: &[&str],
    rows: &[Vec<String>],
) -> Result<Vec<u8>, ServiceError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .map_err(|e| ServiceError::InternalError(format!("report: {e}")))?;

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| ServiceError::InternalError(format!("report: {e}")))?;
        worksheet
            .set_column_width(col as u16, 18)
            .map_err(|e| ServiceError::InternalError(format!("report: {e}")))?;
    }

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            worksheet
                .write_string((r + 1) as u32, c as u16, cell)
                .map_err(|e| ServiceError::InternalError(format!("report: {e}")))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ServiceError::InternalError(format!("report: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        reply_revision, revision_part, rfq, rfq_part, supplier_reply, ReplyStatus, SupplierType,
    };
    use crate::entities::rfq_part::OrderType;
    use crate::services::replies::RevisionDetail;
    use rust_decimal_macros::dec;

    fn sample_rfq() -> RfqDetail {
        let rfq_id = Uuid::new_v4();
        RfqDetail {
            rfq: rfq::Model {
                id: rfq_id,
                rfq_number: "RFQ-2503-001".to_string(),
                sequence: 1,
                project_name: "Line 4 retooling".to_string(),
                submission_date: Utc::now(),
                status: RfqStatus::Pending,
                created_by: Uuid::new_v4(),
                comments: "Urgent".to_string(),
                drawing_file_name: None,
                requote_requested: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            parts: vec![rfq_part::Model {
                id: Uuid::new_v4(),
                rfq_id,
                part_no: "P-100".to_string(),
                part_description: "Bracket".to_string(),
                draw_revision: "B".to_string(),
                order_type: OrderType::Annual,
                quantity: 100,
            }],
            invitations: vec![],
        }
    }

    fn sample_part(revision_id: Uuid, part_no: &str) -> revision_part::Model {
        revision_part::Model {
            id: Uuid::new_v4(),
            revision_id,
            part_no: part_no.to_string(),
            part_description: "Bracket".to_string(),
            quantity: 100,
            order_type: OrderType::Annual,
            unit_rate: dec!(18.00),
            material_cost: Some(dec!(10.00)),
            process_cost: None,
            overhead_cost: None,
            packing_cost: None,
            tool_cost: None,
            tool_lead_time: None,
            tool_cavity: None,
            tool_life: None,
            sample_lead_time: 14,
            production_lead_time: 30,
            total_cost: dec!(1800.00),
            unit_rate_changed: false,
            material_cost_changed: false,
            process_cost_changed: false,
            overhead_cost_changed: false,
            packing_cost_changed: false,
            lead_time_changed: false,
        }
    }

    fn sample_reply(rfq_id: Uuid, revision_count: i32, parts_per_revision: usize) -> ReplyDetail {
        let reply_id = Uuid::new_v4();
        let revisions = (0..revision_count)
            .map(|n| {
                let revision_id = Uuid::new_v4();
                RevisionDetail {
                    revision: reply_revision::Model {
                        id: revision_id,
                        reply_id,
                        revision_number: n,
                        payment_terms: "Net 45".to_string(),
                        delivery_terms: "DAP".to_string(),
                        freight_terms: "Included".to_string(),
                        remarks: String::new(),
                        payment_terms_changed: false,
                        delivery_terms_changed: false,
                        freight_terms_changed: false,
                        cost_breakup_url: None,
                        drawing_url: None,
                        submitted_at: Utc::now(),
                    },
                    parts: (0..parts_per_revision)
                        .map(|i| sample_part(revision_id, &format!("P-{i}")))
                        .collect(),
                }
            })
            .collect();

        ReplyDetail {
            reply: supplier_reply::Model {
                id: reply_id,
                rfq_id,
                rfq_number: "RFQ-2503-001".to_string(),
                supplier_id: Uuid::new_v4(),
                supplier_name: "Acme Metals".to_string(),
                supplier_type: SupplierType::Regular,
                msme_status: "MSME".to_string(),
                currency: "INR".to_string(),
                status: ReplyStatus::Submitted,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            revisions,
        }
    }

    #[test]
    fn portfolio_rows_count_is_sum_of_latest_revision_parts() {
        let rfq_a = sample_rfq();
        let rfq_b = sample_rfq();
        let entries = vec![
            (
                rfq_a.clone(),
                vec![
                    sample_reply(rfq_a.rfq.id, 1, 3),
                    sample_reply(rfq_a.rfq.id, 2, 2),
                ],
            ),
            (rfq_b.clone(), vec![sample_reply(rfq_b.rfq.id, 1, 1)]),
        ];

        // 3 + 2 + 1 parts in the latest revisions
        let rows = portfolio_rows(&entries);
        assert_eq!(rows.len(), 6);
        for row in &rows {
            assert_eq!(row.len(), PORTFOLIO_HEADERS.len());
        }
    }

    #[test]
    fn reply_less_rfq_yields_single_na_row() {
        let rfq = sample_rfq();
        let entries = vec![(rfq, vec![])];
        let rows = portfolio_rows(&entries);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "RFQ-2503-001");
        for cell in &rows[0][6..] {
            assert_eq!(cell, NA);
        }
    }

    #[test]
    fn missing_costs_render_as_na() {
        let rfq = sample_rfq();
        let entries = vec![(rfq.clone(), vec![sample_reply(rfq.rfq.id, 1, 1)])];
        let rows = portfolio_rows(&entries);

        // process cost column is None in the sample part
        assert_eq!(rows[0][18], NA);
        assert_eq!(rows[0][17], "10.00");
    }

    #[test]
    fn quote_rows_cover_every_revision() {
        let rfq = sample_rfq();
        let replies = vec![sample_reply(rfq.rfq.id, 3, 2)];
        let rows = quote_rows(&replies);

        // 3 revisions x 2 parts
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0][3], "Original");
        assert_eq!(rows[2][3], "Re-quote 1");
        assert_eq!(rows[4][3], "Re-quote 2");
        for row in &rows {
            assert_eq!(row.len(), QUOTES_HEADERS.len());
        }
    }

    #[test]
    fn unchanged_parts_report_na_changes() {
        let rfq = sample_rfq();
        let replies = vec![sample_reply(rfq.rfq.id, 1, 1)];
        let rows = quote_rows(&replies);
        assert_eq!(rows[0][21], NA);
    }

    #[test]
    fn workbook_renders_to_bytes() {
        let rfq = sample_rfq();
        let entries = vec![(rfq.clone(), vec![sample_reply(rfq.rfq.id, 1, 1)])];
        let rows = portfolio_rows(&entries);
        let bytes = write_sheet(PORTFOLIO_SHEET, &PORTFOLIO_HEADERS, &rows).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
