//! Reply and re-quote flow: invitation checks, one reply per supplier,
//! buyer-gated re-quotes and change flags on the appended revision.

mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use sourcing_api::entities::rfq_part::OrderType;
use sourcing_api::entities::{rfq_invitation, supplier, ReplyStatus, RfqStatus};
use sourcing_api::errors::ServiceError;
use sourcing_api::services::quotations::{CreateRfqInput, NewRfqPart, RfqDetail};
use sourcing_api::services::replies::{
    NewReplyInput, QuotePartInput, RequoteInput, TermsInput,
};

async fn seed_rfq(app: &TestApp, supplier_ids: Vec<Uuid>) -> RfqDetail {
    app.state
        .services
        .quotations
        .create_rfq(
            app.admin_uid,
            CreateRfqInput {
                project_name: "Line 4 retooling".to_string(),
                submission_date: Utc::now() + Duration::days(7),
                comments: String::new(),
                drawing_file_name: None,
                parts: vec![NewRfqPart {
                    part_no: "P-100".to_string(),
                    part_description: "Bracket".to_string(),
                    draw_revision: "B".to_string(),
                    order_type: OrderType::Annual,
                    quantity: 100,
                }],
                supplier_ids,
            },
        )
        .await
        .expect("create rfq")
}

async fn seeded_supplier(app: &TestApp) -> supplier::Model {
    app.state
        .services
        .suppliers
        .get_supplier(app.supplier_uid)
        .await
        .expect("seeded supplier")
}

fn quote_part() -> QuotePartInput {
    QuotePartInput {
        part_no: "P-100".to_string(),
        part_description: "Bracket".to_string(),
        quantity: 100,
        order_type: OrderType::Annual,
        unit_rate: None,
        material_cost: Some(dec!(10.00)),
        process_cost: Some(dec!(5.00)),
        overhead_cost: Some(dec!(2.50)),
        packing_cost: Some(dec!(0.50)),
        tool_cost: None,
        tool_lead_time: None,
        tool_cavity: None,
        tool_life: None,
        sample_lead_time: 14,
        production_lead_time: 30,
    }
}

fn terms() -> TermsInput {
    TermsInput {
        payment_terms: "Net 45".to_string(),
        delivery_terms: "DAP".to_string(),
        freight_terms: "Included".to_string(),
        remarks: String::new(),
    }
}

fn reply_input(rfq_id: Uuid) -> NewReplyInput {
    NewReplyInput {
        rfq_id,
        currency: "INR".to_string(),
        terms: terms(),
        parts: vec![quote_part()],
        cost_breakup_url: None,
        drawing_url: None,
    }
}

#[tokio::test]
async fn first_reply_creates_revision_zero_with_derived_pricing() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;
    let supplier = seeded_supplier(&app).await;

    let detail = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect("submit reply");

    assert_eq!(detail.reply.status, ReplyStatus::Submitted);
    assert_eq!(detail.revisions.len(), 1);

    let revision = &detail.revisions[0];
    assert_eq!(revision.revision.revision_number, 0);
    assert!(!revision.revision.payment_terms_changed);

    let part = &revision.parts[0];
    assert_eq!(part.unit_rate, dec!(18.00));
    assert_eq!(part.total_cost, dec!(1800.00));
    assert!(!part.unit_rate_changed);
}

#[tokio::test]
async fn second_reply_from_the_same_supplier_is_a_conflict() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;
    let supplier = seeded_supplier(&app).await;

    app.state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect("first reply");

    let err = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect_err("duplicate reply");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn uninvited_supplier_is_forbidden() {
    let app = TestApp::new().await;
    // invite nobody the caller can match
    let rfq = seed_rfq(&app, vec![Uuid::new_v4()]).await;
    let supplier = seeded_supplier(&app).await;

    let err = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect_err("uninvited");
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn replies_are_rejected_once_the_rfq_is_closed() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;
    let supplier = seeded_supplier(&app).await;

    use sea_orm::{ActiveModelTrait, Set};
    let mut active: sourcing_api::entities::rfq::ActiveModel = rfq.rfq.clone().into();
    active.status = Set(RfqStatus::Completed);
    active.update(app.state.db.as_ref()).await.expect("close rfq");

    let err = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect_err("closed rfq");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn requote_without_a_buyer_request_is_rejected() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;
    let supplier = seeded_supplier(&app).await;

    let detail = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect("submit reply");

    let err = app
        .state
        .services
        .replies
        .submit_requote(
            &supplier,
            detail.reply.id,
            RequoteInput {
                terms: terms(),
                parts: vec![quote_part()],
                cost_breakup_url: None,
                drawing_url: None,
            },
        )
        .await
        .expect_err("unsolicited re-quote");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn requote_appends_a_revision_with_change_flags_and_clears_the_request() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;
    let supplier = seeded_supplier(&app).await;

    let detail = app
        .state
        .services
        .replies
        .submit_reply(&supplier, reply_input(rfq.rfq.id))
        .await
        .expect("submit reply");

    app.state
        .services
        .quotations
        .request_requote(rfq.rfq.id, vec![app.supplier_uid])
        .await
        .expect("request re-quote");

    let mut revised_part = quote_part();
    revised_part.material_cost = Some(dec!(11.00));
    revised_part.production_lead_time = 45;
    let mut revised_terms = terms();
    revised_terms.payment_terms = "Net 60".to_string();

    let detail = app
        .state
        .services
        .replies
        .submit_requote(
            &supplier,
            detail.reply.id,
            RequoteInput {
                terms: revised_terms,
                parts: vec![revised_part],
                cost_breakup_url: None,
                drawing_url: None,
            },
        )
        .await
        .expect("submit re-quote");

    assert_eq!(detail.reply.status, ReplyStatus::RequoteSubmitted);
    assert_eq!(detail.revisions.len(), 2);

    let revision = &detail.revisions[1];
    assert_eq!(revision.revision.revision_number, 1);
    assert!(revision.revision.payment_terms_changed);
    assert!(!revision.revision.delivery_terms_changed);

    let part = &revision.parts[0];
    assert_eq!(part.unit_rate, dec!(19.00));
    assert!(part.unit_rate_changed);
    assert!(part.material_cost_changed);
    assert!(!part.process_cost_changed);
    assert!(part.lead_time_changed);

    // original revision stays untouched
    assert_eq!(detail.revisions[0].parts[0].unit_rate, dec!(18.00));

    // the invitation flag is consumed, so a second re-quote needs a new request
    let invitation = rfq_invitation::Entity::find_by_id((rfq.rfq.id, app.supplier_uid))
        .one(app.state.db.as_ref())
        .await
        .expect("query")
        .expect("invitation");
    assert!(!invitation.requote_requested);
}

#[tokio::test]
async fn requote_request_for_an_uninvited_supplier_is_a_validation_error() {
    let app = TestApp::new().await;
    let rfq = seed_rfq(&app, vec![app.supplier_uid]).await;

    let err = app
        .state
        .services
        .quotations
        .request_requote(rfq.rfq.id, vec![Uuid::new_v4()])
        .await
        .expect_err("unknown supplier");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
