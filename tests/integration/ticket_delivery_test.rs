// Ticket delivery gate: only approved, undelivered transactions

#[path = "../helpers/mod.rs"]
#[macro_use]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use helpers::*;
use serde_json::{json, Value};

use boxoffice::core::{Actor, AppError};
use boxoffice::transactions::TicketDeliveryStatus;

fn delivery_request(id: &str) -> test::TestRequest {
    with_admin(test::TestRequest::post().uri(&format!("/api/admin/transactions/{}/delivery", id)))
}

#[actix_web::test]
async fn test_deliver_after_approval() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let approve = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id }))
        .to_request();
    assert_status(&test::call_service(&app, approve).await, StatusCode::OK);

    let resp = test::call_service(&app, delivery_request(&id).to_request()).await;
    assert_status(&resp, StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["transaction"]["ticketDeliveryStatus"], "delivered");
    assert_eq!(body["transaction"]["paymentStatus"], "approved");
    assert_eq!(body["transaction"]["version"], 2);
}

#[actix_web::test]
async fn test_pending_transaction_cannot_be_delivered() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let resp = test::call_service(&app, delivery_request(&id).to_request()).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "payment is pending");
}

#[actix_web::test]
async fn test_rejected_transaction_cannot_be_delivered() {
    let ctx = TestContext::new();
    let id = seed_full_purchase(ctx.service()).await.transaction.id;
    let admin = Actor::admin(ADMIN_ID).unwrap();

    ctx.service()
        .reject_offline(&id, admin.clone(), Some("chargeback".to_string()))
        .await
        .unwrap();

    let result = ctx.service().record_ticket_delivery(&id, admin).await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
}

#[actix_web::test]
async fn test_delivery_is_recorded_once() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;
    let admin = Actor::admin(ADMIN_ID).unwrap();

    ctx.service()
        .approve_offline(&id, admin.clone(), None)
        .await
        .unwrap();
    let delivered = ctx.service().record_ticket_delivery(&id, admin).await.unwrap();
    assert_eq!(delivered.ticket_delivery_status, TicketDeliveryStatus::Delivered);

    let resp = test::call_service(&app, delivery_request(&id).to_request()).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "already delivered");
}

#[actix_web::test]
async fn test_delivery_requires_admin() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/transactions/{}/delivery", id))
        .to_request();
    assert_status(&test::call_service(&app, req).await, StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, delivery_request("missing").to_request()).await;
    assert_status(&resp, StatusCode::NOT_FOUND);
}
