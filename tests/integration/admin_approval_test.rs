// Back-office approve / reject of offline payments

#[path = "../helpers/mod.rs"]
#[macro_use]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use helpers::*;
use serde_json::{json, Value};

use boxoffice::transactions::PaymentStatus;

#[actix_web::test]
async fn test_approve_full_purchase() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let seeded = seed_full_purchase(ctx.service()).await;
    let id = seeded.transaction.id.clone();

    let req = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id, "adminNotes": "  Paid at box office  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Transaction approved");
    assert_eq!(body["transaction"]["paymentStatus"], "approved");
    assert_eq!(body["transaction"]["reviewedBy"], ADMIN_ID);
    assert_eq!(body["transaction"]["adminNotes"], "Paid at box office");
    assert_eq!(body["transaction"]["version"], 1);
    assert!(body["transaction"]["reviewedAt"].is_string());

    assert_eq!(
        ctx.capacity.wait_for_calls(1).await,
        vec![seeded.transaction.event_id.clone()]
    );
}

#[actix_web::test]
async fn test_approve_installment_purchase_settles_first_installment() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_installment_purchase(ctx.service()).await.transaction.id;

    let req = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let installments = body["transaction"]["installments"].as_array().unwrap();
    assert_eq!(installments[0]["status"], "paid");
    assert_eq!(installments[0]["adminApproved"], true);
    assert_eq!(installments[0]["approvedBy"], ADMIN_ID);
    assert!(installments[0]["paidAt"].is_string());
    assert_eq!(installments[1]["status"], "pending");
    assert_eq!(installments[2]["status"], "pending");
}

#[actix_web::test]
async fn test_reject_leaves_installments_untouched() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_installment_purchase(ctx.service()).await.transaction.id;

    let req = with_admin(test::TestRequest::put().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id, "adminNotes": "Transfer never arrived" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Transaction rejected");
    assert_eq!(body["transaction"]["paymentStatus"], "rejected");
    let installments = body["transaction"]["installments"].as_array().unwrap();
    assert!(installments.iter().all(|i| i["status"] == "pending"));

    assert!(ctx.capacity.calls().is_empty());
}

#[actix_web::test]
async fn test_second_review_is_refused() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let approve = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id }))
        .to_request();
    assert_status(&test::call_service(&app, approve).await, StatusCode::OK);

    let reject = with_admin(test::TestRequest::put().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": id }))
        .to_request();
    let resp = test::call_service(&app, reject).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "not pending");

    let stored = ctx.service().get_transaction(&id).await.unwrap();
    assert_eq!(stored.transaction.payment_status, PaymentStatus::Approved);
    assert_eq!(stored.transaction.version, 1);
}

#[actix_web::test]
async fn test_missing_transaction_id() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "adminNotes": "no id" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "transactionId is required");
}

#[actix_web::test]
async fn test_unknown_transaction() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = with_admin(test::TestRequest::post().uri("/api/admin/transactions/approve-offline"))
        .set_json(json!({ "transactionId": "does-not-exist" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_credentials_required() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let anonymous = test::TestRequest::post()
        .uri("/api/admin/transactions/approve-offline")
        .set_json(json!({ "transactionId": id }))
        .to_request();
    let resp = test::call_service(&app, anonymous).await;
    assert_status(&resp, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("x-robots-tag").unwrap(), "noindex");

    let wrong_key = test::TestRequest::post()
        .uri("/api/admin/transactions/approve-offline")
        .insert_header(("X-Admin-Id", ADMIN_ID))
        .insert_header(("X-API-Key", "not-the-key"))
        .set_json(json!({ "transactionId": id }))
        .to_request();
    assert_status(&test::call_service(&app, wrong_key).await, StatusCode::UNAUTHORIZED);

    let stored = ctx.service().get_transaction(&id).await.unwrap();
    assert_eq!(stored.transaction.payment_status, PaymentStatus::Pending);
}

#[actix_web::test]
async fn test_admin_responses_are_noindex() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);
    let id = seed_full_purchase(ctx.service()).await.transaction.id;

    let req = with_admin(test::TestRequest::get().uri(&format!("/api/admin/transactions/{}", id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::OK);
    assert_eq!(resp.headers().get("x-robots-tag").unwrap(), "noindex");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["paymentStatus"], "pending");
}
