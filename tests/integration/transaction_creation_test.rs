// Checkout and plan preview through the HTTP surface

#[path = "../helpers/mod.rs"]
#[macro_use]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::test;
use helpers::*;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_create_full_purchase() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(TestDataFactory::full_purchase_payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["paymentType"], "full");
    assert_eq!(body["ticketDeliveryStatus"], "pending");
    assert_eq!(body["ticketDeliveryMode"], "automatic");
    assert_eq!(body["totalAmount"], "60000");
    assert_eq!(body["version"], 0);
    assert!(body["installments"].as_array().unwrap().is_empty());

    let id = body["id"].as_str().unwrap();
    let stored = ctx.service().get_transaction(id).await.unwrap();
    assert_eq!(stored.transaction.buyer_email, "buyer@example.com");
}

#[actix_web::test]
async fn test_create_installment_purchase_persists_schedule() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(TestDataFactory::installment_purchase_payload())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["paymentType"], "installment");
    assert_eq!(body["ticketDeliveryMode"], "manualUpload");

    let installments = body["installments"].as_array().unwrap();
    assert_eq!(installments.len(), 3);

    let amounts: Vec<&str> = installments
        .iter()
        .map(|i| i["amount"].as_str().unwrap())
        .collect();
    assert_eq!(amounts, vec!["26.66", "26.66", "26.68"]);

    let due: Vec<&str> = installments
        .iter()
        .map(|i| i["dueDate"].as_str().unwrap())
        .collect();
    assert_eq!(due, vec!["2026-01-31", "2026-02-28", "2026-03-31"]);

    assert!(installments.iter().all(|i| i["status"] == "pending"));
    assert!(installments.iter().all(|i| i["adminApproved"] == false));
}

#[actix_web::test]
async fn test_installment_purchase_requires_plan() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut payload = TestDataFactory::installment_purchase_payload();
    payload.as_object_mut().unwrap().remove("installmentPlan");

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "installmentPlan is required");
}

#[actix_web::test]
async fn test_full_purchase_rejects_plan() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut payload = TestDataFactory::full_purchase_payload();
    payload["installmentPlan"] = json!({
        "reservationAmount": "0",
        "installmentsCount": 2,
        "startDate": "2026-03-01"
    });

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_reservation_not_below_total_is_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut payload = TestDataFactory::installment_purchase_payload();
    payload["installmentPlan"]["reservationAmount"] = json!("100");

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "less than the total");
}

#[actix_web::test]
async fn test_clp_price_with_cents_is_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut payload = TestDataFactory::full_purchase_payload();
    payload["ticketItems"][0]["price"] = json!("15000.50");

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unrepresentable_amounts_are_rejected() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut huge = TestDataFactory::full_purchase_payload();
    huge["ticketItems"][0]["price"] = json!("79228162514264337593543950335");
    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(huge)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "exceeds");

    let mut sub_cent = TestDataFactory::installment_purchase_payload();
    sub_cent["installmentPlan"]["reservationAmount"] = json!("20.005");
    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(sub_cent)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "decimal places");
}

#[actix_web::test]
async fn test_empty_items_and_bad_quantity() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let mut empty = TestDataFactory::full_purchase_payload();
    empty["ticketItems"] = json!([]);
    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(empty)
        .to_request();
    assert_status(&test::call_service(&app, req).await, StatusCode::BAD_REQUEST);

    let mut zero = TestDataFactory::full_purchase_payload();
    zero["ticketItems"][0]["quantity"] = json!(0);
    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .set_json(zero)
        .to_request();
    assert_status(&test::call_service(&app, req).await, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_body_is_validation_error() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_error_body(&body, StatusCode::BAD_REQUEST, "Invalid request body");
}

#[actix_web::test]
async fn test_plan_preview_does_not_persist() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/installments/plan")
        .set_json(json!({
            "totalAmount": "90000",
            "reservationAmount": "0",
            "installmentsCount": 3,
            "startDate": "2026-03-01"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(&resp, StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["installments"].as_array().unwrap().len(), 3);
}

#[actix_web::test]
async fn test_health_and_readiness() {
    let ctx = TestContext::new();
    let app = init_app!(ctx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_status(&resp, StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["service"], "boxoffice");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/ready").to_request()).await;
    assert_status(&resp, StatusCode::OK);
}
