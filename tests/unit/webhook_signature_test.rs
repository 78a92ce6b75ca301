// Webhook signature verification for both gateways

use boxoffice::core::AppError;
use boxoffice::gateways::services::{sign_hmac_sha256, verify_hmac_sha256};
use boxoffice::gateways::{
    GatewayKind, MercadoPagoGateway, PaymentGateway, PaymentVerdict, WebhookHeaders,
    WebpayGateway,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

const MP_SECRET: &str = "mp-unit-secret";
const WP_SECRET: &str = "wp-unit-secret";

fn mercadopago_headers(id: &str, request_id: &str, ts: i64, secret: &str) -> WebhookHeaders {
    let manifest = format!("id:{};request-id:{};ts:{};", id, request_id, ts);
    let v1 = sign_hmac_sha256(secret.as_bytes(), manifest.as_bytes()).unwrap();
    WebhookHeaders::default()
        .with("x-signature", format!("ts={},v1={}", ts, v1))
        .with("x-request-id", request_id)
}

#[test]
fn test_hmac_helpers_agree() {
    let signature = sign_hmac_sha256(b"secret", b"message").unwrap();
    assert_eq!(signature.len(), 64);
    assert!(verify_hmac_sha256(b"secret", b"message", &signature).is_ok());
    assert!(verify_hmac_sha256(b"other", b"message", &signature).is_err());
    assert!(verify_hmac_sha256(b"secret", b"message", "not-hex").is_err());
}

#[test]
fn test_mercadopago_valid_signature() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let body = json!({ "id": 987654321u64, "external_reference": "txn-1" }).to_string();
    let headers = mercadopago_headers("987654321", "req-1", now.timestamp(), MP_SECRET);

    let gateway = MercadoPagoGateway::new(MP_SECRET, 300);
    assert!(gateway.verify_at(&headers, body.as_bytes(), now).is_ok());
}

#[test]
fn test_mercadopago_string_id_and_millisecond_timestamp() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let body = json!({ "id": "abc-123", "external_reference": "txn-1" }).to_string();
    let headers = mercadopago_headers("abc-123", "req-2", now.timestamp_millis(), MP_SECRET);

    let gateway = MercadoPagoGateway::new(MP_SECRET, 300);
    assert!(gateway.verify_at(&headers, body.as_bytes(), now).is_ok());
}

#[test]
fn test_mercadopago_wrong_secret() {
    let now = Utc::now();
    let body = json!({ "id": 1, "external_reference": "txn-1" }).to_string();
    let headers = mercadopago_headers("1", "req-3", now.timestamp(), "someone-else");

    let result = MercadoPagoGateway::new(MP_SECRET, 300).verify_at(&headers, body.as_bytes(), now);
    assert!(matches!(result, Err(AppError::InvalidSignature(_))));
}

#[test]
fn test_mercadopago_id_swap_detected() {
    let now = Utc::now();
    let headers = mercadopago_headers("1", "req-4", now.timestamp(), MP_SECRET);
    let body = json!({ "id": 2, "external_reference": "txn-1" }).to_string();

    let result = MercadoPagoGateway::new(MP_SECRET, 300).verify_at(&headers, body.as_bytes(), now);
    assert!(matches!(result, Err(AppError::InvalidSignature(_))));
}

#[test]
fn test_mercadopago_stale_timestamp() {
    let now = Utc::now();
    let stale = (now - Duration::seconds(301)).timestamp();
    let body = json!({ "id": 1 }).to_string();
    let headers = mercadopago_headers("1", "req-5", stale, MP_SECRET);

    let gateway = MercadoPagoGateway::new(MP_SECRET, 300);
    assert!(matches!(
        gateway.verify_at(&headers, body.as_bytes(), now),
        Err(AppError::InvalidSignature(_))
    ));

    let lenient = MercadoPagoGateway::new(MP_SECRET, 600);
    assert!(lenient.verify_at(&headers, body.as_bytes(), now).is_ok());
}

#[test]
fn test_mercadopago_out_of_range_timestamp() {
    let now = Utc::now();
    let body = json!({ "id": 1 }).to_string();
    let gateway = MercadoPagoGateway::new(MP_SECRET, 300);

    // Unsigned header is refused before any HMAC work
    let unsigned = WebhookHeaders::default()
        .with("x-signature", "ts=-9223372036854775808,v1=00")
        .with("x-request-id", "req-6");
    assert!(matches!(
        gateway.verify_at(&unsigned, body.as_bytes(), now),
        Err(AppError::InvalidSignature(_))
    ));

    let signed = mercadopago_headers("1", "req-7", i64::MIN, MP_SECRET);
    assert!(matches!(
        gateway.verify_at(&signed, body.as_bytes(), now),
        Err(AppError::InvalidSignature(_))
    ));
}

#[test]
fn test_mercadopago_missing_headers() {
    let body = json!({ "id": 1 }).to_string();
    let gateway = MercadoPagoGateway::new(MP_SECRET, 300);

    let no_headers = WebhookHeaders::default();
    assert!(matches!(
        gateway.verify_webhook(&no_headers, body.as_bytes()),
        Err(AppError::InvalidSignature(_))
    ));

    let no_v1 = WebhookHeaders::default()
        .with("x-signature", format!("ts={}", Utc::now().timestamp()))
        .with("x-request-id", "req-6");
    assert!(matches!(
        gateway.verify_webhook(&no_v1, body.as_bytes()),
        Err(AppError::InvalidSignature(_))
    ));
}

#[test]
fn test_mercadopago_notification_fields() {
    let body = json!({
        "id": 42,
        "status": "approved",
        "installments": 3,
        "external_reference": "txn-9",
        "date_approved": "2026-03-01T12:00:05.000-04:00"
    })
    .to_string();

    let notification = MercadoPagoGateway::new(MP_SECRET, 300)
        .parse_notification(body.as_bytes())
        .unwrap();

    assert_eq!(notification.gateway, GatewayKind::MercadoPago);
    assert_eq!(notification.transaction_id, "txn-9");
    assert_eq!(notification.verdict, PaymentVerdict::Approved);
    assert_eq!(notification.gateway_reference.as_deref(), Some("42"));
    assert_eq!(
        notification.paid_at,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 5).unwrap())
    );
    assert!(notification.settles_first_installment());
}

#[test]
fn test_webpay_signature_over_raw_body() {
    let body = json!({ "buyOrder": "txn-1", "status": "AUTHORIZED" }).to_string();
    let signature = sign_hmac_sha256(WP_SECRET.as_bytes(), body.as_bytes()).unwrap();
    let headers =
        WebhookHeaders::default().with("x-webpay-signature", format!("sha256={}", signature));

    let gateway = WebpayGateway::new(WP_SECRET);
    assert!(gateway.verify_webhook(&headers, body.as_bytes()).is_ok());

    // Same JSON, different bytes
    let reformatted = body.replace(",", ", ");
    assert!(matches!(
        gateway.verify_webhook(&headers, reformatted.as_bytes()),
        Err(AppError::InvalidSignature(_))
    ));
}

#[test]
fn test_webpay_status_mapping() {
    let gateway = WebpayGateway::new(WP_SECRET);
    let verdict = |status: &str| {
        let body = json!({ "buyOrder": "txn-1", "status": status }).to_string();
        gateway.parse_notification(body.as_bytes()).unwrap().verdict
    };

    assert_eq!(verdict("AUTHORIZED"), PaymentVerdict::Approved);
    assert_eq!(verdict("FAILED"), PaymentVerdict::Rejected);
    assert_eq!(verdict("REVERSED"), PaymentVerdict::Rejected);
    assert_eq!(verdict("INITIALIZED"), PaymentVerdict::Pending);
}
