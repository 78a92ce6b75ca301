// Test Data Factory
//
// Checkout and gateway payloads. Decimal amounts are sent as strings, the way
// the API serializes them back.

use serde_json::{json, Value};
use uuid::Uuid;

use boxoffice::transactions::{CreateTransactionRequest, TransactionDetails, TransactionService};

/// Test data factory for generating unique test data
pub struct TestDataFactory;

impl TestDataFactory {
    /// Unique event id in format "evt-test-{uuid}"
    pub fn random_event_id() -> String {
        format!("evt-test-{}", Uuid::new_v4())
    }

    /// Full payment: 2 x 15000 general + 1 x 30000 vip, CLP
    pub fn full_purchase_payload() -> Value {
        json!({
            "eventId": Self::random_event_id(),
            "buyerEmail": "buyer@example.com",
            "currency": "CLP",
            "paymentType": "full",
            "ticketItems": [
                { "zone": "general", "quantity": 2, "price": "15000" },
                { "zone": "vip", "quantity": 1, "price": "30000" }
            ]
        })
    }

    /// Installment purchase of 100 USD: 20 reservation, 3 monthly payments
    pub fn installment_purchase_payload() -> Value {
        json!({
            "eventId": Self::random_event_id(),
            "buyerEmail": "buyer@example.com",
            "currency": "USD",
            "paymentType": "installment",
            "ticketDeliveryMode": "manualUpload",
            "ticketItems": [
                { "zone": "general", "quantity": 1, "price": "100" }
            ],
            "installmentPlan": {
                "reservationAmount": "20",
                "installmentsCount": 3,
                "startDate": "2026-01-31"
            }
        })
    }

    /// MercadoPago payment notification
    pub fn mercadopago_payment(
        transaction_id: &str,
        status: &str,
        installments: i32,
    ) -> Value {
        json!({
            "id": 1234567890u64,
            "status": status,
            "status_detail": "accredited",
            "payment_method_id": "visa",
            "transaction_amount": 60000,
            "installments": installments,
            "external_reference": transaction_id,
            "date_created": "2026-03-01T12:00:00.000-04:00",
            "date_approved": "2026-03-01T12:00:05.000-04:00"
        })
    }

    /// Webpay transaction result
    pub fn webpay_result(transaction_id: &str, status: &str) -> Value {
        json!({
            "buyOrder": transaction_id,
            "sessionId": "session-1",
            "amount": 60000,
            "status": status,
            "cardNumber": "6623",
            "authorizationCode": "1213",
            "paymentType": "VN",
            "installments": 0,
            "transactionDate": "2026-03-01T16:00:05.000Z",
            "vci": "TSY"
        })
    }
}

/// Create a transaction directly through the service
pub async fn seed_transaction(service: &TransactionService, payload: Value) -> TransactionDetails {
    let request: CreateTransactionRequest =
        serde_json::from_value(payload).expect("valid checkout payload");
    service
        .create_transaction(request)
        .await
        .expect("seed transaction")
}

pub async fn seed_full_purchase(service: &TransactionService) -> TransactionDetails {
    seed_transaction(service, TestDataFactory::full_purchase_payload()).await
}

pub async fn seed_installment_purchase(service: &TransactionService) -> TransactionDetails {
    seed_transaction(service, TestDataFactory::installment_purchase_payload()).await
}
