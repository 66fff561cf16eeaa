mod common;

use common::spawn_app;
use resto_chat::application::payment::Reconciliation;
use resto_chat::domain::order::{OrderStatus, PaymentStatus};
use resto_chat::domain::ports::ProviderOutcome;
use resto_chat::interfaces::api::{MessageRequest, PaymentInitRequest, VerifyRequest};

async fn placed_payment(app: &common::TestApp, session: &str) -> String {
    app.api
        .post_message(MessageRequest {
            user_id: session.to_string(),
            message: "add:1".to_string(),
        })
        .await;
    let init = app
        .api
        .initialize_payment(PaymentInitRequest {
            user_id: session.to_string(),
        })
        .await;
    init.data.expect("payment initialized").reference
}

#[tokio::test]
async fn test_duplicate_verify_calls_converge() {
    let app = spawn_app().await;
    let reference = placed_payment(&app, "s1").await;

    let first = app
        .api
        .verify_payment(VerifyRequest {
            reference: reference.clone(),
            user_id: "s1".to_string(),
            outcome: Some(ProviderOutcome::Success),
        })
        .await;
    let second = app
        .api
        .verify_payment(VerifyRequest {
            reference: reference.clone(),
            user_id: "s1".to_string(),
            outcome: Some(ProviderOutcome::Success),
        })
        .await;

    assert!(first.status);
    assert!(second.status);
    assert_eq!(
        first.data.unwrap().order_id,
        second.data.unwrap().order_id
    );
    assert_eq!(app.api.order_history("s1").await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_reconcile_settles_exactly_once() {
    let app = spawn_app().await;
    let reference = placed_payment(&app, "s1").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let payments = app.payments.clone();
        let reference = reference.clone();
        handles.push(tokio::spawn(async move {
            payments
                .reconcile(&reference, ProviderOutcome::Success, None)
                .await
                .unwrap()
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        if let Reconciliation::Confirmed(_) = handle.await.unwrap() {
            confirmed += 1;
        }
    }
    // Duplicates are tolerated; the paid transition happened once.
    assert!(confirmed >= 1);
    let (status, payment_status) = app.payments.status(&reference).await.unwrap();
    assert_eq!(status, OrderStatus::Paid);
    assert_eq!(payment_status, PaymentStatus::Success);
    assert_eq!(app.api.order_history("s1").await.len(), 1);
}

#[tokio::test]
async fn test_verify_for_wrong_user_is_order_not_found() {
    let app = spawn_app().await;
    let reference = placed_payment(&app, "s1").await;

    let response = app
        .api
        .verify_payment(VerifyRequest {
            reference,
            user_id: "someone-else".to_string(),
            outcome: Some(ProviderOutcome::Success),
        })
        .await;
    assert!(!response.status);
    assert_eq!(response.message.as_deref(), Some("Order not found"));
}

#[tokio::test]
async fn test_unsettled_payment_reports_outstanding() {
    let app = spawn_app().await;
    let reference = placed_payment(&app, "s1").await;

    let result = app
        .payments
        .reconcile(&reference, ProviderOutcome::Pending, None)
        .await
        .unwrap();
    assert!(matches!(result, Reconciliation::Outstanding(_)));
    let (status, _) = app.payments.status(&reference).await.unwrap();
    assert_eq!(status, OrderStatus::Placed);
}

#[tokio::test]
async fn test_failed_then_retried_payment_succeeds() {
    let app = spawn_app().await;
    let reference = placed_payment(&app, "s1").await;

    app.gateway.settle(&reference, ProviderOutcome::Failed).await;
    let failed = app
        .api
        .verify_payment(VerifyRequest {
            reference,
            user_id: "s1".to_string(),
            outcome: Some(ProviderOutcome::Failed),
        })
        .await;
    assert!(!failed.status);
    assert_eq!(failed.data.unwrap().status, "failed");

    // The order is still placed; a new initiation gets a fresh reference.
    let retry = app
        .api
        .initialize_payment(PaymentInitRequest {
            user_id: "s1".to_string(),
        })
        .await;
    assert!(retry.status);
    let reference = retry.data.unwrap().reference;
    let verified = app
        .api
        .verify_payment(VerifyRequest {
            reference,
            user_id: "s1".to_string(),
            outcome: Some(ProviderOutcome::Success),
        })
        .await;
    assert!(verified.status);
}
