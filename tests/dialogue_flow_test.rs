mod common;

use common::spawn_app;
use resto_chat::domain::money::Amount;
use resto_chat::domain::order::OrderStatus;
use resto_chat::interfaces::api::{MessageRequest, PaymentInitRequest, VerifyRequest};

fn message(user: &str, token: &str) -> MessageRequest {
    MessageRequest {
        user_id: user.to_string(),
        message: token.to_string(),
    }
}

/// The full happy path: add the same item twice, check out, pay through the
/// simulated gateway, verify, and confirm the order lands in history with
/// an empty current cart.
#[tokio::test]
async fn test_order_and_payment_end_to_end() {
    let app = spawn_app().await;

    app.api.post_message(message("s1", "add:1")).await;
    let reply = app.api.post_message(message("s1", "add:1")).await;
    let snapshot = reply.order.expect("cart snapshot after add");
    assert_eq!(snapshot.items[0].quantity, 2);
    assert_eq!(snapshot.total, Amount::naira(5000));

    let reply = app.api.post_message(message("s1", "checkout")).await;
    assert!(reply.message.contains("2x Jollof Rice with Chicken - ₦5000"));
    assert!(reply.message.contains("Total: ₦5000"));

    let init = app
        .api
        .initialize_payment(PaymentInitRequest {
            user_id: "s1".to_string(),
        })
        .await;
    assert!(init.status);
    let data = init.data.expect("initialized payment data");
    assert!(data.authorization_url.contains(&data.reference));
    assert_eq!(data.amount, Amount::naira(5000));

    let verified = app
        .api
        .verify_payment(VerifyRequest {
            reference: data.reference.clone(),
            user_id: "s1".to_string(),
            outcome: None,
        })
        .await;
    assert!(verified.status);
    assert_eq!(verified.data.unwrap().status, "success");

    let history = app.api.order_history("s1").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Paid);
    assert_eq!(history[0].snapshot.total, Amount::naira(5000));

    let current = app.api.current_order("s1").await;
    assert!(current.items.is_empty());
    assert_eq!(current.total, Amount::ZERO);
}

#[tokio::test]
async fn test_payment_status_confirms_after_settlement() {
    let app = spawn_app().await;

    app.api.post_message(message("s1", "add:1")).await;
    let init = app
        .api
        .initialize_payment(PaymentInitRequest {
            user_id: "s1".to_string(),
        })
        .await;
    let reference = init.data.unwrap().reference;
    app.api
        .verify_payment(VerifyRequest {
            reference,
            user_id: "s1".to_string(),
            outcome: None,
        })
        .await;

    // The paid order is detached from the session, but asking for payment
    // status right after paying must still confirm it.
    let reply = app.api.post_message(message("s1", "payment-status")).await;
    assert!(reply.message.contains("Payment confirmed"));
}

#[tokio::test]
async fn test_cancel_clears_cart_and_next_add_starts_fresh() {
    let app = spawn_app().await;

    app.api.post_message(message("s1", "add:1")).await;
    app.api.post_message(message("s1", "add:4")).await;

    let reply = app.api.post_message(message("s1", "cancel-order")).await;
    assert!(reply.message.contains("cancelled"));
    assert!(app.api.current_order("s1").await.items.is_empty());

    let reply = app.api.post_message(message("s1", "add:5")).await;
    let snapshot = reply.order.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.total, Amount::naira(800));

    // Cancelled orders never show up in history.
    assert!(app.api.order_history("s1").await.is_empty());
}

#[tokio::test]
async fn test_unknown_token_is_harmless() {
    let app = spawn_app().await;

    app.api.post_message(message("s1", "add:1")).await;
    let reply = app.api.post_message(message("s1", "open sesame")).await;
    assert!(reply.message.contains("Invalid option"));
    assert!(!reply.options.is_empty());

    // No state mutation happened.
    let current = app.api.current_order("s1").await;
    assert_eq!(current.total, Amount::naira(2500));
}

#[tokio::test]
async fn test_checkout_empty_cart_returns_guidance_not_crash() {
    let app = spawn_app().await;
    let reply = app.api.post_message(message("s1", "checkout")).await;
    assert!(reply.message.contains("No order to place"));

    let init = app
        .api
        .initialize_payment(PaymentInitRequest {
            user_id: "s1".to_string(),
        })
        .await;
    assert!(!init.status);
    assert!(init.message.unwrap().contains("No order to pay for"));
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let app = spawn_app().await;

    for item in ["add:1", "add:2"] {
        app.api.post_message(message("s1", item)).await;
        let init = app
            .api
            .initialize_payment(PaymentInitRequest {
                user_id: "s1".to_string(),
            })
            .await;
        let reference = init.data.unwrap().reference;
        app.api
            .verify_payment(VerifyRequest {
                reference,
                user_id: "s1".to_string(),
                outcome: None,
            })
            .await;
    }

    let history = app.api.order_history("s1").await;
    assert_eq!(history.len(), 2);
    assert!(history[0].date >= history[1].date);
    // The second (newest) order held the Pounded Yam.
    assert_eq!(history[0].snapshot.total, Amount::naira(2200));
}
