use serde_json::json;

use crate::common::{TestApp, routes, seeded, users};

mod verify {
    use super::*;

    async fn verify(
        app: &TestApp,
        token: &str,
        transaction_id: &str,
        amount: i64,
    ) -> crate::common::TestResponse {
        app.post_with_token(
            routes::PAYMENTS_VERIFY,
            &json!({
                "transactionId": transaction_id,
                "amount": amount,
                "workshopId": seeded::REACT_WORKSHOP,
                "registrationId": seeded::JOHN_REACT,
            }),
            token,
        )
        .await
    }

    #[tokio::test]
    async fn matching_successful_payment_is_verified() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN123456789", 2999).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["verified"], true);
        assert_eq!(res.body["status"], "success");
        assert_eq!(res.body["payment"]["transactionId"], "TXN123456789");
        assert_eq!(res.body["payment"]["paymentMethod"], "upi");
        assert_eq!(res.body["payment"]["upiId"], "user@paytm");
        assert_eq!(res.body["registrationId"], seeded::JOHN_REACT);
    }

    #[tokio::test]
    async fn verification_does_not_change_the_registration() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        verify(&app, &john, "TXN123456789", 2999).await;
        let reg = app
            .get_with_token(&routes::registration(seeded::JOHN_REACT), &john)
            .await;

        assert_eq!(reg.body["status"], "payment_pending");
        assert_eq!(reg.body["paymentStatus"], "pending_verification");
    }

    #[tokio::test]
    async fn wrong_amount_is_a_mismatch() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN123456789", 1999).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["verified"], false);
        assert_eq!(res.body["status"], "amount_mismatch");
        assert_eq!(res.body["expectedAmount"], 1999);
        assert_eq!(res.body["actualAmount"], 2999);
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN000000000", 2999).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["status"], "not_found");
    }

    #[tokio::test]
    async fn pending_transaction_is_accepted_for_later() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN555666777", 1999).await;

        assert_eq!(res.status, 202);
        assert_eq!(res.body["status"], "pending");
        assert_eq!(res.body["verified"], false);
    }

    #[tokio::test]
    async fn failed_transaction_is_rejected() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN111222333", 999).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["status"], "failed");
    }

    #[tokio::test]
    async fn amount_is_checked_before_gateway_status() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = verify(&app, &john, "TXN111222333", 1000).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["status"], "amount_mismatch");
    }

    #[tokio::test]
    async fn missing_fields_are_a_validation_error() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .post_with_token(
                routes::PAYMENTS_VERIFY,
                &json!({"transactionId": "TXN123456789"}),
                &john,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn verification_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PAYMENTS_VERIFY,
                &json!({
                    "transactionId": "TXN123456789",
                    "amount": 2999,
                    "workshopId": 1,
                    "registrationId": 1,
                }),
            )
            .await;

        assert_eq!(res.status, 401);
    }
}

mod webhook {
    use super::*;

    #[tokio::test]
    async fn successful_payment_confirms_the_registration() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app.create_workshop(&admin, json!({"price": 1500})).await;
        let (user_id, token) = app
            .create_authenticated_user("Priya Patel", "priya@example.com")
            .await;
        let id = app
            .register_for(&token, user_id, workshop, "automated")
            .await
            .id();

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.success",
                    "data": {"transactionId": "TXN424242424", "amount": 1500, "registrationId": id},
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "received");
        assert_eq!(res.body["applied"], true);
        assert_eq!(res.body["registrationStatus"], "confirmed");
        assert_eq!(res.body["paymentStatus"], "completed");

        let reg = app.get_with_token(&routes::registration(id), &token).await;
        assert_eq!(reg.body["transactionId"], "TXN424242424");
        let w = app.get_without_token(&routes::workshop(workshop)).await;
        assert_eq!(w.body["registeredSeats"], 1);

        let sent = app.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_email, "priya@example.com");

        // The recorded transaction now verifies.
        let verify = app
            .post_with_token(
                routes::PAYMENTS_VERIFY,
                &json!({"transactionId": "TXN424242424", "amount": 1500, "workshopId": workshop, "registrationId": id}),
                &token,
            )
            .await;
        assert_eq!(verify.status, 200);
    }

    #[tokio::test]
    async fn failed_payment_keeps_registration_awaiting_payment() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.failed",
                    "data": {
                        "transactionId": "TXN123456789",
                        "amount": 2999,
                        "registrationId": seeded::JOHN_REACT,
                        "reason": "insufficient funds",
                    },
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["applied"], true);
        assert_eq!(res.body["registrationStatus"], "payment_pending");
        assert_eq!(res.body["paymentStatus"], "failed");
        assert!(app.notifications().is_empty());
    }

    #[tokio::test]
    async fn amount_mismatch_records_but_does_not_settle() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.success",
                    "data": {"transactionId": "TXN999000111", "amount": 100, "registrationId": seeded::JOHN_REACT},
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["applied"], false);
        assert_eq!(res.body["registrationStatus"], "payment_pending");
    }

    #[tokio::test]
    async fn webhook_validates_amount_and_registration() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.success",
                    "data": {"transactionId": "TXN777888999", "amount": 0, "registrationId": seeded::SARAH_MARKETING},
                }),
            )
            .await;

        // Zero is not a valid gateway amount.
        assert_eq!(res.status, 400);

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.success",
                    "data": {"transactionId": "TXN777888999", "amount": 50, "registrationId": 999},
                }),
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn redelivered_success_is_acknowledged_without_changes() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let decision = app
            .post_with_token(
                routes::ADMIN_PAYMENTS_VERIFY,
                &json!({"registrationId": seeded::JOHN_REACT, "action": "approve"}),
                &admin,
            )
            .await;
        assert_eq!(decision.status, 200, "{}", decision.text);

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({
                    "event": "payment.success",
                    "data": {"transactionId": "TXN123456789", "amount": 2999, "registrationId": seeded::JOHN_REACT},
                }),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["applied"], false);
        assert_eq!(res.body["registrationStatus"], "confirmed");
    }

    #[tokio::test]
    async fn unknown_events_are_ignored() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PAYMENTS_WEBHOOK,
                &json!({"event": "refund.created", "data": {}}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ignored");
        assert_eq!(res.body["applied"], false);
    }

    #[tokio::test]
    async fn configured_secret_is_enforced() {
        let app = TestApp::spawn_with(|c| {
            c.payments.webhook_secret = Some("hook-secret".into());
        })
        .await;
        let body = json!({
            "event": "payment.pending",
            "data": {"transactionId": "TXN123123123", "amount": 10},
        });

        let res = app.post_without_token(routes::PAYMENTS_WEBHOOK, &body).await;
        assert_eq!(res.status, 401);

        let res = app
            .client
            .post(app.url(routes::PAYMENTS_WEBHOOK))
            .header("X-Webhook-Secret", "hook-secret")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }
}
