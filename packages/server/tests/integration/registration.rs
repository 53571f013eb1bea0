use serde_json::json;

use crate::common::{TestApp, routes, seeded, users};

mod create {
    use super::*;

    #[tokio::test]
    async fn paid_automated_workshop_starts_awaiting_payment() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app.create_workshop(&admin, json!({"price": 1500})).await;
        let (user_id, token) = app
            .create_authenticated_user("Priya Patel", "priya@example.com")
            .await;

        let res = app.register_for(&token, user_id, workshop, "automated").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "payment_pending");
        assert_eq!(res.body["paymentStatus"], "pending");
        assert_eq!(res.body["paymentAmount"], 1500);

        let w = app.get_without_token(&routes::workshop(workshop)).await;
        assert_eq!(w.body["registeredSeats"], 0);
    }

    #[tokio::test]
    async fn free_automated_workshop_confirms_and_takes_a_seat() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app.create_workshop(&admin, json!({"price": 0})).await;
        let (user_id, token) = app
            .create_authenticated_user("Priya Patel", "priya@example.com")
            .await;

        let res = app.register_for(&token, user_id, workshop, "automated").await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "confirmed");
        assert_eq!(res.body["paymentStatus"], "not_required");

        let w = app.get_without_token(&routes::workshop(workshop)).await;
        assert_eq!(w.body["registeredSeats"], 1);
        assert_eq!(w.body["availableSeats"], 29);
    }

    #[tokio::test]
    async fn manual_workshop_waits_for_approval() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .register_for(&john, users::JOHN_ID, seeded::MARKETING_WORKSHOP, "manual")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "pending_approval");
        assert_eq!(res.body["paymentStatus"], "not_required");
    }

    #[tokio::test]
    async fn manual_registration_waits_for_approval_regardless_of_amount() {
        let app = TestApp::spawn().await;
        let sarah = app.login(users::SARAH).await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({
                    "userId": users::SARAH_ID,
                    "workshopId": seeded::REACT_WORKSHOP,
                    "registrationType": "manual",
                    "paymentAmount": 2999,
                }),
                &sarah,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "pending_approval");
        assert_eq!(res.body["paymentStatus"], "not_required");
        assert_eq!(res.body["paymentAmount"], 2999);

        let w = app
            .get_without_token(&routes::workshop(seeded::REACT_WORKSHOP))
            .await;
        assert_eq!(w.body["registeredSeats"], 0);
    }

    #[tokio::test]
    async fn omitted_amount_defaults_to_the_workshop_price() {
        let app = TestApp::spawn().await;
        let sarah = app.login(users::SARAH).await;

        let res = app
            .register_for(&sarah, users::SARAH_ID, seeded::REACT_WORKSHOP, "automated")
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "payment_pending");
        assert_eq!(res.body["paymentStatus"], "pending");
        assert_eq!(res.body["paymentAmount"], 2999);
    }

    #[tokio::test]
    async fn negative_payment_amount_is_rejected() {
        let app = TestApp::spawn().await;
        let sarah = app.login(users::SARAH).await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({
                    "userId": users::SARAH_ID,
                    "workshopId": seeded::REACT_WORKSHOP,
                    "registrationType": "automated",
                    "paymentAmount": -1,
                }),
                &sarah,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .register_for(&john, users::JOHN_ID, seeded::REACT_WORKSHOP, "automated")
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn full_workshop_rejects_new_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app
            .create_workshop(&admin, json!({"price": 0, "maxSeats": 1}))
            .await;

        let first = app
            .register_for(&admin, users::JOHN_ID, workshop, "automated")
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let second = app
            .register_for(&admin, users::SARAH_ID, workshop, "automated")
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn users_cannot_register_someone_else() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .register_for(&john, users::SARAH_ID, seeded::REACT_WORKSHOP, "automated")
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn unknown_workshop_is_not_found() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .register_for(&john, users::JOHN_ID, 999, "automated")
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .post_with_token(routes::REGISTRATIONS, &json!({"userId": 1}), &john)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn users_only_list_their_own_registrations() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .get_with_token(
                &format!("{}?userId={}", routes::REGISTRATIONS, users::SARAH_ID),
                &john,
            )
            .await;

        assert_eq!(res.status, 200);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["userId"], users::JOHN_ID);
    }

    #[tokio::test]
    async fn admin_can_filter_by_status() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;

        let res = app
            .get_with_token(
                &format!("{}?status=pending_approval", routes::REGISTRATIONS),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], seeded::SARAH_MARKETING);
    }

    #[tokio::test]
    async fn another_users_registration_looks_missing() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .get_with_token(&routes::registration(seeded::SARAH_MARKETING), &john)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn owner_can_fetch_their_registration() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .get_with_token(&routes::registration(seeded::JOHN_REACT), &john)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["transactionId"], "TXN123456789");
        assert_eq!(res.body["paymentStatus"], "pending_verification");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn submitting_proof_moves_payment_to_verification() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app.create_workshop(&admin, json!({"price": 1500})).await;
        let (user_id, token) = app
            .create_authenticated_user("Priya Patel", "priya@example.com")
            .await;
        let created = app.register_for(&token, user_id, workshop, "automated").await;
        let id = created.id();

        let res = app
            .put_with_token(
                &routes::registration(id),
                &json!({"transactionId": "TXN555666777", "upiId": "priya@upi"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "payment_pending");
        assert_eq!(res.body["paymentStatus"], "pending_verification");
        assert_eq!(res.body["transactionId"], "TXN555666777");
        assert_eq!(res.body["upiId"], "priya@upi");
    }

    #[tokio::test]
    async fn notes_only_update_keeps_status() {
        let app = TestApp::spawn().await;
        let sarah = app.login(users::SARAH).await;

        let res = app
            .put_with_token(
                &routes::registration(seeded::SARAH_MARKETING),
                &json!({"notes": "Bringing a laptop"}),
                &sarah,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["notes"], "Bringing a laptop");
        assert_eq!(res.body["status"], "pending_approval");
    }

    #[tokio::test]
    async fn cannot_update_someone_elses_registration() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .put_with_token(
                &routes::registration(seeded::SARAH_MARKETING),
                &json!({"notes": "hijack"}),
                &john,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_a_confirmed_registration_releases_its_seat() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let workshop = app.create_workshop(&admin, json!({"price": 0})).await;
        let created = app
            .register_for(&admin, users::JOHN_ID, workshop, "automated")
            .await;
        assert_eq!(created.status, 201, "{}", created.text);

        let res = app
            .delete_with_token(&routes::registration(created.id()), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let w = app.get_without_token(&routes::workshop(workshop)).await;
        assert_eq!(w.body["registeredSeats"], 0);
    }

    #[tokio::test]
    async fn regular_users_cannot_delete_registrations() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .delete_with_token(&routes::registration(seeded::JOHN_REACT), &john)
            .await;

        assert_eq!(res.status, 403);
    }
}
