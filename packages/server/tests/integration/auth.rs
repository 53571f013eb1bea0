use serde_json::json;

use crate::common::{TestApp, routes, users};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_and_gets_a_session() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Priya Patel", "email": "Priya@Example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["user"]["id"].is_number());
        assert_eq!(res.body["user"]["email"], "priya@example.com");
        assert_eq!(res.body["user"]["role"], "user");
        assert!(res.body["token"].is_string());
        assert!(res.body["user"].get("password").is_none());
        assert!(res.session_cookie().is_some());
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "John Again", "email": "JOHN@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_password_that_is_too_short() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Short", "email": "short@example.com", "password": "12345"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_an_email_without_at_sign() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"name": "Nobody", "email": "nobody.example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_missing_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REGISTER, &json!({"email": "a@b.c"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn seeded_user_can_log_in() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": users::JOHN.0, "password": users::JOHN.1}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user"]["name"], "John Doe");
        assert_eq!(res.body["message"], "Login successful");
        let cookie = res.session_cookie().expect("session cookie");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": users::JOHN.0, "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_gets_the_same_error_as_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": "password123"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn me_returns_user_and_permissions_for_bearer_token() {
        let app = TestApp::spawn().await;
        let token = app.login(users::ADMIN).await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user"]["email"], users::ADMIN.0);
        assert_eq!(res.body["user"]["role"], "admin");
        let perms = res.body["permissions"].as_array().unwrap();
        assert!(perms.iter().any(|p| p == "registration:review"));
        assert!(perms.iter().any(|p| p == "stats:view"));
    }

    #[tokio::test]
    async fn me_without_credentials_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn session_cookie_authenticates_until_logout() {
        let app = TestApp::spawn().await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let login = client
            .post(app.url(routes::LOGIN))
            .json(&json!({"email": users::SARAH.0, "password": users::SARAH.1}))
            .send()
            .await
            .unwrap();
        assert_eq!(login.status(), 200);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status(), 200);
        let body: serde_json::Value = me.json().await.unwrap();
        assert_eq!(body["user"]["email"], users::SARAH.0);

        let logout = client.post(app.url(routes::LOGOUT)).send().await.unwrap();
        assert_eq!(logout.status(), 200);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status(), 401);
    }
}
