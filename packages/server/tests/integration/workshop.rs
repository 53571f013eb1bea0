use serde_json::json;

use crate::common::{TestApp, routes, seeded, users};

mod listing {
    use super::*;

    #[tokio::test]
    async fn anonymous_visitors_can_browse_the_catalogue() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::WORKSHOPS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let workshops = res.body["workshops"].as_array().unwrap();
        assert_eq!(workshops.len(), 2);
        // Featured first under the default relevance sort.
        assert_eq!(workshops[0]["title"], "Advanced React Development");
        assert_eq!(workshops[0]["availableSeats"], 50);
        assert_eq!(workshops[0]["agenda"][0]["topic"], "Advanced Hooks and Custom Hooks");
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["pagination"]["hasNext"], false);
        assert_eq!(
            res.body["filters"]["categories"],
            json!(["Marketing", "Technology"])
        );
        assert_eq!(res.body["filters"]["cities"], json!(["Mumbai"]));
    }

    #[tokio::test]
    async fn search_matches_tags_case_insensitively() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?search=SEO", routes::WORKSHOPS))
            .await;

        assert_eq!(res.status, 200);
        let workshops = res.body["workshops"].as_array().unwrap();
        assert_eq!(workshops.len(), 1);
        assert_eq!(workshops[0]["title"], "Digital Marketing Masterclass");
    }

    #[tokio::test]
    async fn search_treats_percent_literally() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?search=%25", routes::WORKSHOPS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["workshops"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn all_facet_values_disable_the_filter() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!(
                "{}?category=All%20Categories&city=all&level=All%20Levels",
                routes::WORKSHOPS
            ))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn price_filter_splits_free_and_paid() {
        let app = TestApp::spawn().await;

        let free = app
            .get_without_token(&format!("{}?price=free", routes::WORKSHOPS))
            .await;
        let paid = app
            .get_without_token(&format!("{}?price=paid", routes::WORKSHOPS))
            .await;

        assert_eq!(free.body["workshops"][0]["price"], 0);
        assert_eq!(free.body["pagination"]["total"], 1);
        assert_eq!(paid.body["workshops"][0]["price"], 2999);
        assert_eq!(paid.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn sort_by_price_low_puts_free_workshops_first() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?sort=price-low", routes::WORKSHOPS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["workshops"][0]["price"], 0);
        assert_eq!(res.body["workshops"][1]["price"], 2999);
    }

    #[tokio::test]
    async fn unknown_sort_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?sort=cheapest", routes::WORKSHOPS))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn pagination_reports_next_page() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?limit=1&page=1", routes::WORKSHOPS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["workshops"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["totalPages"], 2);
        assert_eq!(res.body["pagination"]["hasNext"], true);
        assert_eq!(res.body["pagination"]["hasPrev"], false);
    }
}

mod crud {
    use super::*;

    #[tokio::test]
    async fn get_unknown_workshop_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::workshop(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn admin_can_create_and_fetch_a_workshop() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;

        let id = app.create_workshop(&admin, json!({})).await;
        let res = app.get_without_token(&routes::workshop(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Rust for Backend Engineers");
        assert_eq!(res.body["maxSeats"], 30);
        assert_eq!(res.body["registeredSeats"], 0);
        assert_eq!(res.body["mode"], "automated");

        let search = app
            .get_without_token(&format!("{}?search=ferris", routes::WORKSHOPS))
            .await;
        assert_eq!(search.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn create_requires_the_mandatory_fields() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;

        let res = app
            .post_with_token(routes::WORKSHOPS, &json!({"title": "Half a workshop"}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_users_cannot_manage_workshops() {
        let app = TestApp::spawn().await;
        let john = app.login(users::JOHN).await;

        let res = app
            .post_with_token(routes::WORKSHOPS, &json!({"title": "Nope"}), &john)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app
            .delete_with_token(&routes::workshop(seeded::MARKETING_WORKSHOP), &john)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;

        let res = app
            .put_with_token(
                &routes::workshop(seeded::REACT_WORKSHOP),
                &json!({"price": 3499, "tags": ["react", "nextjs"]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["price"], 3499);
        assert_eq!(res.body["title"], "Advanced React Development");
        assert_eq!(res.body["tags"], json!(["react", "nextjs"]));

        let search = app
            .get_without_token(&format!("{}?search=nextjs", routes::WORKSHOPS))
            .await;
        assert_eq!(search.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn max_seats_cannot_drop_below_taken_seats() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let id = app
            .create_workshop(&admin, json!({"price": 0, "maxSeats": 5}))
            .await;
        let res = app
            .register_for(&admin, users::JOHN_ID, id, "automated")
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let res = app
            .register_for(&admin, users::SARAH_ID, id, "automated")
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .put_with_token(&routes::workshop(id), &json!({"maxSeats": 1}), &admin)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn workshop_with_registrations_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;

        let res = app
            .delete_with_token(&routes::workshop(seeded::REACT_WORKSHOP), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn empty_workshop_can_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.login(users::ADMIN).await;
        let id = app.create_workshop(&admin, json!({})).await;

        let res = app.delete_with_token(&routes::workshop(id), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["message"].is_string());

        let res = app.get_without_token(&routes::workshop(id)).await;
        assert_eq!(res.status, 404);
    }
}
