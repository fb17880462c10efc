//! End-to-end tests of the HTTP surface, backed by the in-memory store.

use api_lib::{
    adapters::MemoryAdapter,
    config::{Config, MEMORY_DATABASE_URL},
    web::{router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use store_locator_core::ports::{Mail, MailService, PortResult};
use tower::ServiceExt;

//=========================================================================================
// Harness
//=========================================================================================

#[derive(Default)]
struct RecordingMail {
    sent: Mutex<Vec<Mail>>,
}

#[async_trait]
impl MailService for RecordingMail {
    async fn send(&self, mail: Mail) -> PortResult<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    mail: Arc<RecordingMail>,
}

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    cookie: Option<String>,
    body: Value,
}

impl TestApp {
    fn new() -> Self {
        let vars: HashMap<String, String> =
            [("DATABASE_URL".to_string(), MEMORY_DATABASE_URL.to_string())].into();
        let config = Config::from_vars(&vars).unwrap();
        let mail = Arc::new(RecordingMail::default());
        let state = Arc::new(AppState {
            db: Arc::new(MemoryAdapter::new()),
            mail: mail.clone(),
            config: Arc::new(config),
        });
        Self {
            router: router(state),
            mail,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let location = header_str(header::LOCATION);
        let cookie = header_str(header::SET_COOKIE)
            .and_then(|c| c.split(';').next().map(str::to_string));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            location,
            cookie,
            body,
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, cookie, None).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, cookie, Some(body)).await
    }

    /// Registers an account and returns its `session=...` cookie.
    async fn register(&self, name: &str, email: &str) -> String {
        let res = self
            .post(
                "/register",
                None,
                json!({ "name": name, "email": email, "password": "password123" }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.cookie.expect("signup sets a session cookie")
    }

    async fn add_store(&self, cookie: &str, name: &str, tags: &[&str], lng: f64, lat: f64) -> Value {
        let res = self
            .post(
                "/add",
                Some(cookie),
                json!({
                    "name": name,
                    "description": format!("{} serves coffee", name),
                    "tags": tags,
                    "location": { "coordinates": [lng, lat], "address": "1 Main St" },
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body
    }
}

//=========================================================================================
// Stores
//=========================================================================================

#[tokio::test]
async fn duplicate_names_get_numbered_slugs() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;

    let first = app.add_store(&cookie, "Coffee Shop", &[], -79.38, 43.65).await;
    let second = app.add_store(&cookie, "Coffee Shop", &[], -79.38, 43.65).await;
    assert_eq!(first["slug"], "coffee-shop");
    assert_eq!(second["slug"], "coffee-shop-2");

    let res = app.get("/store/coffee-shop-2", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["store"]["id"], second["id"]);
    assert_eq!(res.body["author"]["name"], "Wes");
    assert_eq!(res.body["store"]["location"]["type"], "Point");
}

#[tokio::test]
async fn create_requires_login_and_valid_fields() {
    let app = TestApp::new();
    let res = app.post("/add", None, json!({ "name": "Nope" })).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let cookie = app.register("Wes", "wes@example.com").await;
    let res = app
        .post("/add", Some(&cookie), json!({ "name": "  " }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let messages: Vec<&str> = res.body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["message"].as_str())
        .collect();
    assert!(messages.contains(&"Please enter a store name!"));
    assert!(messages.contains(&"You must supply coordinates!"));
    assert!(messages.contains(&"You must supply an address!"));
}

#[tokio::test]
async fn only_the_owner_may_edit() {
    let app = TestApp::new();
    let owner = app.register("Owner", "owner@example.com").await;
    let other = app.register("Other", "other@example.com").await;
    let store = app.add_store(&owner, "Bean There", &[], -79.38, 43.65).await;
    let id = store["id"].as_str().unwrap();

    let res = app.get(&format!("/stores/{}/edit", id), Some(&other)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let edit = json!({
        "name": "Bean Here",
        "location": { "coordinates": [-79.38, 43.65], "address": "1 Main St" },
    });
    let res = app.post(&format!("/add/{}", id), Some(&other), edit.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post(&format!("/add/{}", id), Some(&owner), edit).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["slug"], "bean-here");
    assert_eq!(res.body["author"], store["author"]);
}

#[tokio::test]
async fn renaming_to_the_same_slug_base_keeps_the_slug() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    let first = app.add_store(&cookie, "Coffee Shop", &[], -79.38, 43.65).await;
    let second = app.add_store(&cookie, "Coffee Shop", &[], -79.38, 43.65).await;
    assert_eq!(second["slug"], "coffee-shop-2");

    let uri = format!("/add/{}", first["id"].as_str().unwrap());
    let res = app
        .post(
            &uri,
            Some(&cookie),
            json!({
                "name": "Coffee  Shop",
                "location": { "coordinates": [-79.38, 43.65], "address": "1 Main St" },
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Coffee  Shop");
    assert_eq!(res.body["slug"], "coffee-shop");
    assert_ne!(res.body["slug"], second["slug"]);

    let res = app.get("/store/coffee-shop-2", None).await;
    assert_eq!(res.body["store"]["id"], second["id"]);
}

#[tokio::test]
async fn update_without_photo_keeps_the_stored_one() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    let res = app
        .post(
            "/add",
            Some(&cookie),
            json!({
                "name": "Snap",
                "photo": "abc.jpeg",
                "location": { "coordinates": [-79.38, 43.65], "address": "1 Main St" },
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let uri = format!("/add/{}", res.body["id"].as_str().unwrap());

    let edit = json!({
        "name": "Snap",
        "description": "Now with espresso",
        "location": { "coordinates": [-79.38, 43.65], "address": "1 Main St" },
    });
    let res = app.post(&uri, Some(&cookie), edit).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["photo"], "abc.jpeg");
    assert_eq!(res.body["description"], "Now with espresso");

    let edit = json!({
        "name": "Snap",
        "photo": "new.jpeg",
        "location": { "coordinates": [-79.38, 43.65], "address": "1 Main St" },
    });
    let res = app.post(&uri, Some(&cookie), edit).await;
    assert_eq!(res.body["photo"], "new.jpeg");
}

#[tokio::test]
async fn pages_past_the_end_redirect_to_the_last_page() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    for i in 0..10 {
        app.add_store(&cookie, &format!("Store {}", i), &[], -79.38, 43.65).await;
    }

    let res = app.get("/stores/page/3", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["pages"], 3);
    assert_eq!(res.body["count"], 10);
    assert_eq!(res.body["stores"].as_array().unwrap().len(), 2);

    let res = app.get("/stores/page/5", None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(res.location.unwrap().starts_with("/stores/page/3"));
}

#[tokio::test]
async fn tags_are_counted_most_common_first() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    app.add_store(&cookie, "A", &["Wifi", "Vegan"], -79.38, 43.65).await;
    app.add_store(&cookie, "B", &["Wifi"], -79.38, 43.65).await;

    let res = app.get("/tags/Wifi", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body["tags"],
        json!([{ "tag": "Wifi", "count": 2 }, { "tag": "Vegan", "count": 1 }])
    );
    assert_eq!(res.body["stores"].as_array().unwrap().len(), 2);

    let res = app.get("/tags/Vegan", None).await;
    assert_eq!(res.body["stores"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["stores"][0]["name"], "A");
}

#[tokio::test]
async fn tag_page_without_a_tag_lists_untagged_stores_too() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    app.add_store(&cookie, "Tagged", &["Wifi"], -79.38, 43.65).await;
    app.add_store(&cookie, "Plain", &[], -79.38, 43.65).await;

    let res = app.get("/tags", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["tags"], json!([{ "tag": "Wifi", "count": 1 }]));
    let mut names: Vec<&str> = res.body["stores"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(names, ["Plain", "Tagged"]);
}

#[tokio::test]
async fn top_stores_need_two_reviews() {
    let app = TestApp::new();
    let wes = app.register("Wes", "wes@example.com").await;
    let ana = app.register("Ana", "ana@example.com").await;
    let good = app.add_store(&wes, "Good", &[], -79.38, 43.65).await;
    let once = app.add_store(&wes, "Once", &[], -79.38, 43.65).await;

    for (cookie, store, rating) in [(&wes, &good, 5), (&ana, &good, 4), (&ana, &once, 5)] {
        let uri = format!("/reviews/{}", store["id"].as_str().unwrap());
        let res = app
            .post(&uri, Some(cookie), json!({ "text": "Nice", "rating": rating }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app.get("/top", None).await;
    let top = res.body["stores"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["name"], "Good");
    assert_eq!(top[0]["average_rating"], 4.5);
    assert_eq!(top[0]["review_count"], 2);
}

#[tokio::test]
async fn reviews_are_validated() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    let store = app.add_store(&cookie, "Good", &[], -79.38, 43.65).await;
    let uri = format!("/reviews/{}", store["id"].as_str().unwrap());

    let res = app
        .post(&uri, Some(&cookie), json!({ "text": "Nice", "rating": 6 }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let missing = format!("/reviews/{}", uuid::Uuid::new_v4());
    let res = app
        .post(&missing, Some(&cookie), json!({ "text": "Nice", "rating": 3 }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// JSON API
//=========================================================================================

#[tokio::test]
async fn near_returns_only_close_stores() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    app.add_store(&cookie, "Downtown", &[], -79.38, 43.65).await;
    app.add_store(&cookie, "Montreal", &[], -73.57, 45.50).await;

    let res = app.get("/api/stores/near?lat=43.66&lng=-79.39", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let stores = res.body.as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["name"], "Downtown");
    assert!(stores[0].get("tags").is_none());

    let res = app.get("/api/stores/near?lat=abc&lng=-79.39", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.get("/api/stores/near?lng=-79.39", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_ranks_and_handles_empty_queries() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    app.add_store(&cookie, "Tea House", &[], -79.38, 43.65).await;
    app.add_store(&cookie, "Bakery", &[], -79.38, 43.65).await;

    let res = app.get("/api/search?q=tea", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let hits = res.body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Tea House");
    assert!(hits[0]["score"].as_f64().unwrap() > 0.0);

    let res = app.get("/api/search?q=", None).await;
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn hearting_twice_toggles_back() {
    let app = TestApp::new();
    let cookie = app.register("Wes", "wes@example.com").await;
    let store = app.add_store(&cookie, "Good", &[], -79.38, 43.65).await;
    let uri = format!("/api/stores/{}/heart", store["id"].as_str().unwrap());

    let res = app.send(Method::POST, &uri, Some(&cookie), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["hearts"], json!([store["id"]]));

    let res = app.get("/hearts", Some(&cookie)).await;
    assert_eq!(res.body["stores"][0]["id"], store["id"]);

    let res = app.send(Method::POST, &uri, Some(&cookie), None).await;
    assert_eq!(res.body["hearts"], json!([]));

    let missing = format!("/api/stores/{}/heart", uuid::Uuid::new_v4());
    let res = app.send(Method::POST, &missing, Some(&cookie), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

//=========================================================================================
// Accounts
//=========================================================================================

#[tokio::test]
async fn login_rejects_bad_credentials_and_logout_ends_session() {
    let app = TestApp::new();
    app.register("Wes", "wes@example.com").await;

    let res = app
        .post("/login", None, json!({ "email": "wes@example.com", "password": "wrong-password" }))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post("/login", None, json!({ "email": "wes@example.com", "password": "password123" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.cookie.unwrap();
    assert_eq!(app.get("/hearts", Some(&cookie)).await.status, StatusCode::OK);

    let res = app.get("/logout", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(app.get("/hearts", Some(&cookie)).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new();
    app.register("Wes", "wes@example.com").await;
    let res = app
        .post(
            "/register",
            None,
            json!({ "name": "Wes", "email": "wes@example.com", "password": "password123" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn emails_are_case_insensitive() {
    let app = TestApp::new();
    let res = app
        .post(
            "/register",
            None,
            json!({ "name": "Wes", "email": " Wes@Example.com ", "password": "password123" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["email"], "wes@example.com");

    let res = app
        .post(
            "/register",
            None,
            json!({ "name": "Other Wes", "email": "wes@example.com", "password": "password456" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post("/login", None, json!({ "email": "WES@example.COM", "password": "password123" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Wes");

    let res = app
        .post("/account/forgot", None, json!({ "email": "wes@EXAMPLE.com" }))
        .await;
    assert_eq!(res.location.as_deref(), Some("/login?success=reset_sent"));
    assert_eq!(app.mail.sent.lock().unwrap()[0].to, "wes@example.com");
}

#[tokio::test]
async fn password_reset_flow() {
    let app = TestApp::new();
    app.register("Wes", "wes@example.com").await;

    let res = app
        .post("/account/forgot", None, json!({ "email": "nobody@example.com" }))
        .await;
    assert_eq!(res.location.as_deref(), Some("/login?error=no_account"));

    let res = app
        .post("/account/forgot", None, json!({ "email": "wes@example.com" }))
        .await;
    assert_eq!(res.location.as_deref(), Some("/login?success=reset_sent"));

    let body = {
        let sent = app.mail.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Password Reset");
        sent[0].body.clone()
    };
    let token = body
        .split("/account/reset/")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap()
        .to_string();
    let uri = format!("/account/reset/{}", token);

    let res = app.get(&uri, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token"], token);

    let res = app
        .post(&uri, None, json!({ "password": "new-password", "password-confirm": "other-password" }))
        .await;
    assert_eq!(
        res.location,
        Some(format!("/account/reset/{}?error=password_mismatch", token))
    );

    let res = app
        .post(&uri, None, json!({ "password": "new-password", "password-confirm": "new-password" }))
        .await;
    assert_eq!(res.location.as_deref(), Some("/?success=password_reset"));
    assert!(res.cookie.is_some());

    // The token is single-use.
    let res = app.get(&uri, None).await;
    assert_eq!(res.location.as_deref(), Some("/login?error=reset_invalid"));

    let res = app
        .post("/login", None, json!({ "email": "wes@example.com", "password": "new-password" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
}
