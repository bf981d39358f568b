//! Drives the full router against the in-memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::Duration;
use cuesheet_core::{
    Cuesheet, CuesheetOptions, Database, MemoryDatabase, Scope, SharedDatabase, ThrottleSettings,
    TokenSettings, UpdatedUser, ADMIN_ROLE,
};
use cuesheet_server::{build_router, ServerContext, ServerOptions};
use serde_json::{json, Value};
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    db: SharedDatabase,
}

impl TestApp {
    fn new(scope: Scope) -> Self {
        let db: SharedDatabase = Arc::new(MemoryDatabase::new());

        let cuesheet = Cuesheet::new(
            db.clone(),
            CuesheetOptions {
                scope,
                tokens: TokenSettings {
                    secret: "a-test-secret-that-is-at-least-32-bytes".to_string(),
                    lifetime: Duration::hours(5),
                },
                throttle: ThrottleSettings {
                    max_failures: 3,
                    window: Duration::minutes(15),
                },
            },
        );

        let context = ServerContext::new(cuesheet, ServerOptions::default());

        Self {
            router: build_router(context),
            db,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);

        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Signs up a user and returns its session cookie and id
    async fn signup(&self, email: &str) -> (String, i32) {
        let response = self
            .send(
                "POST",
                "/api/signup",
                None,
                Some(json!({ "email": email, "password": "correct horse" })),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let cookie = session_cookie(&response);
        let body = extract_json(response).await;

        (cookie, body["user"]["_id"].as_i64().unwrap() as i32)
    }

    async fn admin(&self, email: &str) -> String {
        let (cookie, id) = self.signup(email).await;

        self.db
            .update_user(UpdatedUser {
                id,
                role: Some(ADMIN_ROLE.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        cookie
    }
}

/// Returns the `token=...` pair of the Set-Cookie header
fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn general(day: &str, shift: &str, order_index: i64) -> Value {
    json!({
        "programType": "General",
        "orderIndex": order_index,
        "serial": "1",
        "broadcastTime": "08:00",
        "programDetails": "News",
        "day": day,
        "shift": shift,
        "period": "morning"
    })
}

#[tokio::test]
async fn health_endpoints() {
    let app = TestApp::new(Scope::Shared);

    let response = app.send("GET", "/", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["message"], "Server OK");

    let response = app.send("GET", "/ping", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send("GET", "/api.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(extract_json(response).await["paths"]["/api/programs"].is_object());
}

#[tokio::test]
async fn session_cookie_is_required() {
    let app = TestApp::new(Scope::Shared);
    let body = Some(general("Sunday", "Morning", 0));

    let response = app.send("POST", "/api/programs", None, body.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        extract_json(response).await["message"],
        "Unauthorized: Token missing"
    );

    let response = app
        .send("POST", "/api/programs", Some("token=not.a.token"), body)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        extract_json(response).await["message"],
        "Unauthorized: Invalid token"
    );
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, id) = app.signup("host@example.com").await;

    let response = app.send("GET", "/api/user", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = extract_json(response).await;
    assert_eq!(user["_id"], id);
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());

    let again = app
        .send(
            "POST",
            "/api/signup",
            None,
            Some(json!({ "email": "host@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let response = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "host@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));

    let response = app.send("POST", "/api/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("token="));
}

#[tokio::test]
async fn failed_logins_are_throttled() {
    let app = TestApp::new(Scope::Shared);
    app.signup("host@example.com").await;

    let wrong = json!({ "email": "host@example.com", "password": "wrong password" });

    for _ in 0..3 {
        let response = app.send("POST", "/api/login", None, Some(wrong.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app.send("POST", "/api/login", None, Some(wrong)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn song_create_clears_schedule() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    let response = app
        .send(
            "POST",
            "/api/programs",
            Some(&cookie),
            Some(json!({
                "programType": "Song",
                "artist": "X",
                "cdCut": "123-A",
                "orderIndex": 2,
                "day": "Sunday",
                "serial": "5"
            })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let song = extract_json(response).await;
    assert_eq!(song["day"], "");
    assert_eq!(song["shift"], "");
    assert_eq!(song["serial"], "");
    assert_eq!(song["orderIndex"], 2);
    assert_eq!(song["cdCut"], "123-A");
    assert!(song["_id"].is_number());
}

#[tokio::test]
async fn programs_list_in_order() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    for order_index in [2, 0, 1] {
        let response = app
            .send(
                "POST",
                "/api/programs",
                Some(&cookie),
                Some(general("Sunday", "Morning", order_index)),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    app.send(
        "POST",
        "/api/programs",
        Some(&cookie),
        Some(general("Sunday", "Evening", 0)),
    )
    .await;

    let response = app
        .send("GET", "/api/programs?day=Sunday&shift=Morning", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let order: Vec<_> = extract_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["orderIndex"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![0, 1, 2]);

    let response = app.send("GET", "/api/programs?day=Sunday", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["message"],
        "Day and Shift are required"
    );
}

#[tokio::test]
async fn invalid_programs_are_rejected() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    let response = app
        .send(
            "POST",
            "/api/programs",
            Some(&cookie),
            Some(json!({ "programType": "General", "orderIndex": 0, "day": "Sunday" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["missingFields"],
        json!(["serial", "broadcastTime", "programDetails", "shift", "period"])
    );

    let response = app
        .send(
            "POST",
            "/api/programs",
            Some(&cookie),
            Some(json!({ "programType": "Song", "orderIndex": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["missingFields"], json!(["artist"]));

    let mut program = general("Sunday", "Morning", 0);
    program["orderIndex"] = json!("first");

    let response = app
        .send("POST", "/api/programs", Some(&cookie), Some(program))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/programs")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["message"], "JSON parse failed");
}

#[tokio::test]
async fn localized_serials_are_normalized() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    let mut program = general("Sunday", "Morning", 0);
    program["serial"] = json!("১২");
    program["orderIndex"] = json!("৩");

    let response = app
        .send("POST", "/api/programs", Some(&cookie), Some(program))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let program = extract_json(response).await;
    assert_eq!(program["serial"], "12");
    assert_eq!(program["orderIndex"], 3);
}

#[tokio::test]
async fn updates_need_an_admin() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    let created = app
        .send(
            "POST",
            "/api/programs",
            Some(&cookie),
            Some(general("Sunday", "Morning", 0)),
        )
        .await;
    let id = extract_json(created).await["_id"].as_i64().unwrap();
    let uri = format!("/api/programs/{}", id);
    let change = Some(json!({ "programDetails": "Weather", "_id": "ignored" }));

    let response = app.send("PUT", &uri, Some(&cookie), change.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        extract_json(response).await["message"],
        "Forbidden: Admins only"
    );

    let admin = app.admin("admin@example.com").await;

    let response = app.send("PUT", &uri, Some(&admin), change.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = extract_json(response).await;
    assert_eq!(updated["programDetails"], "Weather");
    assert_eq!(updated["day"], "Sunday");

    for missing in ["/api/programs/9999", "/api/programs/abc"] {
        let response = app.send("PUT", missing, Some(&admin), change.clone()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            extract_json(response).await["message"],
            "Not found or no permission"
        );
    }

    let response = app.send("DELETE", &uri, Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response).await["message"],
        "Program deleted successfully."
    );

    let response = app.send("DELETE", &uri, Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(response).await["message"], "Program not found.");
}

#[tokio::test]
async fn foreign_programs_look_missing() {
    let app = TestApp::new(Scope::PerUser);
    let (owner, _) = app.signup("owner@example.com").await;
    let (other, _) = app.signup("other@example.com").await;

    let created = app
        .send(
            "POST",
            "/api/programs",
            Some(&owner),
            Some(general("Sunday", "Morning", 0)),
        )
        .await;
    let id = extract_json(created).await["_id"].as_i64().unwrap();

    let response = app
        .send("GET", "/api/programs?day=Sunday&shift=Morning", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send("GET", "/api/programs?day=Sunday&shift=Morning", Some(&other), None)
        .await;
    assert_eq!(extract_json(response).await, json!([]));

    let foreign = app
        .send("DELETE", &format!("/api/programs/{}", id), Some(&other), None)
        .await;
    let missing = app
        .send("DELETE", "/api/programs/9999", Some(&other), None)
        .await;

    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(foreign).await, extract_json(missing).await);

    let response = app
        .send("GET", "/api/programs?day=Sunday&shift=Morning", Some(&owner), None)
        .await;
    assert_eq!(extract_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn special_programs() {
    let app = TestApp::new(Scope::Shared);
    let admin = app.admin("admin@example.com").await;

    let response = app
        .send(
            "POST",
            "/api/special",
            Some(&admin),
            Some(json!({
                "programType": "General",
                "orderIndex": 0,
                "day": "Sunday",
                "shift": "Morning",
                "programDetails": "Eid special"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let special = extract_json(response).await;
    assert_eq!(special["day"], "");
    assert_eq!(special["shift"], "");
    assert_eq!(special["source"], "unknown");

    let uri = format!("/api/special/{}", special["_id"]);

    let response = app
        .send(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({ "serial": "৪", "orderIndex": 4, "type": "ignored" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reordered = extract_json(response).await;
    assert_eq!(reordered["orderIndex"], 4);
    assert_eq!(reordered["serial"], "4");

    let response = app
        .send("PUT", &uri, Some(&admin), Some(json!({ "period": "evening" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response).await["message"],
        "programDetails is required"
    );

    let response = app
        .send("GET", "/api/special?source=unknown", None, None)
        .await;
    assert_eq!(extract_json(response).await.as_array().unwrap().len(), 1);

    let response = app
        .send("GET", "/api/special?source=radio", None, None)
        .await;
    assert_eq!(extract_json(response).await, json!([]));

    let response = app.send("DELETE", "/api/special/9999", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        extract_json(response).await["message"],
        "Special program not found."
    );
}

#[tokio::test]
async fn songs_by_cd_cut() {
    let app = TestApp::new(Scope::Shared);
    let admin = app.admin("admin@example.com").await;

    let songs = [
        ("456-B", "first"),
        ("...", "hidden"),
        ("123-A", "a"),
        ("456-B", "second"),
    ];

    for (cd_cut, artist) in songs {
        app.send(
            "POST",
            "/api/programs",
            Some(&admin),
            Some(json!({
                "programType": "Song",
                "orderIndex": 0,
                "artist": artist,
                "cdCut": cd_cut
            })),
        )
        .await;
    }

    let response = app.send("GET", "/songs", None, None).await;
    let cuts: Vec<_> = extract_json(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["cdCut"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(cuts, vec!["123-A", "456-B", "456-B"]);

    let response = app.send("GET", "/api/songs/byCdCut/456-B", None, None).await;
    let song = extract_json(response).await;
    assert_eq!(song["artist"], "first");

    let response = app.send("GET", "/api/songs/byCdCut/000", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(response).await["message"], "Song not found");

    let response = app.send("GET", "/api/specialSongs", None, None).await;
    assert_eq!(extract_json(response).await, json!([]));

    let response = app
        .send("DELETE", &format!("/songs/{}", song["_id"]), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send("DELETE", &format!("/songs/{}", song["_id"]), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(extract_json(response).await["message"], "Song not found.");

    let response = app.send("DELETE", "/specialSongs/1", Some(&admin), None).await;
    assert_eq!(
        extract_json(response).await["message"],
        "Special song not found."
    );
}

#[tokio::test]
async fn user_sync_and_administration() {
    let app = TestApp::new(Scope::Shared);
    let identity = json!({ "email": "guest@example.com", "displayName": "Guest" });

    let response = app.send("POST", "/users", None, Some(identity.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response).await;
    assert_eq!(created["message"], "User created");
    let id = created["insertedId"].as_i64().unwrap();

    let response = app.send("POST", "/users", None, Some(identity)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response).await,
        json!({ "message": "User already exists", "insertedId": null })
    );

    let response = app
        .send("GET", "/users/admin/guest@example.com", None, None)
        .await;
    assert_eq!(extract_json(response).await, json!({ "isAdmin": false }));

    let (user, _) = app.signup("host@example.com").await;
    let response = app.send("GET", "/users", Some(&user), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = app.admin("admin@example.com").await;
    let response = app.send("GET", "/users", Some(&admin), None).await;
    assert_eq!(extract_json(response).await.as_array().unwrap().len(), 3);

    let uri = format!("/users/{}", id);

    let response = app
        .send("PATCH", &uri, Some(&admin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["role"], "admin");

    let response = app
        .send("GET", "/users/admin/guest@example.com", None, None)
        .await;
    assert_eq!(extract_json(response).await, json!({ "isAdmin": true }));

    let response = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(
        extract_json(response).await["message"],
        "User deleted successfully."
    );

    let response = app.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_identity_sync() {
    let app = TestApp::new(Scope::Shared);
    let (cookie, _) = app.signup("host@example.com").await;

    let response = app
        .send(
            "POST",
            "/api/user",
            Some(&cookie),
            Some(json!({ "displayName": "Evening host" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["insertedId"], Value::Null);

    let response = app.send("GET", "/api/user", Some(&cookie), None).await;
    assert_eq!(extract_json(response).await["displayName"], "Evening host");
}

#[tokio::test]
async fn stored_songs_keep_their_shape() {
    let app = TestApp::new(Scope::Shared);
    let admin = app.admin("admin@example.com").await;

    let created = app
        .send(
            "POST",
            "/api/programs",
            Some(&admin),
            Some(json!({ "programType": "Song", "orderIndex": 0, "artist": "X" })),
        )
        .await;
    let id = extract_json(created).await["_id"].as_i64().unwrap();

    let response = app
        .send(
            "PUT",
            &format!("/api/programs/{}", id),
            Some(&admin),
            Some(json!({ "day": "Monday", "shift": "Morning", "serial": "৫", "period": "p" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let song = extract_json(response).await;
    assert_eq!(song["programType"], "Song");
    assert_eq!(song["day"], "");
    assert_eq!(song["shift"], "");
    assert_eq!(song["serial"], "");
    assert_eq!(song["period"], "");

    let created = app
        .send(
            "POST",
            "/api/special",
            Some(&admin),
            Some(json!({
                "programType": "Song",
                "orderIndex": 0,
                "programDetails": "Recital",
                "artist": "Someone",
                "cdCut": "2-B",
            })),
        )
        .await;
    let id = extract_json(created).await["_id"].as_i64().unwrap();

    let response = app
        .send(
            "PUT",
            &format!("/api/special/{}", id),
            Some(&admin),
            Some(json!({ "programDetails": "fixed typo" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let song = extract_json(response).await;
    assert_eq!(song["programType"], "Song");
    assert_eq!(song["artist"], "Someone");
    assert_eq!(song["cdCut"], "2-B");
}

#[tokio::test]
async fn known_email_sync_adds_uid() {
    let app = TestApp::new(Scope::Shared);

    let response = app
        .send("POST", "/users", None, Some(json!({ "email": "g@example.com" })))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(
            "POST",
            "/users",
            None,
            Some(json!({ "email": "g@example.com", "uid": "firebase-1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["insertedId"], Value::Null);

    let user = app.db.user_by_email("g@example.com").await.unwrap();
    assert_eq!(user.uid.as_deref(), Some("firebase-1"));
}

#[tokio::test]
async fn owners_edit_their_own_programs() {
    let app = TestApp::new(Scope::PerUser);
    let (owner, _) = app.signup("owner@example.com").await;
    let (other, _) = app.signup("other@example.com").await;

    let created = app
        .send(
            "POST",
            "/api/programs",
            Some(&owner),
            Some(general("Sunday", "Morning", 0)),
        )
        .await;
    let uri = format!(
        "/api/programs/{}",
        extract_json(created).await["_id"].as_i64().unwrap()
    );

    let response = app
        .send("PUT", &uri, Some(&owner), Some(json!({ "period": "evening" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["period"], "evening");

    let response = app
        .send("PUT", &uri, Some(&other), Some(json!({ "period": "night" })))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        extract_json(response).await["message"],
        "Not found or no permission"
    );
}
