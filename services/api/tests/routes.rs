mod common;

use axum::http::{header::LOCATION, Request, StatusCode};
use axum::body::Body;
use common::{body_json, empty_request, json_request, router, FakeFetcher, FakeGeocoder, FakeStore};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

const SHORT_LINK: &str = "https://maps.app.goo.gl/abc123";
const PLACE_URL: &str = "https://www.google.com/maps/place/Orlen/@52.2297,21.0122,17z";

fn submission(overrides: serde_json::Value) -> serde_json::Value {
    let mut body = json!({
        "name": "Orlen Modlińska",
        "category": "Parking",
        "subcategory": "",
        "note": "24h",
        "link": SHORT_LINK,
    });
    if let (Some(base), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    body
}

#[tokio::test]
async fn points_listing_reports_count_and_categories() {
    let store = Arc::new(
        FakeStore::default()
            .with_point("rec1", "Parking", "")
            .with_point("rec2", "Warsztat", "Opony"),
    );
    let app = router(store, FakeFetcher::default(), FakeGeocoder::default());

    let response = app.oneshot(empty_request("GET", "/api/points?max=1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["count"], 1);
    assert_eq!(body["points"][0]["id"], "rec1");
    assert_eq!(body["points"][0]["lat"], 52.0);
    assert!(body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "Parking"));
}

#[tokio::test]
async fn meta_merges_observed_subcategories() {
    let store = Arc::new(FakeStore::default().with_point("rec1", "Warsztat", "Opony"));
    let app = router(store, FakeFetcher::default(), FakeGeocoder::default());

    let response = app.oneshot(empty_request("GET", "/api/meta")).await.unwrap();

    let body = body_json(response).await;
    assert_eq!(body["subcategories"]["Warsztat"], json!(["Opony"]));
    assert_eq!(
        body["subcategories"]["Stacja benzynowa"],
        json!(["Zwykła", "Preferowana"])
    );
}

#[tokio::test]
async fn submit_follows_a_short_link() {
    let store = Arc::new(FakeStore::default());
    let fetcher = FakeFetcher::default().redirect(SHORT_LINK, PLACE_URL);
    let app = router(store.clone(), fetcher, FakeGeocoder::default());

    let response = app
        .oneshot(json_request("POST", "/api/submit", submission(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["id"], "recNew1");
    assert_eq!(body["coordinates"], json!({ "lat": 52.2297, "lng": 21.0122 }));
    assert_eq!(body["debug"]["final_url"], PLACE_URL);

    let created = store.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Orlen Modlińska");
}

#[tokio::test]
async fn submit_accepts_coordinates_as_strings() {
    let store = Arc::new(FakeStore::default());
    let app = router(store.clone(), FakeFetcher::default(), FakeGeocoder::default());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/submit",
            submission(json!({ "link": "", "lat": "50.06", "lng": 19.94 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["coordinates"], json!({ "lat": 50.06, "lng": 19.94 }));
    assert!(body.get("debug").is_none());
}

#[tokio::test]
async fn submit_geocodes_plain_addresses() {
    let store = Arc::new(FakeStore::default());
    let geocoder = FakeGeocoder::default().knowing("Rynek Główny, Kraków", 50.0617, 19.9373);
    let app = router(store, FakeFetcher::default(), geocoder);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/submit",
            submission(json!({ "link": "Rynek Główny, Kraków" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["coordinates"]["lat"], 50.0617);
}

#[tokio::test]
async fn submit_rejects_missing_name_without_storing() {
    let store = Arc::new(FakeStore::default());
    let app = router(store.clone(), FakeFetcher::default(), FakeGeocoder::default());

    let response = app
        .oneshot(json_request("POST", "/api/submit", submission(json!({ "name": "  " }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "Missing name");
    assert!(store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn submit_rejects_unknown_category() {
    let app = router(
        Arc::new(FakeStore::default()),
        FakeFetcher::default(),
        FakeGeocoder::default(),
    );

    let response = app
        .oneshot(json_request("POST", "/api/submit", submission(json!({ "category": "Kemping" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid category: Kemping");
}

#[tokio::test]
async fn unresolvable_link_reports_the_visited_chain() {
    let store = Arc::new(FakeStore::default());
    let fetcher = FakeFetcher::default()
        .redirect(SHORT_LINK, "https://consent.google.com/ml")
        .html("https://consent.google.com/ml", "<html><body>Before you continue</body></html>");
    let app = router(store.clone(), fetcher, FakeGeocoder::default());

    let response = app
        .oneshot(json_request("POST", "/api/submit", submission(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("Share"));
    assert_eq!(body["debug"]["visited"][0], SHORT_LINK);
    assert!(store.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn form_submission_redirects_back_to_the_form() {
    let store = Arc::new(FakeStore::default());
    let app = router(store, FakeFetcher::default(), FakeGeocoder::default());

    let ok = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("name=Parking+P1&category=Parking&lat=52.1&lng=21.1"))
        .unwrap();
    let response = app.clone().oneshot(ok).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/form?ok=1");

    let missing = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("category=Parking&lat=52.1&lng=21.1"))
        .unwrap();
    let response = app.oneshot(missing).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/form?err=Missing+name");
}

#[tokio::test]
async fn notes_can_be_added_and_deleted() {
    let store = Arc::new(FakeStore::default().with_point("rec1", "Parking", ""));
    let app = router(store.clone(), FakeFetcher::default(), FakeGeocoder::default());

    for text in ["first", "second"] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/points/rec1/notes", json!({ "text": text })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(store.notes_blob("rec1").as_deref(), Some("second\n---\nfirst"));

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/points/rec1/notes/0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["notes"], json!(["first"]));

    let response = app
        .oneshot(empty_request("GET", "/api/points/rec1/notes"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["notes"], json!(["first"]));
}

#[tokio::test]
async fn bad_note_requests_are_client_errors() {
    let store = Arc::new(FakeStore::default().with_point("rec1", "Parking", ""));
    let app = router(store.clone(), FakeFetcher::default(), FakeGeocoder::default());

    let empty = app
        .clone()
        .oneshot(json_request("POST", "/api/points/rec1/notes", json!({ "text": "   " })))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let out_of_range = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/points/rec1/notes/3"))
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let not_a_number = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/points/rec1/notes/last"))
        .await
        .unwrap();
    assert_eq!(not_a_number.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .oneshot(empty_request("GET", "/api/points/recMissing/notes"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.notes_blob("rec1").as_deref(), Some(""));
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = router(
        Arc::new(FakeStore::default()),
        FakeFetcher::default(),
        FakeGeocoder::default(),
    );
    let huge = "x".repeat(400 * 1024);

    let response = app
        .oneshot(json_request("POST", "/api/submit", submission(json!({ "note": huge }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_answers_ok() {
    let app = router(
        Arc::new(FakeStore::default()),
        FakeFetcher::default(),
        FakeGeocoder::default(),
    );

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));
}

#[tokio::test]
async fn static_pages_are_served_uncached() {
    let public = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../public");
    let app = api_lib::web::static_routes(&public);

    let index = app.clone().oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    assert_eq!(index.headers()["cache-control"], "no-store");

    let form = app.clone().oneshot(empty_request("GET", "/form")).await.unwrap();
    assert_eq!(form.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(form.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("action=\"/submit\""));

    for script in ["/map.js", "/form.js", "/style.css"] {
        let res = app.clone().oneshot(empty_request("GET", script)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{script}");
        assert_eq!(res.headers()["cache-control"], "no-store");
    }

    let map = app.clone().oneshot(empty_request("GET", "/map.js")).await.unwrap();
    let bytes = axum::body::to_bytes(map.into_body(), usize::MAX).await.unwrap();
    let map = String::from_utf8_lossy(&bytes);
    assert!(map.contains("/api/points?max=5000"));
    assert!(map.contains("/notes"));

    let missing = app.oneshot(empty_request("GET", "/nope.css")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreadable_bodies_get_the_json_error_shape() {
    let app = router(
        Arc::new(FakeStore::default().with_point("rec1", "Parking", "")),
        FakeFetcher::default(),
        FakeGeocoder::default(),
    );

    let broken = Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(broken).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let untyped = Request::builder()
        .method("POST")
        .uri("/api/points/rec1/notes")
        .body(Body::from("{\"text\": \"hi\"}"))
        .unwrap();
    let response = app.oneshot(untyped).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["ok"], false);
}

#[tokio::test]
async fn unreadable_form_redirects_with_an_error() {
    let app = router(
        Arc::new(FakeStore::default()),
        FakeFetcher::default(),
        FakeGeocoder::default(),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/submit")
        .header("content-type", "text/plain")
        .body(Body::from("name=x"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[LOCATION].to_str().unwrap();
    assert!(location.starts_with("/form?err="), "{location}");
    assert!(location.len() > "/form?err=".len());
}
