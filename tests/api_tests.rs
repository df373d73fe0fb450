// HTTP surface tests: routing, bearer auth and error mapping

mod common;

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use common::*;
use serde_json::{json, Value};
use sharehub_match::auth::{Actor, Claims};
use sharehub_match::error::{handle_json_payload_error, handle_query_payload_error};
use sharehub_match::routes::configure_routes;

fn bearer(h: &Harness, who: &Actor) -> (&'static str, String) {
    let claims = Claims {
        sub: who.user_id,
        username: who.username.clone(),
        email: who.email.clone(),
        is_staff: who.is_staff,
        is_superuser: who.is_superuser,
        exp: (Utc::now().timestamp() + 3_600) as usize,
        iss: None,
    };
    let token = h.state.tokens.sign(&claims).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.state.clone()))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn test_seeker_types_are_public() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/api/v1/seeker-types").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let tags: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tag"].as_str().unwrap())
        .collect();
    assert!(tags.contains(&"orphanage"));
    assert!(tags.contains(&"old_age_home"));
}

#[actix_web::test]
async fn test_missing_or_bad_token_is_unauthenticated() {
    let h = harness();
    let app = app!(h);

    let req = test::TestRequest::get().uri("/api/v1/donations/mine").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/donations/mine")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthenticated");
}

#[actix_web::test]
async fn test_candidates_over_http() {
    let h = harness();
    let donor = actor("asha");
    let target = verified_seeker(&h, &actor("org"), "orphanage", Some(PUNE)).await;
    verified_seeker(&h, &actor("elders"), "old_age_home", Some(north_of(PUNE, 30.0))).await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .insert_header(bearer(&h, &donor))
        .set_json(json!({
            "title": "Winter blankets",
            "category": "Clothing",
            "quantity": 25,
            "pickupAddress": "FC Road, Pune, Maharashtra",
            "pickupDeadline": (Utc::now() + chrono::Duration::days(3)).to_rfc3339(),
            "latitude": 18.52,
            "longitude": 73.85,
            "preferredSeekerTypes": ["orphanage"]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let donation_id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "available");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/donations/{}/candidates?radiusKm=50", donation_id))
        .insert_header(bearer(&h, &donor))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let candidates = body["candidates"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["seeker"]["id"].as_i64().unwrap(), target.id);
    assert_eq!(candidates[0]["matchScore"].as_f64().unwrap(), 100.0);
    assert!((candidates[1]["matchScore"].as_f64().unwrap() - 40.0).abs() < 0.1);

    // Someone else's donation
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/donations/{}/candidates", donation_id))
        .insert_header(bearer(&h, &actor("intruder")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_authorized");
}

#[actix_web::test]
async fn test_error_kinds_map_to_status_codes() {
    let h = harness();
    let donor = actor("asha");
    let unverified = seeker(&h, &actor("org"), "orphanage", Some(PUNE)).await;
    let unresolved = donation(&h, &donor, None, &[]).await;
    let located = donation(&h, &donor, Some(PUNE), &[]).await;
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/donations/{}/candidates", unresolved.id))
        .insert_header(bearer(&h, &donor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unresolved_location");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/donations/{}/matches", located.id))
        .insert_header(bearer(&h, &donor))
        .set_json(json!({ "seekerId": unverified.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "seeker_not_eligible");

    let req = test::TestRequest::get()
        .uri("/api/v1/matches/424242")
        .insert_header(bearer(&h, &donor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let h = harness();
    let donor = actor("asha");
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/donations")
        .insert_header(bearer(&h, &donor))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON"));
}

#[actix_web::test]
async fn test_match_accept_with_empty_body() {
    let h = harness();
    let donor = actor("asha");
    let org = actor("org");
    let target = verified_seeker(&h, &org, "orphanage", Some(PUNE)).await;
    let d = donation(&h, &donor, Some(PUNE), &[]).await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/donations/{}/matches", d.id))
        .insert_header(bearer(&h, &donor))
        .set_json(json!({ "seekerId": target.id, "message": "Pickup at 6pm" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let match_id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/accept", match_id))
        .insert_header(bearer(&h, &org))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "accepted");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/accept", match_id))
        .insert_header(bearer(&h, &org))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "forbidden");
}

#[actix_web::test]
async fn test_admin_routes_require_superuser() {
    let h = harness();
    let target = seeker(&h, &actor("org"), "orphanage", Some(PUNE)).await;
    let root = superuser("root");
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/profiles/seeker/{}/verify", target.id))
        .insert_header(bearer(&h, &staff("mod")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/profiles/seeker/{}/verify", target.id))
        .insert_header(bearer(&h, &root))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/profiles/bulk-reject")
        .insert_header(bearer(&h, &root))
        .set_json(json!({ "seekerIds": [target.id, 777] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["failedSeekerIds"], json!([777]));

    let req = test::TestRequest::get()
        .uri("/api/v1/help-seekers?city=Pune")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_admin_profile_listing_and_counts() {
    let h = harness();
    verified_seeker(&h, &actor("balgram"), "orphanage", Some(PUNE)).await;
    seeker(&h, &actor("snehalaya"), "old_age_home", Some(PUNE)).await;
    let root = superuser("root");
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profiles?kind=seeker&status=pending&q=sneha")
        .insert_header(bearer(&h, &root))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["donors"], json!([]));
    assert_eq!(body["seekers"].as_array().unwrap().len(), 1);
    assert_eq!(body["seekers"][0]["organizationName"], "snehalaya home");
    assert_eq!(body["counts"]["totalSeekers"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profiles/counts")
        .insert_header(bearer(&h, &root))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["verifiedSeekers"], 1);
    assert_eq!(body["pendingSeekers"], 1);
    assert_eq!(body["totalDonors"], 0);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profiles?status=bogus")
        .insert_header(bearer(&h, &root))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/profiles/counts")
        .insert_header(bearer(&h, &staff("mod")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_help_request_routes() {
    let h = harness();
    let org = actor("balgram");
    verified_seeker(&h, &org, "orphanage", Some(PUNE)).await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/help-requests")
        .insert_header(bearer(&h, &org))
        .set_json(json!({
            "category": "Food",
            "title": "Dry rations",
            "description": "Rice and lentils for a month",
            "quantityNeeded": 30
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["urgency"], "medium");
    assert_eq!(created["isActive"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/help-requests")
        .insert_header(bearer(&h, &actor("asha")))
        .set_json(json!({
            "category": "Food",
            "title": "Not a seeker",
            "description": "Should fail",
            "quantityNeeded": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/help-requests?category=food")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/help-seekers/me/dashboard")
        .insert_header(bearer(&h, &org))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["helpSeeker"]["organizationName"], "balgram home");
    assert_eq!(body["helpRequests"][0]["id"], created["id"]);
    assert_eq!(body["matches"], json!([]));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/help-requests/{}/close", created["id"].as_i64().unwrap()))
        .insert_header(bearer(&h, &org))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], false);
}
