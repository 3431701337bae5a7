//! Stage ordering observed from the outside.

use super::*;
use crate::config::ContextFailurePolicy;
use axum::http::StatusCode;

#[tokio::test]
async fn static_files_skip_the_dynamic_chain() {
    let (app, state) = test_app().await;
    // Any request reaching the context stage would now be redirected
    break_categories(&state).await;

    let response = app.oneshot(get("/css/style.css")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response).await.contains("body"));
}

#[tokio::test]
async fn context_failure_redirects_home() {
    let (app, state) = test_app().await;
    break_categories(&state).await;

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn context_failure_can_propagate_instead() {
    let mut config = test_config();
    config.context_failure_policy = ContextFailurePolicy::Propagate;
    let (app, state) = test_app_with(config, routes::mount_table()).await;
    break_categories(&state).await;

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Database error"));
}

#[tokio::test]
async fn post_requests_pass_the_static_stage() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(post_form("/user/signin", "username=nobody&password=nothing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/user/signin"));
}

#[tokio::test]
async fn prefixed_paths_reach_their_group() {
    let (app, _) = test_app().await;

    let response = app.oneshot(get("/products/backpacks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Trail Pack"));
    assert!(html.contains("City Pack"));
    assert!(!html.contains("Leather Briefcase"));
}

#[tokio::test]
async fn pages_carry_breadcrumbs_and_categories() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(get("/products/backpacks/p-trail-pack"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    // Intermediate crumbs are links, the last one is plain text
    assert!(html.contains(r#"class="crumb">Products</a>"#));
    assert!(html.contains(r#"class="crumb">Backpacks</a>"#));
    assert!(html.contains(r#"<a href="&#x2f;products&#x2f;backpacks" class="crumb">"#));
    assert!(html.contains(r#"class="crumb-current">P-trail-pack</span>"#));
    // Categories in title order
    let backpacks = html.find("/products/backpacks").unwrap();
    let travel = html.find("/products/travel").unwrap();
    assert!(backpacks < travel);
    assert!(html.contains("$59.00"));
}

#[tokio::test]
async fn home_page_lists_latest_products() {
    let (app, _) = test_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    let newest = html.find("Carry-on Roller").unwrap();
    let oldest = html.find("Trail Pack").unwrap();
    assert!(newest < oldest);
}

#[tokio::test]
async fn health_check_is_json() {
    let (app, _) = test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let mut config = test_config();
    config.max_body_bytes = 64;
    let (app, _) = test_app_with(config, routes::mount_table()).await;

    let form = format!("username={}&password=x", "a".repeat(200));
    let mut request = post_form("/user/signin", &form);
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, form.len().to_string().parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn anonymous_page_views_do_not_create_sessions() {
    let (app, _) = test_app().await;

    let response = app.oneshot(get("/products")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}
