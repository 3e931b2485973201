#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use fulfillment_board::app::{AppState, router};
use fulfillment_board::source::MemorySheetSource;
use fulfillment_board::{AppConfig, SourceError};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";

fn config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "SESSION_SECRET" => Some("test-secret-test-secret-test-secret!".to_string()),
        "DASHBOARD_PASSWORD" => Some(PASSWORD.to_string()),
        _ => None,
    })
    .unwrap()
}

fn orders_grid() -> Vec<Vec<String>> {
    [
        ["관리용상품명", "주문번호", "상품종류", "배송희망일", "수량"],
        ["Tulip Set", "2", "조합형옵션상품", "2024-01-02", "1"],
        ["Tulip Set", "1", "조합형옵션상품", "2024-01-01", "2"],
        ["Tulip Set", "1", "추가구성상품", "", "3"],
        ["Rose Box", "5", "조합형옵션상품", "2024-01-02", "1"],
    ]
    .iter()
    .map(|row| row.iter().map(|c| c.to_string()).collect())
    .collect()
}

fn app_with(source: MemorySheetSource) -> Router {
    router(AppState::new(config(), Arc::new(source)).unwrap())
}

fn app() -> Router {
    app_with(MemorySheetSource::new(orders_grid()))
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_login(app: &Router, password: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("password={}", urlencoding::encode(password))))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Log in and return the `name=value` part of the session cookie.
async fn login(app: &Router) -> String {
    let response = post_login(app, PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/orders");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("login sets a session cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn root_redirects_to_login() {
    let response = get(&app(), "/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn login_page_renders_form() {
    let response = get(&app(), "/login", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("type=\"password\""));
}

#[tokio::test]
async fn orders_require_login() {
    let response = get(&app(), "/orders", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn forged_cookie_is_rejected() {
    let response = get(&app(), "/orders", Some("session=not-signed")).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn wrong_password_redisplays_form() {
    let app = app();
    let response = post_login(&app, "guess").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_text(response).await.contains("Incorrect password."));
}

#[tokio::test]
async fn login_without_password_field_redisplays_form() {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Incorrect password."));
}

#[tokio::test]
async fn unknown_date_stays_selected_in_picker() {
    let app = app();
    let cookie = login(&app).await;

    let html = body_text(get(&app, "/orders?delivery_date=2030-12-31", Some(&cookie)).await).await;
    assert!(html.contains("0 orders"));
    assert!(html.contains("<option value=\"2030-12-31\" selected>"));
    assert!(!html.contains("<option value=\"all\" selected>"));
}

#[tokio::test]
async fn logged_in_user_sees_grouped_orders() {
    let app = app();
    let cookie = login(&app).await;

    let response = get(&app, "/orders", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("Tulip Set"));
    assert!(html.contains("Rose Box"));
    assert!(html.contains("3 orders"));
    let tulip = html.find("Tulip Set").unwrap();
    let rose = html.find("Rose Box").unwrap();
    assert!(tulip < rose, "products keep sheet order");
}

#[tokio::test]
async fn date_filter_narrows_the_board() {
    let app = app();
    let cookie = login(&app).await;

    let response = get(&app, "/orders?delivery_date=2024-01-01", Some(&cookie)).await;
    let html = body_text(response).await;

    assert!(html.contains("1 orders"));
    assert!(!html.contains("<h2>Rose Box</h2>"));
    assert!(html.contains("<option value=\"2024-01-02\">"));
    assert!(html.contains("<option value=\"2024-01-01\" selected>"));
}

#[tokio::test]
async fn all_filter_shows_everything() {
    let app = app();
    let cookie = login(&app).await;

    let html = body_text(get(&app, "/orders?delivery_date=all", Some(&cookie)).await).await;
    assert!(html.contains("3 orders"));
}

#[tokio::test]
async fn sheet_errors_render_inline() {
    let app = app_with(MemorySheetSource::failing(SourceError::DocumentNotFound(
        "스마트스토어".into(),
    )));
    let cookie = login(&app).await;

    let response = get(&app, "/orders", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("스마트스토어"));
}

#[tokio::test]
async fn logged_in_login_page_goes_to_orders() {
    let app = app();
    let cookie = login(&app).await;

    let response = get(&app, "/login", Some(&cookie)).await;
    assert_eq!(location(&response), "/orders");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    let cookie = login(&app).await;

    let response = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?notice="));

    let response = get(&app, "/orders", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");
}
