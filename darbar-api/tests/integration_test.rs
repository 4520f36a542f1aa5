use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use darbar_api::{app, AppState, Services};
use darbar_core::session::Role;
use darbar_store::app_config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "Secret123";

fn test_state() -> AppState {
    let config = Config::for_tests();
    let services = Services::in_memory(&config);
    AppState::new(&config, services)
}

async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_raw(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_form(router: &Router, uri: &str, token: &str, fields: &[(&str, &str)], image: Option<&str>) -> (StatusCode, Value) {
    let boundary = "darbar-test-boundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some(file_name) = image {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn registration(email: &str) -> Value {
    json!({
        "firstName": "Asha",
        "lastName": "Patel",
        "email": email,
        "password": PASSWORD,
        "phoneNumber": "0412345678",
        "address": "12 Curry Lane, Sydney"
    })
}

/// Register a customer; returns (uid, access token).
async fn register(router: &Router, email: &str) -> (String, String) {
    let (status, body) = send(router, Method::POST, "/register", None, Some(registration(email))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["data"]["user"]["userId"].as_str().unwrap().to_string(),
        body["data"]["accessToken"].as_str().unwrap().to_string(),
    )
}

async fn login(router: &Router, email: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

/// Register, promote to admin, and sign in again for a token carrying the role.
async fn admin(state: &AppState, router: &Router) -> String {
    let email = "owner@darbar.test";
    let (uid, _) = register(router, email).await;
    let mut profile = state.users.get(&uid).await.unwrap().unwrap();
    profile.role = Role::Admin;
    state.users.save(&uid, &profile).await.unwrap();
    login(router, email).await
}

#[tokio::test]
async fn test_health() {
    let router = app(test_state());
    let (status, body) = send(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_login() {
    let router = app(test_state());
    let (uid, _) = register(&router, "asha@darbar.test").await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "asha@darbar.test", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["data"]["user"]["userId"], uid.as_str());
    assert_eq!(body["data"]["user"]["role"], "user");
    assert_eq!(body["data"]["user"]["goldMember"], false);
    assert!(body["data"]["refreshToken"].is_string());

    let (status, body) = send(&router, Method::POST, "/register", None, Some(registration("asha@darbar.test"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_reports_invalid_fields() {
    let router = app(test_state());
    let (status, body) = send(
        &router,
        Method::POST,
        "/register",
        None,
        Some(json!({ "firstName": "A", "email": "nope", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let router = app(test_state());
    register(&router, "asha@darbar.test").await;
    let (status, _) = send(
        &router,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "asha@darbar.test", "password": "Wrong1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token() {
    let router = app(test_state());
    let (status, body) = send(&router, Method::POST, "/register", None, Some(registration("asha@darbar.test"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let (status, body) = send(&router, Method::POST, "/refresh-token", None, Some(json!({ "refreshToken": refresh }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());

    // An access token is not a refresh token
    let (status, _) = send(&router, Method::POST, "/refresh-token", None, Some(json!({ "refreshToken": access }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_need_token_and_role() {
    let router = app(test_state());
    let (status, body) = send(&router, Method::GET, "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorCode"], "AUTHENTICATION_ERROR");

    let (status, _) = send(&router, Method::GET, "/cart", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, token) = register(&router, "asha@darbar.test").await;
    let (status, _) = send(&router, Method::GET, "/getUsers", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_users_profiles_are_hidden() {
    let router = app(test_state());
    let (asha, asha_token) = register(&router, "asha@darbar.test").await;
    let (ravi, _) = register(&router, "ravi@darbar.test").await;

    let (status, body) = send(&router, Method::GET, &format!("/user/{}", asha), Some(&asha_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "asha@darbar.test");

    let (status, _) = send(&router, Method::GET, &format!("/user/{}", ravi), Some(&asha_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gold_pricing_for_members() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;

    let (status, body) = send_form(
        &router,
        "/dishes",
        &admin,
        &[("dishData", r#"{"category":"Mains","name":"Korma","price":20}"#)],
        Some("korma.png"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["image"].as_str().unwrap().contains("/dishes/"));

    let (status, body) = send(&router, Method::POST, "/goldPrice", Some(&admin), Some(json!({ "goldPrice": 80 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["dishesUpdated"], 1);

    let (uid, _) = register(&router, "asha@darbar.test").await;
    let (status, _) = send(
        &router,
        Method::PUT,
        &format!("/user/goldMember/{}", uid),
        Some(&admin),
        Some(json!({ "goldMember": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let member = login(&router, "asha@darbar.test").await;

    let (_, body) = send(&router, Method::GET, "/dishes/category/Mains", None, None).await;
    assert_eq!(body["data"][0]["price"], 20.0);

    let (_, body) = send(&router, Method::GET, "/dishes/category/Mains", Some(&member), None).await;
    assert_eq!(body["data"][0]["price"], 16.0);
    assert!(body["data"][0].get("goldPrice").is_none());
}

#[tokio::test]
async fn test_cart_merges_same_dish() {
    let router = app(test_state());
    let (_, token) = register(&router, "asha@darbar.test").await;
    let item = json!({ "dishId": "d1", "name": "Korma", "price": 20, "quantity": 1 });

    let (status, first) = send(&router, Method::POST, "/cart", Some(&token), Some(item.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = send(&router, Method::POST, "/cart", Some(&token), Some(item)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["cartItemId"], second["data"]["cartItemId"]);

    let (_, body) = send(&router, Method::GET, "/cart", Some(&token), None).await;
    let lines = body["data"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 2);
}

#[tokio::test]
async fn test_order_accrues_rewards_and_clears_cart() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;
    let (uid, token) = register(&router, "asha@darbar.test").await;

    send(
        &router,
        Method::POST,
        "/cart",
        Some(&token),
        Some(json!({ "dishId": "d1", "name": "Korma", "price": 25, "quantity": 2 })),
    )
    .await;
    let order = json!({
        "items": [{ "dishId": "d1", "name": "Korma", "price": 25, "quantity": 2 }],
        "totalPrice": 50
    });

    // No ledger yet: nothing is written
    let (status, _) = send(&router, Method::POST, "/orders", Some(&token), Some(order.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(state.orders.count().await.unwrap(), 0);

    let (status, _) = send(&router, Method::POST, "/rewards", Some(&admin), Some(json!({ "reward": 1, "dollar": 10 }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&router, Method::POST, "/orders", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["rewardsEarned"], 5);
    assert_eq!(body["data"]["newRewardValue"], 5);
    assert_eq!(body["data"]["orderData"]["orderStatus"], "PENDING");
    let order_id = body["data"]["orderId"].as_str().unwrap().to_string();

    let (_, body) = send(&router, Method::GET, "/cart", Some(&token), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(state.users.get(&uid).await.unwrap().unwrap().rewards, 5);

    let (_, body) = send(&router, Method::GET, "/ordersByUser", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &router,
        Method::PATCH,
        &format!("/ordersAdmin/{}", order_id),
        Some(&admin),
        Some(json!({ "orderStatus": "CONFIRMED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderStatus"], "CONFIRMED");

    let (status, _) = send(
        &router,
        Method::PATCH,
        &format!("/orders/{}", order_id),
        Some(&token),
        Some(json!({ "orderStatus": "DELIVERED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &router,
        Method::PATCH,
        &format!("/orders/{}", order_id),
        Some(&token),
        Some(json!({ "orderStatus": "CANCELLED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderStatus"], "CANCELLED");

    let (_, body) = send(&router, Method::GET, "/orders-total-count", Some(&admin), None).await;
    assert_eq!(body["data"]["totalOrders"], 1);
}

#[tokio::test]
async fn test_apply_reward() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;
    let (uid, token) = register(&router, "asha@darbar.test").await;
    send(&router, Method::POST, "/rewards", Some(&admin), Some(json!({ "reward": 1, "dollar": 2 }))).await;
    state.users.set_rewards(&uid, 30).await.unwrap();

    let (status, _) = send(&router, Method::POST, "/apply-reward", Some(&token), Some(json!({ "reward": 12, "dollar": 50 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, Method::POST, "/apply-reward", Some(&token), Some(json!({ "reward": 30, "dollar": 50 }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["totalPrice"], 30.0);
    assert_eq!(body["data"]["reward"], 20);

    state.users.set_rewards(&uid, 4).await.unwrap();
    let (status, _) = send(&router, Method::POST, "/apply-reward", Some(&token), Some(json!({ "reward": 4, "dollar": 50 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_promo_lifecycle() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;

    let (status, _) = send(&router, Method::GET, "/get-all-promos", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let promo = json!({ "code": "FEAST20", "discount": 20, "expirationDate": "2999-01-01T00:00:00Z" });
    let (status, body) = send(&router, Method::POST, "/create-promo", Some(&admin), Some(promo.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let (status, _) = send(&router, Method::POST, "/create-promo", Some(&admin), Some(promo)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, Method::POST, "/validate-promo", None, Some(json!({ "promoCode": "FEAST20" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["finalDiscount"], 0.2);

    let (status, body) = send(&router, Method::POST, "/validate-promo", None, Some(json!({ "promoCode": "NOPE" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (_, body) = send(&router, Method::GET, "/get-all-promos", Some(&admin), None).await;
    assert_eq!(body["data"][0]["discount"], 20.0);
}

#[tokio::test]
async fn test_payment_intent_hidden_from_other_users() {
    let router = app(test_state());
    let (_, asha) = register(&router, "asha@darbar.test").await;
    let (_, ravi) = register(&router, "ravi@darbar.test").await;

    let (status, body) = send(&router, Method::POST, "/create-payment-intent", Some(&asha), Some(json!({ "amount": 2599 }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["currency"], "usd");
    let intent = body["data"]["paymentIntentId"].as_str().unwrap().to_string();

    let (status, _) = send(&router, Method::GET, &format!("/payment/{}", intent), Some(&asha), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, Method::GET, &format!("/payment/{}", intent), Some(&ravi), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::POST, "/create-payment-intent", Some(&asha), Some(json!({ "amount": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_json_answers_with_error_envelope() {
    let router = app(test_state());

    let (status, body) = send_raw(&router, "/login", "{\"email\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["errorCode"], "VALIDATION_ERROR");
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&router, Method::POST, "/validate-promo", None, Some(json!({ "promoCode": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCode"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_logout_without_body() {
    let router = app(test_state());
    let (_, token) = register(&router, "asha@darbar.test").await;

    let (status, body) = send(&router, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);

    let (status, _) = send(&router, Method::POST, "/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_raw(&router, "/logout", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorCode"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_payment_ids_rejected() {
    let router = app(test_state());
    let (_, asha) = register(&router, "asha@darbar.test").await;

    for uri in ["/payment/bad-id", "/payment/pi_abc%2F..%2Fcustomers", "/payment/pi_abc%3Fexpand%3Dx"] {
        let (status, body) = send(&router, Method::GET, uri, Some(&asha), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["errorCode"], "VALIDATION_ERROR");
    }

    let (status, _) = send(&router, Method::POST, "/confirm-payment", Some(&asha), Some(json!({ "paymentIntentId": "cus_123" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&router, Method::GET, "/payment/pi_unknown", Some(&asha), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_breaker_ignores_client_errors() {
    let router = app(test_state());
    let (_, asha) = register(&router, "asha@darbar.test").await;
    let (_, ravi) = register(&router, "ravi@darbar.test").await;

    for _ in 0..10 {
        let (status, _) = send(
            &router,
            Method::POST,
            "/create-payment-intent",
            Some(&asha),
            Some(json!({ "amount": 2599, "currency": "dollars" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&router, Method::GET, "/payment/pi_unknown", Some(&asha), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, body) = send(&router, Method::POST, "/create-payment-intent", Some(&ravi), Some(json!({ "amount": 2599 }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_payment_breaker_opens_on_outage() {
    let router = app(test_state());
    let (_, asha) = register(&router, "asha@darbar.test").await;
    let outage = json!({ "amount": darbar_order::MockPaymentGateway::FAILING_AMOUNT });

    for _ in 0..5 {
        let (status, _) = send(&router, Method::POST, "/create-payment-intent", Some(&asha), Some(outage.clone())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    let (status, body) = send(&router, Method::POST, "/create-payment-intent", Some(&asha), Some(json!({ "amount": 2599 }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errorCode"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_send_notification() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;
    let message = json!({ "title": "Diwali", "body": "20% off tonight" });

    let (status, _) = send(&router, Method::POST, "/send-notification", Some(&admin), Some(message.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::POST, "/store-token", None, Some(json!({ "token": "device-1" }))).await;
    assert_eq!(status, StatusCode::OK);
    send(&router, Method::POST, "/store-token", None, Some(json!({ "token": "device-1" }))).await;

    let (status, body) = send(&router, Method::POST, "/send-notification", Some(&admin), Some(message)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["delivered"], 1);

    let (_, body) = send(&router, Method::GET, "/notifications", None, None).await;
    assert_eq!(body["data"][0]["title"], "Diwali");
}

#[tokio::test]
async fn test_mini_game_limit() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;

    for i in 0..6 {
        let (status, _) = send(
            &router,
            Method::POST,
            "/miniGames",
            Some(&admin),
            Some(json!({ "name": format!("Spin {}", i), "value": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(&router, Method::POST, "/miniGames", Some(&admin), Some(json!({ "name": "Spin 7", "value": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&router, Method::GET, "/miniGames", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_locations_crud() {
    let state = test_state();
    let router = app(state.clone());
    let admin = admin(&state, &router).await;

    let (status, body) = send_form(
        &router,
        "/locations",
        &admin,
        &[("name", "Darbar Parramatta"), ("address", "1 Church St, Parramatta")],
        Some("front.png"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (_, body) = send(&router, Method::GET, "/locations", None, None).await;
    let locations = body["data"].as_array().unwrap();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0]["name"], "Darbar Parramatta");
}
