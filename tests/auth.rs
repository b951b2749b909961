use actix_web::middleware::Logger;
use actix_web::{http::StatusCode, test, web, App};
use serde_json::json;
use tasktrail::auth::{AuthResponse, RegisterResponse};
use tasktrail::{routes, AppState};

const SECRET: &str = "integration-auth-secret";

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(SECRET, 3600, 4))
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let app = test::init_service(
        App::new()
            .app_data(state())
            .wrap(Logger::default())
            .configure(routes::app_config),
    )
    .await;

    let credentials = json!({ "username": "alice", "password": "pw1-secret" });

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body)
    );
    let registered: RegisterResponse = serde_json::from_slice(&body).unwrap();

    // Registering does not hand out a token.
    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(raw.get("access_token").is_none());

    // Same username again: conflict, whatever the password.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "alice", "password": "another-pw" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&credentials)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: AuthResponse = test::read_body_json(resp).await;
    assert!(!login.access_token.is_empty());

    // The token is accepted on a protected route and maps back to the registered user.
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(("Authorization", format!("Bearer {}", login.access_token)))
        .set_json(json!({ "title": "first", "description": "task" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(task["owner_id"], registered.user_id.to_string());
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::app_config)).await;

    let test_cases = vec![
        // Deserialization errors
        (
            json!({ "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing username",
        ),
        (
            json!({ "username": "testuser" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        // Validation errors
        (
            json!({ "username": "u", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username too short",
        ),
        (
            json!({ "username": "a".repeat(33), "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username too long",
        ),
        (
            json!({ "username": "user name!", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "username with invalid chars",
        ),
        (
            json!({ "username": "testuser", "password": "123" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_login_failures_look_the_same() {
    let state = state();
    state
        .identity
        .sign_up("login_test_user", "Password123!")
        .await
        .unwrap();
    let app = test::init_service(App::new().app_data(state).configure(routes::app_config)).await;

    let mut bodies = Vec::new();
    for payload in [
        json!({ "username": "login_test_user", "password": "WrongPassword123!" }),
        json!({ "username": "nonexistent", "password": "Password123!" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        bodies.push(test::read_body(resp).await);
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[actix_rt::test]
async fn test_username_is_case_sensitive() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::app_config)).await;

    for username in ["Alice", "alice"] {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "username": username, "password": "pw1-secret" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "{}", username);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "ALICE", "password": "pw1-secret" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_password_limit_is_in_bytes() {
    let app = test::init_service(App::new().app_data(state()).configure(routes::app_config)).await;

    // 72 characters but 108 bytes: bcrypt would only see the shared prefix.
    let registered = format!("{}{}", "é".repeat(36), "a".repeat(36));
    let impostor = format!("{}{}", "é".repeat(36), "b".repeat(36));

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "alice", "password": registered }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Exactly 72 bytes is accepted, and one byte more never logs in.
    let exact = "é".repeat(36);
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "alice", "password": exact }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for password in [format!("{}b", exact), impostor] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "alice", "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_ne!(resp.status(), StatusCode::OK);
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
