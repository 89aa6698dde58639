use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use taskhub::auth::AuthResponse;
use taskhub::routes;
use taskhub::routes::health;

/// Connects to the test database, or returns `None` to skip the test when no
/// `DATABASE_URL` is configured.
async fn test_pool() -> Option<PgPool> {
    dotenv().ok();
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "taskhub-integration-secret");
    }
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping integration test");
        return None;
    };
    Some(
        PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test DB"),
    )
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

#[actix_rt::test]
async fn test_signup_and_login_flow() {
    let Some(pool) = test_pool().await else { return };

    let email = "integration@example.com";
    cleanup_user(&pool, email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(taskhub::auth::AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await;

    // Sign up a new user
    let signup_payload = json!({
        "name": "John",
        "email": email,
        "password": "password123"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&signup_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Signup failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );
    let signup_response: AuthResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse signup response");
    assert!(!signup_response.token.is_empty());
    assert_eq!(signup_response.user.name, "John");
    assert_eq!(signup_response.user.email, email);

    // Signing up with the same email again must conflict
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&signup_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(
        resp_conflict.status(),
        actix_web::http::StatusCode::CONFLICT,
        "Duplicate signup did not conflict"
    );

    // Login with the registered credentials
    let login_payload = json!({
        "email": email,
        "password": "password123"
    });
    let req_login = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&login_payload)
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    let status_login = resp_login.status();
    let body_bytes_login = test::read_body(resp_login).await;
    assert_eq!(
        status_login,
        actix_web::http::StatusCode::OK,
        "Login failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes_login)
    );
    let login_response: AuthResponse =
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response");
    assert!(!login_response.token.is_empty());
    assert!(login_response.expires_at > chrono::Utc::now());

    // Use the token on a protected route
    let req_me = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", login_response.token)))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), actix_web::http::StatusCode::OK);
    let me: serde_json::Value = test::read_body_json(resp_me).await;
    assert_eq!(me["name"], "John");
    assert_eq!(me["email"], email);
    assert!(me.get("password_hash").is_none());

    cleanup_user(&pool, email).await;
}

#[actix_rt::test]
async fn test_invalid_signup_inputs() {
    let Some(pool) = test_pool().await else { return };

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    let test_cases = vec![
        // Deserialization failures for missing fields
        (
            json!({ "email": "test@example.com", "password": "password123" }),
            "missing name",
        ),
        (
            json!({ "name": "John", "password": "password123" }),
            "missing email",
        ),
        (
            json!({ "name": "John", "email": "test@example.com" }),
            "missing password",
        ),
        // Validation failures
        (
            json!({ "name": "John", "email": "invalid-email", "password": "password123" }),
            "invalid email format",
        ),
        (
            json!({ "name": "", "email": "test@example.com", "password": "password123" }),
            "empty name",
        ),
        (
            json!({ "name": "a".repeat(101), "email": "test@example.com", "password": "password123" }),
            "name too long",
        ),
        (
            json!({ "name": "John", "email": "test@example.com", "password": "short" }),
            "password too short",
        ),
    ];

    // Both malformed and invalid payloads answer 400
    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/signup")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}. Got {}. Body: {:?}",
            description,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let Some(pool) = test_pool().await else { return };

    let valid_user_email = "login_test_user@example.com";
    let valid_user_password = "password123";

    cleanup_user(&pool, valid_user_email).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .wrap(Logger::default())
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // Register the user for the cases that need an existing account
    let signup_payload = json!({
        "name": "Login Tester",
        "email": valid_user_email,
        "password": valid_user_password
    });
    let reg_req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&signup_payload)
        .to_request();
    let reg_resp = test::call_service(&app, reg_req).await;
    assert!(
        reg_resp.status().is_success(),
        "Setup: failed to register test user"
    );

    let test_cases = vec![
        (
            json!({ "password": "password123" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "email": valid_user_email }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "email": "invalid-email", "password": "password123" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "invalid email format",
        ),
        (
            json!({ "email": valid_user_email, "password": "123" }),
            actix_web::http::StatusCode::BAD_REQUEST,
            "password too short",
        ),
        (
            json!({ "email": valid_user_email, "password": "WrongPassword123" }),
            actix_web::http::StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            json!({ "email": "nonexistent@example.com", "password": "password123" }),
            actix_web::http::StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Expected {}, got {}. Body: {:?}",
            description,
            expected_status,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
    }

    cleanup_user(&pool, valid_user_email).await;
}
