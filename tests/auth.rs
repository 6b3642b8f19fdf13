mod common;

use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use common::MemoryUserStore;
use learntrack::auth::{AuthResponse, Claims, TokenService};
use learntrack::models::user::{Provider, Role, User};
use learntrack::routes;
use learntrack::store::UserStore;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let store = Arc::new(MemoryUserStore::new());
    let tokens = TokenService::new(common::TEST_SECRET);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(tokens.clone()))
            .wrap(Logger::default())
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // Register a new user
    let register_payload = json!({
        "name": "Integration User",
        "email": "integration@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );

    let register_response: AuthResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse register response JSON");
    assert_eq!(register_response.user.email, "integration@example.com");
    assert_eq!(register_response.user.role, Role::User);
    assert_eq!(register_response.user.provider, Provider::Local);

    // The issued token resolves back to the same account and role
    let claims = tokens.verify(&register_response.token).unwrap();
    assert_eq!(claims.sub, register_response.user.id);
    assert_eq!(claims.role, Role::User);

    // Try to register the same user again (should fail, count unchanged)
    let req_conflict = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(
        resp_conflict.status(),
        actix_web::http::StatusCode::BAD_REQUEST,
        "Duplicate registration did not fail as expected"
    );
    assert_eq!(store.count(), 1);

    // Login with the registered user; email lookup is case-insensitive
    let login_payload = json!({
        "email": "Integration@Example.com",
        "password": "Password123!"
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
        serde_json::from_slice(&body_bytes_login).expect("Failed to parse login response JSON");
    assert!(!login_response.token.is_empty());
    assert_eq!(login_response.user.id, register_response.user.id);

    let claims = tokens.verify(&login_response.token).unwrap();
    assert_eq!(claims.sub, register_response.user.id);

    // Use the token to fetch the profile
    let req_me = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", login_response.token)))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), actix_web::http::StatusCode::OK);

    let me_body: serde_json::Value = test::read_body_json(resp_me).await;
    assert_eq!(
        me_body["user"]["email"].as_str(),
        Some("integration@example.com")
    );
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let store = Arc::new(MemoryUserStore::new());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(TokenService::new(common::TEST_SECRET)))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    let test_cases = vec![
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            "missing name",
        ),
        (
            json!({ "name": "Test User", "password": "Password123!" }),
            "missing email",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com" }),
            "missing password",
        ),
        (
            json!({ "name": "", "email": "test@example.com", "password": "Password123!" }),
            "empty name",
        ),
        (
            json!({ "name": "Test User", "email": "invalid-email", "password": "Password123!" }),
            "invalid email format",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com", "password": "123" }),
            "password too short",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::BAD_REQUEST,
            "Test case failed: {}",
            description
        );
    }

    assert_eq!(store.count(), 0);
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let store = Arc::new(MemoryUserStore::new());
    store
        .insert(User::new_local("Login Test", "login_test@example.com", "Password123!").unwrap())
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(TokenService::new(common::TEST_SECRET)))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // Missing fields fail deserialization
    for payload in [
        json!({ "password": "Password123!" }),
        json!({ "email": "login_test@example.com" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    // A wrong password and an unknown email are indistinguishable: same
    // status, same body
    let req_wrong_password = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "login_test@example.com", "password": "WrongPassword!" }))
        .to_request();
    let resp_wrong_password = test::call_service(&app, req_wrong_password).await;
    assert_eq!(
        resp_wrong_password.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );
    let body_wrong_password = test::read_body(resp_wrong_password).await;

    let req_unknown_email = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nonexistent@example.com", "password": "Password123!" }))
        .to_request();
    let resp_unknown_email = test::call_service(&app, req_unknown_email).await;
    assert_eq!(
        resp_unknown_email.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );
    let body_unknown_email = test::read_body(resp_unknown_email).await;

    assert_eq!(body_wrong_password, body_unknown_email);
}

#[actix_rt::test]
async fn test_login_rejected_for_oauth_only_account() {
    let store = Arc::new(MemoryUserStore::new());
    store
        .insert(User::new_google("OAuth Only", "oauth_only@example.com", "google-sub-7"))
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(TokenService::new(common::TEST_SECRET)))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // No password hash exists, so any local login attempt is bad credentials
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "oauth_only@example.com", "password": "whatever1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_password_never_present_in_responses() {
    let store = Arc::new(MemoryUserStore::new());
    let tokens = TokenService::new(common::TEST_SECRET);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(tokens.clone()))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Secret Keeper",
            "email": "secret@example.com",
            "password": "TopSecret99"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    let register_body = test::read_body(resp).await;
    let register_text = String::from_utf8_lossy(&register_body).to_lowercase();
    assert!(!register_text.contains("password"));
    assert!(!register_text.contains("topsecret99"));

    let register_response: AuthResponse = serde_json::from_slice(&register_body).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "secret@example.com", "password": "TopSecret99" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let login_text = String::from_utf8_lossy(&test::read_body(resp).await).to_lowercase();
    assert!(!login_text.contains("password"));

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header((
            "Authorization",
            format!("Bearer {}", register_response.token),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let me_text = String::from_utf8_lossy(&test::read_body(resp).await).to_lowercase();
    assert!(!me_text.contains("password"));
}

#[actix_rt::test]
async fn test_profile_requires_valid_token() {
    let store = Arc::new(MemoryUserStore::new());
    let tokens = TokenService::new(common::TEST_SECRET);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(tokens.clone()))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // Missing token
    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Garbage token
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

    // Well-formed token whose account does not exist in the store
    let ghost = User::new_local("Ghost", "ghost@example.com", "Password123!").unwrap();
    let ghost_token = tokens.issue(&ghost).unwrap();
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", ghost_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_expired_token_rejected() {
    let store = Arc::new(MemoryUserStore::new());
    let user = store
        .insert(User::new_local("Expired", "expired@example.com", "Password123!").unwrap())
        .await
        .unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(store.clone() as Arc<dyn UserStore>))
            .app_data(web::Data::new(TokenService::new(common::TEST_SECRET)))
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;

    // Craft a token that expired two hours ago, signed with the right secret
    let expired_at = chrono::Utc::now()
        .checked_sub_signed(chrono::Duration::hours(2))
        .unwrap();
    let claims = Claims {
        sub: user.id,
        role: user.role,
        iat: (expired_at.timestamp() - 60) as usize,
        exp: expired_at.timestamp() as usize,
    };
    let expired_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(common::TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .append_header(("Authorization", format!("Bearer {}", expired_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}
