use crate::{
    auth::{
        reconcile, AuthResponse, CompleteSignupRequest, IdentityProvider, LoginRequest, Principal,
        Reconciled, RegisterRequest, TokenService,
    },
    config::Config,
    error::AppError,
    models::user::{normalize_email, User},
    store::UserStore,
};
use actix_web::{get, http::header, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Register a new account
///
/// Creates a local account and returns a session token.
#[post("/register")]
pub async fn register(
    store: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    let email = normalize_email(&register_data.email);

    // Check if email already exists
    if store.find_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("User already exists".into()));
    }

    let user = User::new_local(&register_data.name, &email, &register_data.password)?;
    let user = match store.insert(user).await {
        // A racing registration slipped in between the check and the insert
        Err(AppError::Conflict(_)) => {
            return Err(AppError::Validation("User already exists".into()))
        }
        other => other?,
    };

    let token = tokens.issue(&user)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

/// Login
///
/// Authenticates a local account and returns a session token. Unknown emails
/// and wrong passwords produce the same response, so callers cannot probe for
/// registered addresses.
#[post("/login")]
pub async fn login(
    store: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    let email = normalize_email(&login_data.email);

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !user.verify_password(&login_data.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = tokens.issue(&user)?;

    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

/// Current account profile
///
/// Returns the account resolved from the bearer token.
#[get("")]
pub async fn me(
    store: web::Data<dyn UserStore>,
    principal: Principal,
) -> Result<impl Responder, AppError> {
    let user = store
        .find_by_id(principal.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

/// Google consent URL
///
/// Returns the URL the front end should redirect to for Google sign-in.
#[get("/google/url")]
pub async fn google_auth_url(
    provider: web::Data<dyn IdentityProvider>,
) -> Result<impl Responder, AppError> {
    let url = provider.authorize_url()?;
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
}

/// Google OAuth callback
///
/// Exchanges the authorization code and reconciles the Google identity
/// against the account store. A resolved sign-in redirects back to the
/// front end with token and profile query parameters; in explicit-confirm
/// mode an unseen identity returns a pending descriptor as JSON instead,
/// and no account is created until the completion request arrives.
#[get("/google/callback")]
pub async fn google_callback(
    store: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    provider: web::Data<dyn IdentityProvider>,
    config: web::Data<Config>,
    query: web::Query<GoogleCallbackQuery>,
) -> Result<impl Responder, AppError> {
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("Missing Google authorization code".into()))?;

    let profile = provider.exchange_code(code).await?;

    match reconcile::resolve_google_profile(store.get_ref(), &profile, config.signup_mode).await? {
        Reconciled::SignedIn(user) => {
            let token = tokens.issue(&user)?;
            let location = frontend_redirect(&config.frontend_url, &token, &user)?;
            Ok(HttpResponse::Found()
                .append_header((header::LOCATION, location))
                .finish())
        }
        Reconciled::Pending(pending) => Ok(HttpResponse::Ok().json(pending)),
    }
}

/// Complete a staged Google signup
///
/// Materializes the account described by a pending descriptor and returns a
/// session token. Safe to repeat: a second submission links to the account
/// created by the first.
#[post("/google/complete")]
pub async fn complete_google_signup(
    store: web::Data<dyn UserStore>,
    tokens: web::Data<TokenService>,
    signup_data: web::Json<CompleteSignupRequest>,
) -> Result<impl Responder, AppError> {
    signup_data.validate()?;

    let user = reconcile::complete_google_signup(store.get_ref(), &signup_data).await?;
    let token = tokens.issue(&user)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

// The issued token and a minimal profile ride back to the front end as query
// parameters on the configured origin.
fn frontend_redirect(frontend_url: &str, token: &str, user: &User) -> Result<String, AppError> {
    let base = frontend_url.split(',').next().unwrap_or(frontend_url).trim();
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| AppError::Internal(format!("Invalid frontend URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("email", &user.email)
        .append_pair("name", &user.name);
    Ok(url.to_string())
}
