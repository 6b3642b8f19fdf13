use std::env;

use crate::auth::reconcile::SignupMode;
use crate::bootstrap::DEFAULT_ADMIN_PASSWORD;

/// OAuth client settings for Google sign-in. Absent when the deployment does
/// not enable Google.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Signing key for session tokens; rotating it invalidates all
    /// outstanding sessions.
    pub jwt_secret: String,
    /// Comma-separated list of allowed front-end origins; the first one is
    /// the redirect target after a Google sign-in.
    pub frontend_url: String,
    pub admin_password: String,
    pub signup_mode: SignupMode,
    pub google: Option<GoogleConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            signup_mode: match env::var("GOOGLE_SIGNUP_MODE").as_deref() {
                Ok("explicit-confirm") => SignupMode::ExplicitConfirm,
                _ => SignupMode::AutoCreate,
            },
            google: Self::google_from_env(),
        }
    }

    // Google sign-in is enabled only when the full client trio is present.
    fn google_from_env() -> Option<GoogleConfig> {
        match (
            env::var("GOOGLE_CLIENT_ID"),
            env::var("GOOGLE_CLIENT_SECRET"),
            env::var("GOOGLE_REDIRECT_URI"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
