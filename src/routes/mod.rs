pub mod auth;
pub mod health;
pub mod users;

use crate::auth::{AuthMiddleware, RequireRole};
use actix_web::web;

/// Wires the `/api` service tree.
///
/// Guards are composed per scope rather than globally: the outer wrap runs
/// first, so admin scopes authenticate and then check the role.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::google_auth_url)
            .service(auth::google_callback)
            .service(auth::complete_google_signup)
            .service(web::scope("/me").wrap(AuthMiddleware).service(auth::me)),
    )
    .service(
        web::scope("/users")
            .wrap(RequireRole::admin())
            .wrap(AuthMiddleware)
            .service(users::list_users)
            .service(users::update_user),
    );
}
