use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::Principal;
use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::models::user::Role;
use crate::store::UserStore;

/// Authenticates a request: verifies the bearer token and resolves its subject
/// to a live account, exposing a [`Principal`] to downstream handlers.
///
/// A missing or invalid token, and a token whose account no longer exists,
/// all fail with 401. Wrap this around any scope that requires a signed-in
/// user; compose [`RequireRole`] on top for role-gated scopes.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    // Rc so the service can be moved into the response future; the account
    // lookup has to await before the inner call.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned)
                .ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;

            let tokens = req
                .app_data::<web::Data<TokenService>>()
                .ok_or_else(|| AppError::Internal("Token service is not configured".to_string()))?;
            let claims = tokens.verify(&token)?;

            let store = req
                .app_data::<web::Data<dyn UserStore>>()
                .ok_or_else(|| AppError::Internal("User store is not configured".to_string()))?;
            let user = store
                .find_by_id(claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

            req.extensions_mut().insert(Principal {
                id: user.id,
                role: user.role,
                email: user.email.clone(),
                name: user.name.clone(),
            });

            service.call(req).await
        })
    }
}

/// Role gate composed over [`AuthMiddleware`]: rejects authenticated
/// principals whose role does not equal the required one.
///
/// The check is plain equality; there is no role hierarchy beyond the two
/// tiers.
pub struct RequireRole(Role);

impl RequireRole {
    pub fn admin() -> Self {
        RequireRole(Role::Admin)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            role: self.0,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    role: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();

        match principal {
            Some(principal) if principal.role == self.role => {
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Some(_) => Box::pin(async move {
                Err(AppError::Forbidden("Admin access required".to_string()).into())
            }),
            None => Box::pin(async move {
                // RequireRole without AuthMiddleware in front of it
                Err(AppError::Unauthorized("Missing token".to_string()).into())
            }),
        }
    }
}
