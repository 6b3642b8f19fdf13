use crate::{auth::UpdateUserRequest, error::AppError, store::UserStore};
use actix_web::{get, patch, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// List all accounts (admin only)
///
/// Accounts are returned newest first; password hashes are never serialized.
#[get("")]
pub async fn list_users(store: web::Data<dyn UserStore>) -> Result<impl Responder, AppError> {
    let users = store.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Update an account (admin only)
///
/// Name and role are the only mutable fields; anything left unset is
/// untouched. Setting a role the account already has is a no-op.
#[patch("/{id}")]
pub async fn update_user(
    store: web::Data<dyn UserStore>,
    user_id: web::Path<Uuid>,
    update_data: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    update_data.validate()?;

    let mut user = store
        .find_by_id(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut changed = false;
    if let Some(name) = &update_data.name {
        if user.name != *name {
            user.name = name.clone();
            changed = true;
        }
    }
    if let Some(role) = update_data.role {
        if user.role != role {
            user.role = role;
            changed = true;
        }
    }

    if changed {
        user.touch();
        user = store.update(user).await?;
    }

    Ok(HttpResponse::Ok().json(user))
}
