use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Creates the default admin account on first boot. User creation is an
/// explicit write here, never an implicit side effect of another save.
pub(crate) async fn ensure_superuser(state: &AppState) -> Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not set; skipping superuser bootstrap");
        return Ok(());
    }

    let existing =
        repositories::users::find_by_username(state.db(), &admin.first_superuser_username)
            .await
            .context("Failed to look up default superuser")?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)
        .context("Failed to hash superuser password")?;
    let now = primitive_now_utc();

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &admin.first_superuser_username,
            hashed_password,
            full_name: "Administrator",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .context("Failed to create default superuser")?;

    tracing::info!(username = %admin.first_superuser_username, "Default superuser created");
    Ok(())
}
