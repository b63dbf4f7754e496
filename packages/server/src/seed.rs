use chrono::Utc;
use common::UserStatus;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapConfig;
use crate::entity::{audition, role, system_setting, user};
use crate::extractors::auth::SUPER_ADMIN;
use crate::models::shared::normalize_email;
use crate::permissions;
use crate::services::settings;
use crate::utils::hash;

/// Seed the protected roles with their initial permissions.
///
/// Existing roles are left alone so permission edits made by administrators
/// survive restarts.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    let all: Vec<&str> = permissions::ALL.iter().map(|(p, _)| *p).collect();
    let defaults: [(&str, &str, &[&str]); 3] = [
        (SUPER_ADMIN, "Full access to everything", &all),
        ("Admin", "Day-to-day administration", permissions::ADMIN_DEFAULTS),
        (role::DEFAULT_ROLE, "Registered applicant", &[]),
    ];

    let now = Utc::now();
    let mut inserted = 0u32;
    for (name, description, perms) in defaults {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            permissions: Set(serde_json::json!(perms)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {}
            Ok(_) => inserted += 1,
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new roles", inserted);
    }
    Ok(())
}

/// Insert default settings that are not present yet.
pub async fn seed_settings(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = Utc::now();
    let mut inserted = 0u32;
    for def in settings::DEFAULTS {
        let model = system_setting::ActiveModel {
            key: Set(def.key.to_string()),
            value: Set(def.default.to_string()),
            category: Set(def.category.to_string()),
            updated_at: Set(now),
        };

        let result = system_setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(system_setting::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) | Err(DbErr::RecordNotInserted) => {}
            Ok(_) => inserted += 1,
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} default settings", inserted);
    }
    Ok(())
}

/// Create the configured super administrator if no account uses that email yet.
pub async fn seed_admin(db: &DatabaseConnection, bootstrap: &BootstrapConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&bootstrap.admin_email, &bootstrap.admin_password) else {
        return Ok(());
    };
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Ok(());
    }

    let exists = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .count(db)
        .await?;
    if exists > 0 {
        return Ok(());
    }

    let super_admin = role::Entity::find()
        .filter(role::Column::Name.eq(SUPER_ADMIN))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::Custom(format!("role '{SUPER_ADMIN}' is missing")))?;
    let hashed = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("password hash error: {e}")))?;

    let now = Utc::now();
    user::ActiveModel {
        name: Set("Administrator".to_string()),
        email: Set(email.clone()),
        password: Set(hashed),
        role_id: Set(super_admin.id),
        status: Set(UserStatus::Active),
        gallery: Set(serde_json::json!([])),
        email_verified_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(%email, "Created bootstrap administrator");
    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create composite non-unique indexes, so the
/// duplicate-audition lookup index is created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let index = Index::create()
        .if_not_exists()
        .name("idx_audition_user_movie")
        .table(audition::Entity)
        .col(audition::Column::UserId)
        .col(audition::Column::MovieId)
        .to_owned();

    let stmt = match db.get_database_backend() {
        DbBackend::Sqlite => index.to_string(SqliteQueryBuilder),
        _ => index.to_string(PostgresQueryBuilder),
    };

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_audition_user_movie exists"),
        Err(e) => tracing::warn!("Failed to create index idx_audition_user_movie: {}", e),
    }
    Ok(())
}

/// Run every startup seeding step.
pub async fn run(db: &DatabaseConnection, bootstrap: &BootstrapConfig) -> Result<(), DbErr> {
    seed_roles(db).await?;
    seed_settings(db).await?;
    seed_admin(db, bootstrap).await?;
    ensure_indexes(db).await
}
