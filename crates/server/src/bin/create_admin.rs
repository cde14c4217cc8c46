//! Create an admin account, or reset the password of an existing one.
//!
//! Usage:
//!   cargo run --bin create_admin -- <email> <password> [name]

use std::env;

use anyhow::bail;
use db::{
    DBService,
    models::user::{CreateUser, User, UserRole},
};
use services::services::auth::hash_password;
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Created,
    PasswordReset,
    /// An existing non-admin account was given the admin role
    Promoted,
}

/// Make sure `email` belongs to an admin whose password hashes to `password_hash`
async fn ensure_admin(
    pool: &SqlitePool,
    email: &str,
    password_hash: String,
    name: &str,
) -> anyhow::Result<(User, Outcome)> {
    if let Some(existing) = User::find_by_email(pool, email).await? {
        User::update_password(pool, existing.id, &password_hash).await?;
        let outcome = if existing.role == UserRole::Admin {
            Outcome::PasswordReset
        } else {
            User::set_role(pool, existing.id, UserRole::Admin).await?;
            Outcome::Promoted
        };
        return Ok((existing, outcome));
    }

    let user = User::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
            role: UserRole::Admin,
        },
    )
    .await?;
    Ok((user, Outcome::Created))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: cargo run --bin create_admin -- <email> <password> [name]");
        return Ok(());
    }

    let email = args[0].trim();
    let password = &args[1];
    let name = args.get(2).map(String::as_str).unwrap_or("Admin");

    if !email.contains('@') {
        bail!("'{email}' is not an email address");
    }
    if password.len() < MIN_PASSWORD_LEN {
        bail!("password must be at least {MIN_PASSWORD_LEN} characters");
    }

    info!("Connecting to database...");
    let db = DBService::new().await?;
    let password_hash = hash_password(password)?;

    let (user, outcome) = ensure_admin(&db.pool, email, password_hash, name).await?;
    match outcome {
        Outcome::Created => println!("Created admin {} ({})", user.email, user.id),
        Outcome::PasswordReset => println!("Password reset for admin {}", user.email),
        Outcome::Promoted => println!(
            "Password reset for {}; account promoted from {:?} to admin",
            user.email, user.role
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use db::test_utils::create_test_pool;

    use super::*;

    #[tokio::test]
    async fn existing_user_account_is_promoted() {
        let (pool, _dir) = create_test_pool().await;
        let user = User::create(
            &pool,
            &CreateUser {
                email: "editor@example.com".to_string(),
                password_hash: "old".to_string(),
                name: "Editor".to_string(),
                role: UserRole::User,
            },
        )
        .await
        .unwrap();

        let (_, outcome) = ensure_admin(&pool, "editor@example.com", "new".to_string(), "Admin")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Promoted);

        let stored = User::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Admin);
        assert_eq!(stored.password_hash, "new");
    }

    #[tokio::test]
    async fn creates_then_resets_an_admin() {
        let (pool, _dir) = create_test_pool().await;
        let (created, outcome) =
            ensure_admin(&pool, "owner@example.com", "first".to_string(), "Owner")
                .await
                .unwrap();
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(created.role, UserRole::Admin);

        let (_, outcome) = ensure_admin(&pool, "owner@example.com", "second".to_string(), "Owner")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::PasswordReset);
        assert_eq!(User::count(&pool).await.unwrap(), 1);
    }
}
