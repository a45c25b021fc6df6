//! Provisions a barber account. Customers sign up through the API; barbers
//! are created by the shop owner with this tool.
//!
//! Usage: create_barber <username> <display name> <password>

use anyhow::{Context, bail};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use uuid::Uuid;

const ROLE_BARBER: i16 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, display_name, password] = args.as_slice() else {
        bail!("usage: create_barber <username> <display name> <password>");
    };

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = sqlx::PgPool::connect(&database_url).await?;

    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {e}"))?
        .to_string();

    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO app_user (username, display_name, password_hash, roles)
        VALUES ($1, $2, $3, $4)
        RETURNING user_id
        "#,
    )
    .bind(username.trim())
    .bind(display_name.trim())
    .bind(phc)
    .bind(ROLE_BARBER)
    .fetch_one(&pool)
    .await
    .context("insert app_user")?;

    println!("{user_id}");
    Ok(())
}
