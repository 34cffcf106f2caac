use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account role, fixed at registration. Maps to the `user_role` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employer,
    Applicant,
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "applicant" => Ok(Role::Applicant),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Applicant => "applicant",
        };
        f.write_str(s)
    }
}

/// Identity record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields for inserting a new identity. The profile row is created in the
/// same transaction by the caller.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub profile_image: Option<&'a str>,
    pub role: Role,
    pub password_hash: &'a str,
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, phone_number, address, \
     profile_image, role, password_hash, is_verified, is_active, created_at, updated_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    /// Insert a new identity inside the registration transaction. The unique
    /// indexes on email/username are the authoritative guard; a violation
    /// surfaces as sqlx error 23505 for the caller to map.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        new: NewUser<'_>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (email, username, first_name, last_name, phone_number, address,
                 profile_image, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.email)
        .bind(new.username)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone_number)
        .bind(new.address)
        .bind(new.profile_image)
        .bind(new.role)
        .bind(new.password_hash)
        .fetch_one(&mut **tx)
        .await
    }

    /// Partial update of the caller-editable identity fields. Unset fields
    /// keep their current value. Email, username, role and the flags are not
    /// reachable from here.
    pub async fn update_own_fields(
        db: &PgPool,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone_number: Option<&str>,
        address: Option<&str>,
        profile_image: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                address = COALESCE($5, address),
                profile_image = COALESCE($6, profile_image),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone_number)
        .bind(address)
        .bind(profile_image)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

/// The Denylist: refresh-token ids that may no longer mint access tokens.
pub struct RevokedToken;

impl RevokedToken {
    /// Idempotent; revoking an already-revoked token is a no-op. The row is
    /// durable before this returns.
    pub async fn revoke(
        db: &PgPool,
        jti: Uuid,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn is_revoked(db: &PgPool, jti: Uuid) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT jti FROM revoked_tokens WHERE jti = $1")
                .bind(jti)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    /// Rows past natural expiry can be dropped; an expired token fails
    /// signature validation regardless.
    pub async fn purge_expired(db: &PgPool) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_all_recognized_values() {
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert_eq!(Role::from_str("employer"), Ok(Role::Employer));
        assert_eq!(Role::from_str("applicant"), Ok(Role::Applicant));
    }

    #[test]
    fn role_rejects_unknown_values() {
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_str("Admin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn role_display_round_trips() {
        for role in [Role::Admin, Role::Employer, Role::Applicant] {
            assert_eq!(Role::from_str(&role.to_string()), Ok(role));
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Employer).unwrap(), "\"employer\"");
    }
}
