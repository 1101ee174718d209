use async_trait::async_trait;

use booktime_core::{Email, UserId};

use super::PgStore;
use crate::db::{RepositoryError, UserStore, map_write_error};
use crate::models::{NewUser, User, UserCredentials, UserUpdate};

const USER_COLUMNS: &str = "id, email, first_name, last_name, is_active, role, date_joined";

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.user (email, password_hash, first_name, last_name, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "user with this email"))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.user WHERE id = $1");
        let user = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM storefront.user WHERE email = $1"
        );
        let row: Option<CredentialsRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserCredentials {
            user: row.user,
            password_hash: row.password_hash,
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.user ORDER BY id");
        let users = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.user SET
                 first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 is_active = COALESCE($4, is_active),
                 role = CASE WHEN $5 THEN $6 ELSE role END
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(update.first_name.as_deref())
            .bind(update.last_name.as_deref())
            .bind(update.is_active)
            .bind(update.role.is_some())
            .bind(update.role.flatten())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
