use async_trait::async_trait;

use booktime_core::{AddressFields, AddressId, UserId};

use super::PgStore;
use crate::db::{AddressStore, RepositoryError, map_write_error};
use crate::models::Address;

const ADDRESS_COLUMNS: &str = "id, user_id, name, address1, address2, zip_code, city, country";

#[async_trait]
impl AddressStore for PgStore {
    async fn list_addresses(&self, user: Option<UserId>) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE ($1::int4 IS NULL OR user_id = $1)
             ORDER BY id"
        );
        let addresses = sqlx::query_as(&sql)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses)
    }

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address WHERE id = $1 AND user_id = $2"
        );
        let address = sqlx::query_as(&sql)
            .bind(id)
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;
        Ok(address)
    }

    async fn create_address(
        &self,
        user: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.address (user_id, name, address1, address2, zip_code, city, country)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ADDRESS_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(user)
            .bind(&fields.name)
            .bind(&fields.address1)
            .bind(&fields.address2)
            .bind(&fields.zip_code)
            .bind(&fields.city)
            .bind(fields.country)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "address"))
    }

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let sql = format!(
            "UPDATE storefront.address SET
                 name = $3, address1 = $4, address2 = $5,
                 zip_code = $6, city = $7, country = $8
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(user)
            .bind(&fields.name)
            .bind(&fields.address1)
            .bind(&fields.address2)
            .bind(&fields.zip_code)
            .bind(&fields.city)
            .bind(fields.country)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
