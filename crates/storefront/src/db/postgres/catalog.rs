use async_trait::async_trait;
use chrono::{DateTime, Utc};

use booktime_core::{Price, ProductId, Slug, TagId};

use super::PgStore;
use crate::db::{CatalogStore, RepositoryError, map_delete_error, map_write_error};
use crate::models::{NewProduct, NewTag, Product, ProductImage, ProductUpdate, Tag, TagUpdate};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.price, p.active, p.in_stock, p.date_updated,
           COALESCE(
               array_agg(pt.tag_id ORDER BY pt.tag_id) FILTER (WHERE pt.tag_id IS NOT NULL),
               '{}'
           ) AS tag_ids
    FROM storefront.product p
    LEFT JOIN storefront.product_tags pt ON pt.product_id = p.id
";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: Slug,
    description: String,
    price: Price,
    active: bool,
    in_stock: bool,
    date_updated: DateTime<Utc>,
    tag_ids: Vec<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            active: row.active,
            in_stock: row.in_stock,
            tags: row.tag_ids.into_iter().map(TagId::new).collect(),
            date_updated: row.date_updated,
        }
    }
}

fn tag_ids(tags: &[TagId]) -> Vec<i32> {
    tags.iter().map(TagId::as_i32).collect()
}

impl PgStore {
    async fn replace_product_tags(
        tx: &mut sqlx::PgConnection,
        product: ProductId,
        tags: &[TagId],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.product_tags WHERE product_id = $1")
            .bind(product)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO storefront.product_tags (product_id, tag_id)
             SELECT $1, UNNEST($2::int4[])
             ON CONFLICT DO NOTHING",
        )
        .bind(product)
        .bind(tag_ids(tags))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product tag"))?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(
        &self,
        tag: Option<&Slug>,
        active_only: bool,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT}
             WHERE (NOT $1 OR p.active)
               AND ($2::text IS NULL OR EXISTS (
                   SELECT 1 FROM storefront.product_tags x
                   JOIN storefront.product_tag t ON t.id = x.tag_id
                   WHERE x.product_id = p.id AND t.slug = $2
               ))
             GROUP BY p.id
             ORDER BY p.name, p.id"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(active_only)
            .bind(tag.map(Slug::as_str))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn get_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.slug = $1 GROUP BY p.id");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(slug.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn create_product(
        &self,
        product: &NewProduct,
        slug: &Slug,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO storefront.product (name, slug, description, price, active, in_stock)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&product.name)
        .bind(slug.as_str())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.active)
        .bind(product.in_stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product slug"))?;

        Self::replace_product_tags(&mut tx, id, &product.tags).await?;
        tx.commit().await?;

        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE storefront.product SET
                 name = COALESCE($2, name),
                 slug = COALESCE($3, slug),
                 description = COALESCE($4, description),
                 price = COALESCE($5, price),
                 active = COALESCE($6, active),
                 in_stock = COALESCE($7, in_stock),
                 date_updated = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.slug.as_ref().map(Slug::as_str))
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.active)
        .bind(update.in_stock)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(tags) = &update.tags {
            Self::replace_product_tags(&mut tx, id, tags).await?;
        }
        tx.commit().await?;

        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_delete_error(e, "product"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_tags(&self, active_only: bool) -> Result<Vec<Tag>, RepositoryError> {
        let tags = sqlx::query_as(
            "SELECT id, name, slug, description, active
             FROM storefront.product_tag
             WHERE (NOT $1 OR active)
             ORDER BY name, id",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn get_tag(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        let tag = sqlx::query_as(
            "SELECT id, name, slug, description, active FROM storefront.product_tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tag)
    }

    async fn create_tag(&self, tag: &NewTag, slug: &Slug) -> Result<Tag, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO storefront.product_tag (name, slug, description, active)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, slug, description, active",
        )
        .bind(&tag.name)
        .bind(slug.as_str())
        .bind(&tag.description)
        .bind(tag.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "tag slug"))
    }

    async fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Tag, RepositoryError> {
        sqlx::query_as(
            "UPDATE storefront.product_tag SET
                 name = COALESCE($2, name),
                 slug = COALESCE($3, slug),
                 description = COALESCE($4, description),
                 active = COALESCE($5, active)
             WHERE id = $1
             RETURNING id, name, slug, description, active",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.slug.as_ref().map(Slug::as_str))
        .bind(update.description.as_deref())
        .bind(update.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "tag slug"))?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_tag(&self, id: TagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product_tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_product_images(
        &self,
        product: ProductId,
    ) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as(
            "SELECT id, product_id, image, thumbnail
             FROM storefront.product_image
             WHERE product_id = $1
             ORDER BY id",
        )
        .bind(product)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }

    async fn add_product_image(
        &self,
        product: ProductId,
        image: &str,
    ) -> Result<ProductImage, RepositoryError> {
        sqlx::query_as(
            "INSERT INTO storefront.product_image (product_id, image)
             VALUES ($1, $2)
             RETURNING id, product_id, image, thumbnail",
        )
        .bind(product)
        .bind(image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "product image"))
    }
}
