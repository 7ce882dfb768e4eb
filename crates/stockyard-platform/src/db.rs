use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use stockyard_core::{HeaderPayload, LineItemPayload, PurchaseStore};
use tracing::info;

const SCHEMA: &str = include_str!("../migrations/0001_purchases.sql");

pub async fn connect_database(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Creates the purchase tables when they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("failed to apply purchase schema")?;
    Ok(())
}

#[derive(Clone)]
pub struct PgPurchaseStore {
    pool: PgPool,
}

impl PgPurchaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseStore for PgPurchaseStore {
    async fn create_header(&self, header: &HeaderPayload) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO purchase_headers (
                nota,
                purchase_date,
                supplier_id,
                office_id,
                classification_id,
                allocation_mode,
                truck_cost,
                other_cost,
                total_weight,
                total_price,
                total_count,
                landed_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&header.nota)
        .bind(header.purchase_date)
        .bind(header.supplier_id)
        .bind(header.office_id)
        .bind(header.classification_id)
        .bind(header.allocation_mode.code())
        .bind(header.truck_cost)
        .bind(header.other_cost)
        .bind(header.total_weight)
        .bind(header.total_price)
        .bind(i64::from(header.total_count))
        .bind(header.landed_total)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create purchase header {}", header.nota))?;

        let header_id: i64 = row.try_get("id")?;
        info!(header_id, nota = %header.nota, "purchase header inserted");
        Ok(header_id)
    }

    async fn update_header(&self, header_id: i64, header: &HeaderPayload) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_headers
            SET nota = $2,
                purchase_date = $3,
                supplier_id = $4,
                office_id = $5,
                classification_id = $6,
                allocation_mode = $7,
                truck_cost = $8,
                other_cost = $9,
                total_weight = $10,
                total_price = $11,
                total_count = $12,
                landed_total = $13,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(header_id)
        .bind(&header.nota)
        .bind(header.purchase_date)
        .bind(header.supplier_id)
        .bind(header.office_id)
        .bind(header.classification_id)
        .bind(header.allocation_mode.code())
        .bind(header.truck_cost)
        .bind(header.other_cost)
        .bind(header.total_weight)
        .bind(header.total_price)
        .bind(i64::from(header.total_count))
        .bind(header.landed_total)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update purchase header {header_id}"))?;

        if result.rows_affected() == 0 {
            bail!("purchase header {header_id} does not exist");
        }
        Ok(())
    }

    async fn latest_header_id(&self) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT id FROM purchase_headers ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to look up the latest purchase header")?;

        row.map(|row| row.try_get::<i64, _>("id"))
            .transpose()
            .map_err(Into::into)
    }

    async fn create_line(&self, line: &LineItemPayload) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO purchase_lines (
                parent_id,
                office_id,
                tag_code,
                supplier_tag_code,
                classification_id,
                unit_price,
                weight,
                markup_percent,
                landed_unit_cost,
                total_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(line.parent_id)
        .bind(line.office_id)
        .bind(&line.tag_code)
        .bind(&line.supplier_tag_code)
        .bind(line.classification_id)
        .bind(line.unit_price)
        .bind(line.weight)
        .bind(line.markup_percent)
        .bind(line.landed_unit_cost)
        .bind(line.total_price)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create purchase line {}", line.tag_code))?;

        Ok(row.try_get("id")?)
    }

    async fn update_line(&self, detail_id: i64, line: &LineItemPayload) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_lines
            SET parent_id = $2,
                office_id = $3,
                tag_code = $4,
                supplier_tag_code = $5,
                classification_id = $6,
                unit_price = $7,
                weight = $8,
                markup_percent = $9,
                landed_unit_cost = $10,
                total_price = $11,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(detail_id)
        .bind(line.parent_id)
        .bind(line.office_id)
        .bind(&line.tag_code)
        .bind(&line.supplier_tag_code)
        .bind(line.classification_id)
        .bind(line.unit_price)
        .bind(line.weight)
        .bind(line.markup_percent)
        .bind(line.landed_unit_cost)
        .bind(line.total_price)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update purchase line {detail_id}"))?;

        if result.rows_affected() == 0 {
            bail!("purchase line {detail_id} does not exist");
        }
        Ok(())
    }

    async fn delete_line(&self, detail_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM purchase_lines WHERE id = $1")
            .bind(detail_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete purchase line {detail_id}"))?;

        if result.rows_affected() == 0 {
            bail!("purchase line {detail_id} does not exist");
        }
        info!(detail_id, "purchase line deleted");
        Ok(())
    }
}
