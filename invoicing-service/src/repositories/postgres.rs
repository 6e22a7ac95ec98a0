//! PostgreSQL store for invoicing-service.

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{HealthCheck, InvoiceProductsRepository, InvoicesRepository, RunningNumbersRepository};
use crate::models::{
    CreateInvoice, CreateInvoiceProduct, Invoice, InvoiceProduct, ListInvoicesFilter,
    RunningNumber, RunningNumberType, UpdateInvoice, UpdateInvoiceProduct,
};
use crate::services::metrics::DB_QUERY_DURATION;

const INVOICE_COLUMNS: &str =
    "invoice_id, invoice_number, due_date, customer_name, customer_address, total_price, created_utc";

const INVOICE_PRODUCT_COLUMNS: &str =
    "invoice_product_id, invoice_id, product_name, product_price, quantity, total_price, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Load the products of `invoices` in one query and attach them in
    /// creation order.
    async fn attach_products(&self, invoices: &mut [Invoice]) -> Result<(), AppError> {
        if invoices.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = invoices.iter().map(|i| i.invoice_id).collect();
        let products = sqlx::query_as::<_, InvoiceProduct>(&format!(
            "SELECT {} FROM invoice_products WHERE invoice_id = ANY($1) ORDER BY created_utc, invoice_product_id",
            INVOICE_PRODUCT_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load invoice products: {}", e))
        })?;

        let mut by_invoice: HashMap<Uuid, Vec<InvoiceProduct>> = HashMap::new();
        for product in products {
            by_invoice.entry(product.invoice_id).or_default().push(product);
        }
        for invoice in invoices.iter_mut() {
            invoice.invoice_products = by_invoice.remove(&invoice.invoice_id).unwrap_or_default();
        }

        Ok(())
    }

    async fn with_products(&self, invoice: Option<Invoice>) -> Result<Option<Invoice>, AppError> {
        match invoice {
            Some(invoice) => {
                let mut invoices = [invoice];
                self.attach_products(&mut invoices).await?;
                let [invoice] = invoices;
                Ok(Some(invoice))
            }
            None => Ok(None),
        }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl HealthCheck for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl InvoicesRepository for Database {
    #[instrument(skip(self, input), fields(invoice_number = %input.invoice_number))]
    async fn add_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_id, invoice_number, due_date, customer_name, customer_address, total_price)
            VALUES ($1, $2, $3, $4, $5, 0)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.invoice_number)
        .bind(input.due_date)
        .bind(&input.customer_name)
        .bind(&input.customer_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number '{}' already exists",
                    input.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to add invoice: {}", e)),
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice.invoice_id, invoice_number = %invoice.invoice_number, "Invoice created");

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn get_all_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_all_invoices"])
            .start_timer();

        let mut invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices ORDER BY invoice_number",
            INVOICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        self.attach_products(&mut invoices).await?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn get_filtered_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_filtered_invoices"])
            .start_timer();

        let mut invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::varchar IS NULL OR invoice_number ILIKE $1)
              AND ($2::varchar IS NULL OR customer_name ILIKE $2)
              AND ($3::date IS NULL OR due_date >= $3)
              AND ($4::date IS NULL OR due_date <= $4)
            ORDER BY invoice_number
            "#,
            INVOICE_COLUMNS
        ))
        .bind(filter.invoice_number.as_deref().map(like_pattern))
        .bind(filter.customer_name.as_deref().map(like_pattern))
        .bind(filter.from_due_date)
        .bind(filter.to_due_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to filter invoices: {}", e))
        })?;

        self.attach_products(&mut invoices).await?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice_by_invoice_id(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_by_invoice_id"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        let invoice = self.with_products(invoice).await?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn get_invoice_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_by_invoice_number"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE invoice_number = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        let invoice = self.with_products(invoice).await?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, invoice_ids), fields(count = invoice_ids.len()))]
    async fn get_invoices_by_invoice_ids(
        &self,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoices_by_invoice_ids"])
            .start_timer();

        let mut invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = ANY($1) ORDER BY invoice_number",
            INVOICE_COLUMNS
        ))
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get selected invoices: {}", e))
        })?;

        self.attach_products(&mut invoices).await?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    async fn update_invoice(&self, input: &UpdateInvoice) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET due_date = $2,
                customer_name = $3,
                customer_address = $4
            WHERE invoice_id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(input.invoice_id)
        .bind(input.due_date)
        .bind(&input.customer_name)
        .bind(&input.customer_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        let invoice = self.with_products(invoice).await?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            info!(invoice_id = %inv.invoice_id, "Invoice updated");
        }

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn delete_invoice_by_invoice_id(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        // invoice_products rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = %invoice_id, "Invoice deleted");
        }

        Ok(deleted)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn update_invoice_total_price(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Decimal>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_total_price"])
            .start_timer();

        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE invoices
            SET total_price = (
                SELECT COALESCE(SUM(total_price), 0)
                FROM invoice_products
                WHERE invoice_id = $1
            )
            WHERE invoice_id = $1
            RETURNING total_price
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice total: {}", e))
        })?;

        timer.observe_duration();

        Ok(total)
    }
}

#[async_trait]
impl InvoiceProductsRepository for Database {
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    async fn add_invoice_product(
        &self,
        input: &CreateInvoiceProduct,
    ) -> Result<InvoiceProduct, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["add_invoice_product"])
            .start_timer();

        let product = sqlx::query_as::<_, InvoiceProduct>(&format!(
            r#"
            INSERT INTO invoice_products (invoice_product_id, invoice_id, product_name, product_price, quantity, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            INVOICE_PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.invoice_id)
        .bind(&input.product_name)
        .bind(input.product_price)
        .bind(input.quantity)
        .bind(InvoiceProduct::line_total(input.product_price, input.quantity))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Invoice {} not found", input.invoice_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to add invoice product: {}", e)),
        })?;

        timer.observe_duration();

        info!(
            invoice_product_id = %product.invoice_product_id,
            invoice_id = %product.invoice_id,
            "Invoice product added"
        );

        Ok(product)
    }

    #[instrument(skip(self), fields(invoice_product_id = %invoice_product_id))]
    async fn get_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_product"])
            .start_timer();

        let product = sqlx::query_as::<_, InvoiceProduct>(&format!(
            "SELECT {} FROM invoice_products WHERE invoice_product_id = $1",
            INVOICE_PRODUCT_COLUMNS
        ))
        .bind(invoice_product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice product: {}", e))
        })?;

        timer.observe_duration();

        Ok(product)
    }

    #[instrument(skip(self, input), fields(invoice_product_id = %input.invoice_product_id))]
    async fn update_invoice_product(
        &self,
        input: &UpdateInvoiceProduct,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice_product"])
            .start_timer();

        let product = sqlx::query_as::<_, InvoiceProduct>(&format!(
            r#"
            UPDATE invoice_products
            SET product_name = $2,
                product_price = $3,
                quantity = $4,
                total_price = $5
            WHERE invoice_product_id = $1
            RETURNING {}
            "#,
            INVOICE_PRODUCT_COLUMNS
        ))
        .bind(input.invoice_product_id)
        .bind(&input.product_name)
        .bind(input.product_price)
        .bind(input.quantity)
        .bind(InvoiceProduct::line_total(input.product_price, input.quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice product: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref p) = product {
            info!(invoice_product_id = %p.invoice_product_id, "Invoice product updated");
        }

        Ok(product)
    }

    #[instrument(skip(self), fields(invoice_product_id = %invoice_product_id))]
    async fn delete_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice_product"])
            .start_timer();

        let product = sqlx::query_as::<_, InvoiceProduct>(&format!(
            "DELETE FROM invoice_products WHERE invoice_product_id = $1 RETURNING {}",
            INVOICE_PRODUCT_COLUMNS
        ))
        .bind(invoice_product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice product: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref p) = product {
            info!(invoice_product_id = %p.invoice_product_id, "Invoice product deleted");
        }

        Ok(product)
    }
}

#[async_trait]
impl RunningNumbersRepository for Database {
    #[instrument(skip(self))]
    async fn get_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_running_number"])
            .start_timer();

        let running_number = sqlx::query_as::<_, RunningNumber>(
            r#"
            SELECT running_number_type, prefix, current_running
            FROM running_numbers
            WHERE running_number_type = $1
            "#,
        )
        .bind(running_number_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get running number: {}", e))
        })?;

        timer.observe_duration();

        Ok(running_number)
    }

    #[instrument(skip(self))]
    async fn increase_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["increase_running_number"])
            .start_timer();

        // Single statement so concurrent callers never observe the same value.
        let running_number = sqlx::query_as::<_, RunningNumber>(
            r#"
            UPDATE running_numbers
            SET current_running = current_running + 1
            WHERE running_number_type = $1
            RETURNING running_number_type, prefix, current_running - 1 AS current_running
            "#,
        )
        .bind(running_number_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to increase running number: {}", e))
        })?;

        timer.observe_duration();

        Ok(running_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("IV0"), "%IV0%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
