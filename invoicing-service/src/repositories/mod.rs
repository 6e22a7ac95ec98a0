//! Persistence seams for invoicing-service.
//!
//! Each repository is a trait so the services can run over PostgreSQL in
//! production and over the in-memory store in tests and local development.

mod memory;
mod postgres;

pub use memory::InMemoryDatabase;
pub use postgres::Database;

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    CreateInvoice, CreateInvoiceProduct, Invoice, InvoiceProduct, ListInvoicesFilter,
    RunningNumber, RunningNumberType, UpdateInvoice, UpdateInvoiceProduct,
};

/// Invoice headers. Every returned invoice carries its products.
#[async_trait]
pub trait InvoicesRepository: Send + Sync {
    async fn add_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError>;

    /// All invoices ordered by invoice number.
    async fn get_all_invoices(&self) -> Result<Vec<Invoice>, AppError>;

    /// Invoices matching `filter`, ordered by invoice number.
    async fn get_filtered_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError>;

    async fn get_invoice_by_invoice_id(&self, invoice_id: Uuid)
        -> Result<Option<Invoice>, AppError>;

    async fn get_invoice_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError>;

    /// Selected invoices ordered by invoice number. Unknown ids are skipped.
    async fn get_invoices_by_invoice_ids(
        &self,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Invoice>, AppError>;

    /// Update due date and customer details. `None` if the invoice is unknown.
    async fn update_invoice(&self, input: &UpdateInvoice) -> Result<Option<Invoice>, AppError>;

    /// Delete an invoice together with its products.
    async fn delete_invoice_by_invoice_id(&self, invoice_id: Uuid) -> Result<bool, AppError>;

    /// Store the sum of the invoice's line totals as its total price and
    /// return the new total. `None` if the invoice is unknown.
    async fn update_invoice_total_price(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Decimal>, AppError>;
}

#[async_trait]
pub trait InvoiceProductsRepository: Send + Sync {
    async fn add_invoice_product(
        &self,
        input: &CreateInvoiceProduct,
    ) -> Result<InvoiceProduct, AppError>;

    async fn get_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError>;

    /// Update name, price and quantity; the line total is recomputed.
    async fn update_invoice_product(
        &self,
        input: &UpdateInvoiceProduct,
    ) -> Result<Option<InvoiceProduct>, AppError>;

    /// Delete a product line, returning the removed row.
    async fn delete_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError>;
}

#[async_trait]
pub trait RunningNumbersRepository: Send + Sync {
    async fn get_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError>;

    /// Atomically advance the counter by one and return it as it was
    /// before the increment.
    async fn increase_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;
}

/// One store behind every repository seam.
#[derive(Clone)]
pub struct Repositories {
    pub invoices: Arc<dyn InvoicesRepository>,
    pub invoice_products: Arc<dyn InvoiceProductsRepository>,
    pub running_numbers: Arc<dyn RunningNumbersRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    pub fn from_store<S>(store: S) -> Self
    where
        S: InvoicesRepository
            + InvoiceProductsRepository
            + RunningNumbersRepository
            + HealthCheck
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            invoices: store.clone(),
            invoice_products: store.clone(),
            running_numbers: store.clone(),
            health: store,
        }
    }

    pub fn postgres(db: Database) -> Self {
        Self::from_store(db)
    }

    /// In-memory store seeded with the invoice counter.
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryDatabase::new())
    }
}
