//! In-memory store used by tests and by local runs without `DATABASE_URL`.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use super::{HealthCheck, InvoiceProductsRepository, InvoicesRepository, RunningNumbersRepository};
use crate::models::{
    CreateInvoice, CreateInvoiceProduct, Invoice, InvoiceProduct, ListInvoicesFilter,
    RunningNumber, RunningNumberType, UpdateInvoice, UpdateInvoiceProduct,
};

#[derive(Default)]
struct Tables {
    invoices: HashMap<Uuid, Invoice>,
    invoice_products: HashMap<Uuid, InvoiceProduct>,
    running_numbers: HashMap<&'static str, RunningNumber>,
}

impl Tables {
    fn products_of(&self, invoice_id: Uuid) -> Vec<InvoiceProduct> {
        let mut products: Vec<_> = self
            .invoice_products
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| {
            a.created_utc
                .cmp(&b.created_utc)
                .then(a.invoice_product_id.cmp(&b.invoice_product_id))
        });
        products
    }

    fn hydrate(&self, invoice: &Invoice) -> Invoice {
        let mut invoice = invoice.clone();
        invoice.invoice_products = self.products_of(invoice.invoice_id);
        invoice
    }

    fn sorted<'a>(&self, invoices: impl Iterator<Item = &'a Invoice>) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = invoices.map(|i| self.hydrate(i)).collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        invoices
    }
}

/// Process-local tables behind a mutex.
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    /// Store seeded with the invoice counter (`IV`, 0), as the initial
    /// migration does.
    pub fn new() -> Self {
        let db = Self::empty();
        if let Ok(mut tables) = db.tables.lock() {
            let kind = RunningNumberType::Invoice.as_str();
            tables.running_numbers.insert(
                kind,
                RunningNumber {
                    running_number_type: kind.to_string(),
                    prefix: "IV".to_string(),
                    current_running: 0,
                },
            );
        }
        db
    }

    /// Store without any running number rows.
    pub fn empty() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("In-memory store poisoned: {}", e)))
    }
}

#[async_trait]
impl HealthCheck for InMemoryDatabase {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl InvoicesRepository for InMemoryDatabase {
    async fn add_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let mut tables = self.lock()?;
        if tables
            .invoices
            .values()
            .any(|i| i.invoice_number == input.invoice_number)
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                input.invoice_number
            )));
        }

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: input.invoice_number.clone(),
            due_date: input.due_date,
            customer_name: input.customer_name.clone(),
            customer_address: input.customer_address.clone(),
            total_price: Decimal::ZERO,
            created_utc: Utc::now(),
            invoice_products: Vec::new(),
        };
        tables.invoices.insert(invoice.invoice_id, invoice.clone());

        info!(invoice_id = %invoice.invoice_id, invoice_number = %invoice.invoice_number, "Invoice created");

        Ok(invoice)
    }

    async fn get_all_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let tables = self.lock()?;
        Ok(tables.sorted(tables.invoices.values()))
    }

    async fn get_filtered_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let tables = self.lock()?;
        Ok(tables.sorted(tables.invoices.values().filter(|i| filter.matches(i))))
    }

    async fn get_invoice_by_invoice_id(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError> {
        let tables = self.lock()?;
        Ok(tables.invoices.get(&invoice_id).map(|i| tables.hydrate(i)))
    }

    async fn get_invoice_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .invoices
            .values()
            .find(|i| i.invoice_number == invoice_number)
            .map(|i| tables.hydrate(i)))
    }

    async fn get_invoices_by_invoice_ids(
        &self,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Invoice>, AppError> {
        let tables = self.lock()?;
        Ok(tables.sorted(
            tables
                .invoices
                .values()
                .filter(|i| invoice_ids.contains(&i.invoice_id)),
        ))
    }

    async fn update_invoice(&self, input: &UpdateInvoice) -> Result<Option<Invoice>, AppError> {
        let mut tables = self.lock()?;
        let updated = match tables.invoices.get_mut(&input.invoice_id) {
            Some(invoice) => {
                invoice.due_date = input.due_date;
                invoice.customer_name = input.customer_name.clone();
                invoice.customer_address = input.customer_address.clone();
                invoice.clone()
            }
            None => return Ok(None),
        };

        info!(invoice_id = %updated.invoice_id, "Invoice updated");

        Ok(Some(tables.hydrate(&updated)))
    }

    async fn delete_invoice_by_invoice_id(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        let deleted = tables.invoices.remove(&invoice_id).is_some();
        if deleted {
            tables
                .invoice_products
                .retain(|_, p| p.invoice_id != invoice_id);
            info!(invoice_id = %invoice_id, "Invoice deleted");
        }
        Ok(deleted)
    }

    async fn update_invoice_total_price(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Decimal>, AppError> {
        let mut tables = self.lock()?;
        let total = Invoice::sum_line_totals(&tables.products_of(invoice_id));
        Ok(tables.invoices.get_mut(&invoice_id).map(|invoice| {
            invoice.total_price = total;
            total
        }))
    }
}

#[async_trait]
impl InvoiceProductsRepository for InMemoryDatabase {
    async fn add_invoice_product(
        &self,
        input: &CreateInvoiceProduct,
    ) -> Result<InvoiceProduct, AppError> {
        let mut tables = self.lock()?;
        if !tables.invoices.contains_key(&input.invoice_id) {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Invoice {} not found",
                input.invoice_id
            )));
        }

        let product = InvoiceProduct {
            invoice_product_id: Uuid::new_v4(),
            invoice_id: input.invoice_id,
            product_name: input.product_name.clone(),
            product_price: input.product_price,
            quantity: input.quantity,
            total_price: InvoiceProduct::line_total(input.product_price, input.quantity),
            created_utc: Utc::now(),
        };
        tables
            .invoice_products
            .insert(product.invoice_product_id, product.clone());

        info!(
            invoice_product_id = %product.invoice_product_id,
            invoice_id = %product.invoice_id,
            "Invoice product added"
        );

        Ok(product)
    }

    async fn get_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let tables = self.lock()?;
        Ok(tables.invoice_products.get(&invoice_product_id).cloned())
    }

    async fn update_invoice_product(
        &self,
        input: &UpdateInvoiceProduct,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables
            .invoice_products
            .get_mut(&input.invoice_product_id)
            .map(|product| {
                product.product_name = input.product_name.clone();
                product.product_price = input.product_price;
                product.quantity = input.quantity;
                product.total_price = InvoiceProduct::line_total(input.product_price, input.quantity);
                product.clone()
            }))
    }

    async fn delete_invoice_product_by_id(
        &self,
        invoice_product_id: Uuid,
    ) -> Result<Option<InvoiceProduct>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.invoice_products.remove(&invoice_product_id))
    }
}

#[async_trait]
impl RunningNumbersRepository for InMemoryDatabase {
    async fn get_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .running_numbers
            .get(running_number_type.as_str())
            .cloned())
    }

    async fn increase_running_number(
        &self,
        running_number_type: RunningNumberType,
    ) -> Result<Option<RunningNumber>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables
            .running_numbers
            .get_mut(running_number_type.as_str())
            .map(|counter| {
                let previous = counter.clone();
                counter.current_running += 1;
                previous
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create(number: &str, customer: &str, due: NaiveDate) -> CreateInvoice {
        CreateInvoice {
            invoice_number: number.to_string(),
            due_date: due,
            customer_name: customer.to_string(),
            customer_address: "1 Main Street".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn lists_are_ordered_by_invoice_number() {
        let db = InMemoryDatabase::new();
        db.add_invoice(&create("IV00002", "Globex", date(2030, 1, 1)))
            .await
            .unwrap();
        db.add_invoice(&create("IV00001", "Acme", date(2030, 1, 1)))
            .await
            .unwrap();

        let numbers: Vec<_> = db
            .get_all_invoices()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(numbers, vec!["IV00001", "IV00002"]);
    }

    #[tokio::test]
    async fn duplicate_invoice_number_conflicts() {
        let db = InMemoryDatabase::new();
        db.add_invoice(&create("IV00001", "Acme", date(2030, 1, 1)))
            .await
            .unwrap();
        let err = db
            .add_invoice(&create("IV00001", "Other", date(2030, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_invoice_removes_its_products() {
        let db = InMemoryDatabase::new();
        let invoice = db
            .add_invoice(&create("IV00001", "Acme", date(2030, 1, 1)))
            .await
            .unwrap();
        let product = db
            .add_invoice_product(&CreateInvoiceProduct {
                invoice_id: invoice.invoice_id,
                product_name: "Widget".to_string(),
                product_price: Decimal::from(10),
                quantity: 2,
            })
            .await
            .unwrap();

        assert!(db.delete_invoice_by_invoice_id(invoice.invoice_id).await.unwrap());
        assert!(db
            .get_invoice_product_by_id(product.invoice_product_id)
            .await
            .unwrap()
            .is_none());
        assert!(!db.delete_invoice_by_invoice_id(invoice.invoice_id).await.unwrap());
    }

    #[tokio::test]
    async fn total_price_follows_products() {
        let db = InMemoryDatabase::new();
        let invoice = db
            .add_invoice(&create("IV00001", "Acme", date(2030, 1, 1)))
            .await
            .unwrap();
        for (price, qty) in [(10, 2), (5, 3)] {
            db.add_invoice_product(&CreateInvoiceProduct {
                invoice_id: invoice.invoice_id,
                product_name: "Line".to_string(),
                product_price: Decimal::from(price),
                quantity: qty,
            })
            .await
            .unwrap();
        }

        let total = db
            .update_invoice_total_price(invoice.invoice_id)
            .await
            .unwrap();
        assert_eq!(total, Some(Decimal::from(35)));

        let stored = db
            .get_invoice_by_invoice_id(invoice.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_price, Decimal::from(35));
        assert_eq!(stored.invoice_products.len(), 2);
    }

    #[tokio::test]
    async fn increase_returns_value_before_increment() {
        let db = InMemoryDatabase::new();
        let first = db
            .increase_running_number(RunningNumberType::Invoice)
            .await
            .unwrap()
            .unwrap();
        let second = db
            .increase_running_number(RunningNumberType::Invoice)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.current_running, 0);
        assert_eq!(second.current_running, 1);
        assert_eq!(second.prefix, "IV");
    }

    #[tokio::test]
    async fn empty_store_has_no_counter() {
        let db = InMemoryDatabase::empty();
        assert!(db
            .get_running_number(RunningNumberType::Invoice)
            .await
            .unwrap()
            .is_none());
    }
}
