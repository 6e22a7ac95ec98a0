use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::INVOICE_PRODUCTS_TOTAL;
use super::{check, counted, not_found};
use crate::dtos::{InvoiceProductAddRequest, InvoiceProductResponse, InvoiceProductUpdateRequest};
use crate::repositories::{InvoiceProductsRepository, InvoicesRepository, Repositories};

/// Product lines of an invoice. Every change recomputes the invoice total.
#[derive(Clone)]
pub struct InvoiceProductsService {
    invoices: Arc<dyn InvoicesRepository>,
    invoice_products: Arc<dyn InvoiceProductsRepository>,
}

impl InvoiceProductsService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            invoices: repositories.invoices.clone(),
            invoice_products: repositories.invoice_products.clone(),
        }
    }

    #[instrument(skip(self, request), fields(invoice_id = %request.invoice_id))]
    pub async fn add_invoice_product(
        &self,
        request: &InvoiceProductAddRequest,
    ) -> Result<InvoiceProductResponse, AppError> {
        check(request.validate_request())?;

        if self
            .invoices
            .get_invoice_by_invoice_id(request.invoice_id)
            .await?
            .is_none()
        {
            return Err(not_found(format!("Invoice {} not found", request.invoice_id)));
        }

        let Some(input) = request.to_create_invoice_product() else {
            return Err(counted(AppError::BadRequest(anyhow::anyhow!(
                "Product Price and Quantity are required"
            ))));
        };

        let product = self.invoice_products.add_invoice_product(&input).await?;
        self.update_invoice_total_price(product.invoice_id).await?;

        INVOICE_PRODUCTS_TOTAL.with_label_values(&["add"]).inc();

        Ok(product.into())
    }

    /// Update a product line. The line stays on the invoice it was added to.
    #[instrument(skip(self, request), fields(invoice_product_id = %request.invoice_product_id))]
    pub async fn update_invoice_product(
        &self,
        request: &InvoiceProductUpdateRequest,
    ) -> Result<InvoiceProductResponse, AppError> {
        check(request.validate_request())?;

        let missing = || {
            not_found(format!(
                "Invoice product {} not found",
                request.invoice_product_id
            ))
        };

        self.invoice_products
            .get_invoice_product_by_id(request.invoice_product_id)
            .await?
            .ok_or_else(missing)?;

        let Some(input) = request.to_update_invoice_product() else {
            return Err(counted(AppError::BadRequest(anyhow::anyhow!(
                "Product Price and Quantity are required"
            ))));
        };

        let product = self
            .invoice_products
            .update_invoice_product(&input)
            .await?
            .ok_or_else(missing)?;
        self.update_invoice_total_price(product.invoice_id).await?;

        INVOICE_PRODUCTS_TOTAL.with_label_values(&["update"]).inc();

        Ok(product.into())
    }

    /// Delete a product line and return the id of the invoice it belonged to.
    #[instrument(skip(self), fields(invoice_product_id = %invoice_product_id))]
    pub async fn delete_invoice_product(&self, invoice_product_id: Uuid) -> Result<Uuid, AppError> {
        let product = self
            .invoice_products
            .delete_invoice_product_by_id(invoice_product_id)
            .await?
            .ok_or_else(|| {
                not_found(format!("Invoice product {} not found", invoice_product_id))
            })?;
        self.update_invoice_total_price(product.invoice_id).await?;

        INVOICE_PRODUCTS_TOTAL.with_label_values(&["delete"]).inc();

        Ok(product.invoice_id)
    }

    async fn update_invoice_total_price(&self, invoice_id: Uuid) -> Result<Decimal, AppError> {
        let total = self
            .invoices
            .update_invoice_total_price(invoice_id)
            .await?
            .ok_or_else(|| not_found(format!("Invoice {} not found", invoice_id)))?;
        info!(invoice_id = %invoice_id, total_price = %total, "Invoice total recomputed");
        Ok(total)
    }
}
