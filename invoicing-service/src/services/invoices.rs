use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::metrics::{EXPORTS_TOTAL, INVOICES_TOTAL};
use super::{build_invoices_workbook, check, not_found};
use crate::dtos::{InvoiceAddRequest, InvoiceFilters, InvoiceResponse, InvoiceUpdateRequest};
use crate::models::{next_running_number, RunningNumberType};
use crate::repositories::{InvoicesRepository, Repositories, RunningNumbersRepository};

const EMPTY_EXPORT_MESSAGE: &str = "Please select invoices for export.";

/// Invoice header operations, invoice numbering and export.
#[derive(Clone)]
pub struct InvoicesService {
    invoices: Arc<dyn InvoicesRepository>,
    running_numbers: Arc<dyn RunningNumbersRepository>,
}

impl InvoicesService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            invoices: repositories.invoices.clone(),
            running_numbers: repositories.running_numbers.clone(),
        }
    }

    /// Create an invoice with a freshly generated number and a zero total.
    #[instrument(skip(self, request))]
    pub async fn add_invoice(&self, request: &InvoiceAddRequest) -> Result<InvoiceResponse, AppError> {
        check(request.validate_request())?;
        let Some(due_date) = request.due_date else {
            return Err(AppError::BadRequest(anyhow::anyhow!("Due Date is required")));
        };

        let invoice_number = self.generate_invoice_number().await?;
        if self
            .invoices
            .get_invoice_by_invoice_number(&invoice_number)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice number '{}' already exists",
                invoice_number
            )));
        }

        let invoice = self
            .invoices
            .add_invoice(&request.to_create_invoice(invoice_number, due_date))
            .await?;

        INVOICES_TOTAL.with_label_values(&["create"]).inc();

        Ok(invoice.into())
    }

    #[instrument(skip(self))]
    pub async fn get_invoices(&self) -> Result<Vec<InvoiceResponse>, AppError> {
        let invoices = self.invoices.get_all_invoices().await?;
        Ok(invoices.into_iter().map(InvoiceResponse::from).collect())
    }

    /// `None` lists every invoice; otherwise the filters are validated first.
    #[instrument(skip(self))]
    pub async fn get_filtered_invoices(
        &self,
        filters: Option<&InvoiceFilters>,
    ) -> Result<Vec<InvoiceResponse>, AppError> {
        let Some(filters) = filters else {
            return self.get_invoices().await;
        };
        check(filters.validate_request())?;

        let invoices = self
            .invoices
            .get_filtered_invoices(&filters.to_list_filter())
            .await?;
        Ok(invoices.into_iter().map(InvoiceResponse::from).collect())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice_by_invoice_id(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceResponse>, AppError> {
        let invoice = self.invoices.get_invoice_by_invoice_id(invoice_id).await?;
        Ok(invoice.map(InvoiceResponse::from))
    }

    /// Change due date and customer details. Number and total are kept.
    #[instrument(skip(self, request), fields(invoice_id = %request.invoice_id))]
    pub async fn update_invoice(
        &self,
        request: &InvoiceUpdateRequest,
    ) -> Result<InvoiceResponse, AppError> {
        check(request.validate_request())?;
        let Some(due_date) = request.due_date else {
            return Err(AppError::BadRequest(anyhow::anyhow!("Due Date is required")));
        };

        let invoice = self
            .invoices
            .update_invoice(&request.to_update_invoice(due_date))
            .await?
            .ok_or_else(|| not_found(format!("Invoice {} not found", request.invoice_id)))?;

        INVOICES_TOTAL.with_label_values(&["update"]).inc();

        Ok(invoice.into())
    }

    /// Delete an invoice and its products. `false` if nothing was deleted.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn delete_invoice_by_invoice_id(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let deleted = self.invoices.delete_invoice_by_invoice_id(invoice_id).await?;
        if deleted {
            INVOICES_TOTAL.with_label_values(&["delete"]).inc();
        }
        Ok(deleted)
    }

    /// Reserve the next invoice number, e.g. `IV00001` for a fresh counter.
    #[instrument(skip(self))]
    pub async fn generate_invoice_number(&self) -> Result<String, AppError> {
        let missing_counter =
            || AppError::InternalError(anyhow::anyhow!("Can't generate invoice running number."));

        self.running_numbers
            .get_running_number(RunningNumberType::Invoice)
            .await?
            .ok_or_else(missing_counter)?;

        let previous = self
            .running_numbers
            .increase_running_number(RunningNumberType::Invoice)
            .await?
            .ok_or_else(missing_counter)?;

        let invoice_number = next_running_number(&previous.prefix, previous.current_running);
        info!(invoice_number = %invoice_number, "Invoice number generated");

        Ok(invoice_number)
    }

    /// Spreadsheet of the selected invoices, ordered by invoice number.
    #[instrument(skip(self, invoice_ids), fields(count = invoice_ids.len()))]
    pub async fn get_invoices_excel(&self, invoice_ids: &[Uuid]) -> Result<Vec<u8>, AppError> {
        if invoice_ids.is_empty() {
            EXPORTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(EMPTY_EXPORT_MESSAGE)));
        }

        let invoices = self.invoices.get_invoices_by_invoice_ids(invoice_ids).await?;
        let workbook = build_invoices_workbook(&invoices).inspect_err(|_| {
            EXPORTS_TOTAL.with_label_values(&["failed"]).inc();
        })?;

        EXPORTS_TOTAL.with_label_values(&["success"]).inc();
        info!(rows = invoices.len(), "Invoices exported");

        Ok(workbook)
    }
}
