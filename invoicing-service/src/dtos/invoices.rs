use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::parse_or_none;
use super::invoice_products::InvoiceProductResponse;
use super::validation::{check_due_date, derived_errors, finish, require_id, require_text};
use crate::models::{CreateInvoice, Invoice, UpdateInvoice};

/// Request to create an invoice. The invoice number is generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InvoiceAddRequest {
    #[serde(default, deserialize_with = "parse_or_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Customer Name must not exceed 200 characters"))]
    pub customer_name: String,

    #[serde(default)]
    #[validate(length(max = 400, message = "Customer Address must not exceed 400 characters"))]
    pub customer_address: String,
}

impl InvoiceAddRequest {
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        check_due_date(&mut errors, self.due_date);
        require_text(&mut errors, "customer_name", "Customer Name", &self.customer_name);
        require_text(
            &mut errors,
            "customer_address",
            "Customer Address",
            &self.customer_address,
        );
        finish(errors)
    }

    /// Repository input for a request that already passed validation.
    pub(crate) fn to_create_invoice(
        &self,
        invoice_number: String,
        due_date: NaiveDate,
    ) -> CreateInvoice {
        CreateInvoice {
            invoice_number,
            due_date,
            customer_name: self.customer_name.trim().to_string(),
            customer_address: self.customer_address.trim().to_string(),
        }
    }
}

/// Request to update an invoice's due date and customer details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InvoiceUpdateRequest {
    #[serde(default)]
    pub invoice_id: Uuid,

    /// Display only; the number never changes after creation.
    #[serde(default)]
    pub invoice_number: Option<String>,

    #[serde(default, deserialize_with = "parse_or_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Customer Name must not exceed 200 characters"))]
    pub customer_name: String,

    #[serde(default)]
    #[validate(length(max = 400, message = "Customer Address must not exceed 400 characters"))]
    pub customer_address: String,
}

impl InvoiceUpdateRequest {
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        require_id(&mut errors, "invoice_id", "Invoice Id", self.invoice_id);
        check_due_date(&mut errors, self.due_date);
        require_text(&mut errors, "customer_name", "Customer Name", &self.customer_name);
        require_text(
            &mut errors,
            "customer_address",
            "Customer Address",
            &self.customer_address,
        );
        finish(errors)
    }

    /// Repository input for a request that already passed validation.
    pub(crate) fn to_update_invoice(&self, due_date: NaiveDate) -> UpdateInvoice {
        UpdateInvoice {
            invoice_id: self.invoice_id,
            due_date,
            customer_name: self.customer_name.trim().to_string(),
            customer_address: self.customer_address.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
    pub total_price: Decimal,
    pub invoice_products: Vec<InvoiceProductResponse>,
}

impl InvoiceResponse {
    pub fn to_update_request(&self) -> InvoiceUpdateRequest {
        InvoiceUpdateRequest {
            invoice_id: self.invoice_id,
            invoice_number: Some(self.invoice_number.clone()),
            due_date: Some(self.due_date),
            customer_name: self.customer_name.clone(),
            customer_address: self.customer_address.clone(),
        }
    }
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            due_date: invoice.due_date,
            customer_name: invoice.customer_name,
            customer_address: invoice.customer_address,
            total_price: invoice.total_price,
            invoice_products: invoice
                .invoice_products
                .into_iter()
                .map(InvoiceProductResponse::from)
                .collect(),
        }
    }
}
