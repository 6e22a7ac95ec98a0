use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::parse_or_none;
use super::validation::{
    check_product_price, check_quantity, derived_errors, finish, require_id, require_text,
};
use crate::models::{CreateInvoiceProduct, InvoiceProduct, UpdateInvoiceProduct};

/// Request to add a product line to an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InvoiceProductAddRequest {
    #[serde(default)]
    pub invoice_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 200, message = "Product Name must not exceed 200 characters"))]
    pub product_name: String,

    #[serde(default, deserialize_with = "parse_or_none")]
    pub product_price: Option<Decimal>,

    #[serde(default, deserialize_with = "parse_or_none")]
    pub quantity: Option<i32>,
}

impl InvoiceProductAddRequest {
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        require_id(&mut errors, "invoice_id", "Invoice Id", self.invoice_id);
        require_text(&mut errors, "product_name", "Product Name", &self.product_name);
        check_product_price(&mut errors, self.product_price);
        check_quantity(&mut errors, self.quantity);
        finish(errors)
    }

    /// Repository input; `None` while price or quantity is missing.
    pub(crate) fn to_create_invoice_product(&self) -> Option<CreateInvoiceProduct> {
        Some(CreateInvoiceProduct {
            invoice_id: self.invoice_id,
            product_name: self.product_name.trim().to_string(),
            product_price: self.product_price?,
            quantity: self.quantity?,
        })
    }
}

/// Request to change an existing product line.
///
/// `invoice_id` only routes the caller back to the owning invoice; the line
/// keeps the invoice it was created on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InvoiceProductUpdateRequest {
    #[serde(default)]
    pub invoice_product_id: Uuid,

    #[serde(default)]
    pub invoice_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 200, message = "Product Name must not exceed 200 characters"))]
    pub product_name: String,

    #[serde(default, deserialize_with = "parse_or_none")]
    pub product_price: Option<Decimal>,

    #[serde(default, deserialize_with = "parse_or_none")]
    pub quantity: Option<i32>,
}

impl InvoiceProductUpdateRequest {
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = derived_errors(self);
        require_id(
            &mut errors,
            "invoice_product_id",
            "Invoice Product Id",
            self.invoice_product_id,
        );
        require_id(&mut errors, "invoice_id", "Invoice Id", self.invoice_id);
        require_text(&mut errors, "product_name", "Product Name", &self.product_name);
        check_product_price(&mut errors, self.product_price);
        check_quantity(&mut errors, self.quantity);
        finish(errors)
    }

    pub(crate) fn to_update_invoice_product(&self) -> Option<UpdateInvoiceProduct> {
        Some(UpdateInvoiceProduct {
            invoice_product_id: self.invoice_product_id,
            product_name: self.product_name.trim().to_string(),
            product_price: self.product_price?,
            quantity: self.quantity?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceProductResponse {
    pub invoice_product_id: Uuid,
    pub invoice_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl InvoiceProductResponse {
    pub fn to_update_request(&self) -> InvoiceProductUpdateRequest {
        InvoiceProductUpdateRequest {
            invoice_product_id: self.invoice_product_id,
            invoice_id: self.invoice_id,
            product_name: self.product_name.clone(),
            product_price: Some(self.product_price),
            quantity: Some(self.quantity),
        }
    }
}

impl From<InvoiceProduct> for InvoiceProductResponse {
    fn from(product: InvoiceProduct) -> Self {
        Self {
            invoice_product_id: product.invoice_product_id,
            invoice_id: product.invoice_id,
            product_name: product.product_name,
            product_price: product.product_price,
            quantity: product.quantity,
            total_price: product.total_price,
        }
    }
}
