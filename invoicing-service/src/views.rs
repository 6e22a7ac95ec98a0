//! Display models for the HTML pages.
//!
//! Templates only print strings; dates and money are formatted here.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::dtos::{
    InvoiceAddRequest, InvoiceFilters, InvoiceProductAddRequest, InvoiceProductResponse,
    InvoiceResponse, InvoiceUpdateRequest,
};

/// Due dates are shown as `MM/dd/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Value for `<input type="date">`.
pub fn format_date_input(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `$1,234.50` style currency with thousands separators.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", sign, grouped, cents)
}

#[derive(Debug, Clone)]
pub struct InvoiceView {
    pub invoice_id: String,
    pub invoice_number: String,
    pub due_date: String,
    pub customer_name: String,
    pub customer_address: String,
    pub total_price: String,
    pub products: Vec<InvoiceProductView>,
}

impl From<&InvoiceResponse> for InvoiceView {
    fn from(invoice: &InvoiceResponse) -> Self {
        Self {
            invoice_id: invoice.invoice_id.to_string(),
            invoice_number: invoice.invoice_number.clone(),
            due_date: format_date(invoice.due_date),
            customer_name: invoice.customer_name.clone(),
            customer_address: invoice.customer_address.clone(),
            total_price: format_currency(invoice.total_price),
            products: invoice
                .invoice_products
                .iter()
                .map(InvoiceProductView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceProductView {
    pub invoice_product_id: String,
    pub invoice_id: String,
    pub product_name: String,
    /// Raw value for the inline edit form.
    pub product_price_input: String,
    pub product_price: String,
    pub quantity: i32,
    pub total_price: String,
}

impl From<&InvoiceProductResponse> for InvoiceProductView {
    fn from(product: &InvoiceProductResponse) -> Self {
        Self {
            invoice_product_id: product.invoice_product_id.to_string(),
            invoice_id: product.invoice_id.to_string(),
            product_name: product.product_name.clone(),
            product_price_input: product.product_price.normalize().to_string(),
            product_price: format_currency(product.product_price),
            quantity: product.quantity,
            total_price: format_currency(product.total_price),
        }
    }
}

/// Values of the create/edit form, kept as typed so they can be re-shown.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFormView {
    pub invoice_id: String,
    pub invoice_number: String,
    pub due_date: String,
    pub customer_name: String,
    pub customer_address: String,
}

impl From<&InvoiceAddRequest> for InvoiceFormView {
    fn from(request: &InvoiceAddRequest) -> Self {
        Self {
            due_date: format_date_input(request.due_date),
            customer_name: request.customer_name.clone(),
            customer_address: request.customer_address.clone(),
            ..Default::default()
        }
    }
}

impl From<&InvoiceUpdateRequest> for InvoiceFormView {
    fn from(request: &InvoiceUpdateRequest) -> Self {
        Self {
            invoice_id: request.invoice_id.to_string(),
            invoice_number: request.invoice_number.clone().unwrap_or_default(),
            due_date: format_date_input(request.due_date),
            customer_name: request.customer_name.clone(),
            customer_address: request.customer_address.clone(),
        }
    }
}

/// Values of the add-product form on the detail page.
#[derive(Debug, Clone, Default)]
pub struct NewProductView {
    pub product_name: String,
    pub product_price: String,
    pub quantity: String,
}

impl From<&InvoiceProductAddRequest> for NewProductView {
    fn from(request: &InvoiceProductAddRequest) -> Self {
        Self {
            product_name: request.product_name.clone(),
            product_price: request
                .product_price
                .map(|price| price.normalize().to_string())
                .unwrap_or_default(),
            quantity: request
                .quantity
                .map(|quantity| quantity.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterFormView {
    pub invoice_number: String,
    pub customer_name: String,
    pub from_due_date: String,
    pub to_due_date: String,
}

impl From<&InvoiceFilters> for FilterFormView {
    fn from(filters: &InvoiceFilters) -> Self {
        Self {
            invoice_number: filters.invoice_number.clone().unwrap_or_default(),
            customer_name: filters.customer_name.clone().unwrap_or_default(),
            from_due_date: format_date_input(filters.from_due_date),
            to_due_date: format_date_input(filters.to_due_date),
        }
    }
}
