//! Invoice product (line item) model for invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Product line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceProduct {
    pub invoice_product_id: Uuid,
    pub invoice_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    /// `product_price * quantity`.
    pub total_price: Decimal,
    pub created_utc: DateTime<Utc>,
}

impl InvoiceProduct {
    pub fn line_total(product_price: Decimal, quantity: i32) -> Decimal {
        product_price * Decimal::from(quantity)
    }
}

/// Input for adding a product to an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceProduct {
    pub invoice_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
}

/// Input for updating a product line.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceProduct {
    pub invoice_product_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn line_total_is_price_times_quantity() {
        let price = Decimal::from_str("19.99").unwrap();
        assert_eq!(
            InvoiceProduct::line_total(price, 3),
            Decimal::from_str("59.97").unwrap()
        );
    }
}
