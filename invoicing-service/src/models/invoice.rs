//! Invoice model for invoicing-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::InvoiceProduct;

/// Invoice document with its line-item products.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
    /// Always the sum of `invoice_products[*].total_price`.
    pub total_price: Decimal,
    pub created_utc: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub invoice_products: Vec<InvoiceProduct>,
}

impl Invoice {
    /// Sum of the line totals of `products`.
    pub fn sum_line_totals(products: &[InvoiceProduct]) -> Decimal {
        products.iter().map(|p| p.total_price).sum()
    }
}

/// Filter parameters for listing invoices.
///
/// Text criteria match as case-insensitive substrings; date bounds are
/// inclusive. `None` disables a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInvoicesFilter {
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub from_due_date: Option<NaiveDate>,
    pub to_due_date: Option<NaiveDate>,
}

impl ListInvoicesFilter {
    /// Whether `invoice` satisfies every active criterion.
    pub fn matches(&self, invoice: &Invoice) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        if let Some(number) = &self.invoice_number {
            if !contains_ci(&invoice.invoice_number, number) {
                return false;
            }
        }
        if let Some(name) = &self.customer_name {
            if !contains_ci(&invoice.customer_name, name) {
                return false;
            }
        }
        if let Some(from) = self.from_due_date {
            if invoice.due_date < from {
                return false;
            }
        }
        if let Some(to) = self.to_due_date {
            if invoice.due_date > to {
                return false;
            }
        }
        true
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub invoice_number: String,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
}

/// Input for updating an invoice's header fields.
#[derive(Debug, Clone)]
pub struct UpdateInvoice {
    pub invoice_id: Uuid,
    pub due_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(number: &str, customer: &str, due: NaiveDate) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: number.to_string(),
            due_date: due,
            customer_name: customer.to_string(),
            customer_address: "1 Main Street".to_string(),
            total_price: Decimal::ZERO,
            created_utc: Utc::now(),
            invoice_products: Vec::new(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let inv = invoice("IV00001", "Acme", date(2030, 1, 1));
        assert!(ListInvoicesFilter::default().matches(&inv));
    }

    #[test]
    fn text_criteria_are_case_insensitive_substrings() {
        let inv = invoice("IV00012", "Acme Widgets", date(2030, 1, 1));

        let by_name = ListInvoicesFilter {
            customer_name: Some("widg".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&inv));

        let by_number = ListInvoicesFilter {
            invoice_number: Some("iv0001".to_string()),
            ..Default::default()
        };
        assert!(by_number.matches(&inv));

        let miss = ListInvoicesFilter {
            customer_name: Some("globex".to_string()),
            ..Default::default()
        };
        assert!(!miss.matches(&inv));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let inv = invoice("IV00001", "Acme", date(2030, 6, 15));

        let exact = ListInvoicesFilter {
            from_due_date: Some(date(2030, 6, 15)),
            to_due_date: Some(date(2030, 6, 15)),
            ..Default::default()
        };
        assert!(exact.matches(&inv));

        let after = ListInvoicesFilter {
            from_due_date: Some(date(2030, 6, 16)),
            ..Default::default()
        };
        assert!(!after.matches(&inv));

        let before = ListInvoicesFilter {
            to_due_date: Some(date(2030, 6, 14)),
            ..Default::default()
        };
        assert!(!before.matches(&inv));
    }
}
