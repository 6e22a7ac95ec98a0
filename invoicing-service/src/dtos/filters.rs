use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationErrors;

use super::empty_string_as_none;
use super::validation::{error, finish};
use crate::models::ListInvoicesFilter;

/// Search criteria for the invoice list. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFilters {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub invoice_number: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub customer_name: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub from_due_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub to_due_date: Option<NaiveDate>,
}

impl InvoiceFilters {
    pub fn validate_request(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let (Some(from), Some(to)) = (self.from_due_date, self.to_due_date) {
            if to < from {
                errors.add(
                    "to_due_date",
                    error(
                        "date_range",
                        "To Due Date should be newer than or equal to From Due Date",
                    ),
                );
            }
        }
        finish(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.to_list_filter() == ListInvoicesFilter::default()
    }

    pub(crate) fn to_list_filter(&self) -> ListInvoicesFilter {
        fn non_blank(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        ListInvoicesFilter {
            invoice_number: non_blank(&self.invoice_number),
            customer_name: non_blank(&self.customer_name),
            from_due_date: self.from_due_date,
            to_due_date: self.to_due_date,
        }
    }
}

/// JSON body for `POST /api/invoices/export`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportInvoicesRequest {
    #[serde(default)]
    pub invoice_ids: Vec<Uuid>,
}

/// Form body of the list page's export button: one `selected_invoice`
/// entry per ticked row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportExcelForm {
    #[serde(default)]
    pub selected_invoice: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_query_gives_empty_filter() {
        let filters: InvoiceFilters =
            serde_urlencoded::from_str("invoice_number=&customer_name=&from_due_date=&to_due_date=")
                .unwrap();
        assert!(filters.is_empty());
        assert!(filters.validate_request().is_ok());
    }

    #[test]
    fn blank_text_is_dropped_from_list_filter() {
        let filters = InvoiceFilters {
            invoice_number: Some("  ".to_string()),
            customer_name: Some(" acme ".to_string()),
            ..Default::default()
        };
        let list = filters.to_list_filter();
        assert_eq!(list.invoice_number, None);
        assert_eq!(list.customer_name.as_deref(), Some("acme"));
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let filters = InvoiceFilters {
            from_due_date: Some(date(2030, 5, 2)),
            to_due_date: Some(date(2030, 5, 1)),
            ..Default::default()
        };
        let errors = filters.validate_request().unwrap_err();
        assert!(errors.field_errors().contains_key("to_due_date"));
    }

    #[test]
    fn same_day_range_is_allowed() {
        let filters = InvoiceFilters {
            from_due_date: Some(date(2030, 5, 1)),
            to_due_date: Some(date(2030, 5, 1)),
            ..Default::default()
        };
        assert!(filters.validate_request().is_ok());
    }

    #[test]
    fn query_dates_are_parsed() {
        let filters: InvoiceFilters =
            serde_urlencoded::from_str("from_due_date=2030-01-31&invoice_number=IV0").unwrap();
        assert_eq!(filters.from_due_date, Some(date(2030, 1, 31)));
        assert_eq!(filters.invoice_number.as_deref(), Some("IV0"));
        assert_eq!(filters.to_due_date, None);
    }
}
