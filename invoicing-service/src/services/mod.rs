//! Business services for invoicing-service.

pub mod export;
mod invoice_products;
mod invoices;
pub mod metrics;

pub use export::{build_invoices_workbook, EXPORT_FILE_NAME, XLSX_CONTENT_TYPE};
pub use invoice_products::InvoiceProductsService;
pub use invoices::InvoicesService;
pub use metrics::{get_metrics, init_metrics};

use service_core::error::AppError;
use validator::ValidationErrors;

use metrics::ERRORS_TOTAL;

/// Count `err` under its kind label and hand it back.
pub(crate) fn counted(err: AppError) -> AppError {
    ERRORS_TOTAL.with_label_values(&[err.kind()]).inc();
    err
}

/// Convert a DTO validation result into an `AppError`, counting failures.
pub(crate) fn check(result: Result<(), ValidationErrors>) -> Result<(), AppError> {
    result.map_err(|errors| counted(AppError::ValidationError(errors)))
}

pub(crate) fn not_found(message: String) -> AppError {
    counted(AppError::NotFound(anyhow::anyhow!(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_counted(kind: &str) -> f64 {
        ERRORS_TOTAL.with_label_values(&[kind]).get()
    }

    #[test]
    fn failures_are_counted_by_kind() {
        let validation_before = errors_counted("validation");
        let not_found_before = errors_counted("not_found");
        let bad_request_before = errors_counted("bad_request");

        let mut errors = ValidationErrors::new();
        errors.add("quantity", validator::ValidationError::new("range"));
        assert!(matches!(check(Err(errors)), Err(AppError::ValidationError(_))));
        assert!(check(Ok(())).is_ok());
        assert!(matches!(
            not_found("Invoice missing".to_string()),
            AppError::NotFound(_)
        ));
        counted(AppError::BadRequest(anyhow::anyhow!("nothing selected")));

        assert!(errors_counted("validation") > validation_before);
        assert!(errors_counted("not_found") > not_found_before);
        assert!(errors_counted("bad_request") > bad_request_before);
    }
}
