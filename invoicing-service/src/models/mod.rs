//! Domain models for invoicing-service.

mod invoice;
mod invoice_product;
mod running_number;

pub use invoice::{CreateInvoice, Invoice, ListInvoicesFilter, UpdateInvoice};
pub use invoice_product::{CreateInvoiceProduct, InvoiceProduct, UpdateInvoiceProduct};
pub use running_number::{
    next_running_number, RunningNumber, RunningNumberType, RUNNING_NUMBER_WIDTH,
};
