//! Request and response types for the HTML forms and the JSON API.

mod filters;
mod invoice_products;
mod invoices;
pub mod validation;

pub use filters::{ExportExcelForm, ExportInvoicesRequest, InvoiceFilters};
pub use invoice_products::{
    InvoiceProductAddRequest, InvoiceProductResponse, InvoiceProductUpdateRequest,
};
pub use invoices::{InvoiceAddRequest, InvoiceResponse, InvoiceUpdateRequest};
pub use validation::error_messages;

use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

/// Treat an empty form value (`due_date=`) as a missing one.
pub(crate) fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Lenient form value: a missing, blank or unparsable input is `None`, so
/// validation can report it against the field instead of the whole form
/// being rejected. Accepts native JSON values as well as text.
pub(crate) fn parse_or_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<V> {
        Value(V),
        Text(String),
    }

    Ok(match Option::<Raw<T>>::deserialize(de)? {
        Some(Raw::Value(value)) => Some(value),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}
