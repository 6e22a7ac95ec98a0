//! HTTP handlers: HTML pages, the JSON API and health endpoints.

pub mod api;
pub mod health;
pub mod pages;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::services::{EXPORT_FILE_NAME, XLSX_CONTENT_TYPE};

/// Spreadsheet download response.
pub(crate) fn xlsx_attachment(bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response()
}
