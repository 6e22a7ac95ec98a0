//! JSON API over the invoice services.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use super::xlsx_attachment;
use crate::dtos::{
    ExportInvoicesRequest, InvoiceAddRequest, InvoiceFilters, InvoiceProductAddRequest,
    InvoiceProductResponse, InvoiceProductUpdateRequest, InvoiceResponse, InvoiceUpdateRequest,
};
use crate::startup::AppState;

/// `GET /api/invoices`; query parameters narrow the list.
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(filters): Query<InvoiceFilters>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let filters = (!filters.is_empty()).then_some(&filters);
    let invoices = state.invoices_service.get_filtered_invoices(filters).await?;
    Ok(Json(invoices))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<InvoiceAddRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let invoice = state.invoices_service.add_invoice(&request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    state
        .invoices_service
        .get_invoice_by_invoice_id(invoice_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(mut request): Json<InvoiceUpdateRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    request.invoice_id = invoice_id;
    let invoice = state.invoices_service.update_invoice(&request).await?;
    Ok(Json(invoice))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state
        .invoices_service
        .delete_invoice_by_invoice_id(invoice_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Invoice {} not found",
            invoice_id
        )))
    }
}

pub async fn add_invoice_product(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(mut request): Json<InvoiceProductAddRequest>,
) -> Result<(StatusCode, Json<InvoiceProductResponse>), AppError> {
    request.invoice_id = invoice_id;
    let product = state
        .invoice_products_service
        .add_invoice_product(&request)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_invoice_product(
    State(state): State<AppState>,
    Path(invoice_product_id): Path<Uuid>,
    Json(mut request): Json<InvoiceProductUpdateRequest>,
) -> Result<Json<InvoiceProductResponse>, AppError> {
    request.invoice_product_id = invoice_product_id;
    let product = state
        .invoice_products_service
        .update_invoice_product(&request)
        .await?;
    Ok(Json(product))
}

pub async fn delete_invoice_product(
    State(state): State<AppState>,
    Path(invoice_product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .invoice_products_service
        .delete_invoice_product(invoice_product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_invoices(
    State(state): State<AppState>,
    Json(request): Json<ExportInvoicesRequest>,
) -> Result<Response, AppError> {
    let bytes = state
        .invoices_service
        .get_invoices_excel(&request.invoice_ids)
        .await?;
    Ok(xlsx_attachment(bytes))
}
