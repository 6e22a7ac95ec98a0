//! Server-rendered invoice pages.
//!
//! Invalid form submissions re-render the form with the submitted values and
//! the validation messages; unknown ids send the browser back to the list.

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use super::xlsx_attachment;
use crate::dtos::{
    error_messages, ExportExcelForm, InvoiceAddRequest, InvoiceFilters, InvoiceProductAddRequest,
    InvoiceProductUpdateRequest, InvoiceResponse, InvoiceUpdateRequest,
};
use crate::startup::AppState;
use crate::views::{FilterFormView, InvoiceFormView, InvoiceView, NewProductView};

const INDEX_PATH: &str = "/invoices";
const INVALID_FILTER_DATES: &str = "Due Date filters must be valid dates";

#[derive(Template)]
#[template(path = "invoices/index.html")]
pub struct IndexTemplate {
    pub invoices: Vec<InvoiceView>,
    pub filters: FilterFormView,
    pub errors: Vec<String>,
}

impl IndexTemplate {
    fn new(invoices: &[InvoiceResponse], filters: FilterFormView, errors: Vec<String>) -> Self {
        Self {
            invoices: invoices.iter().map(InvoiceView::from).collect(),
            filters,
            errors,
        }
    }
}

#[derive(Template)]
#[template(path = "invoices/create.html")]
pub struct CreateTemplate {
    pub form: InvoiceFormView,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "invoices/edit.html")]
pub struct EditTemplate {
    pub form: InvoiceFormView,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "invoices/detail.html")]
pub struct DetailTemplate {
    pub invoice: InvoiceView,
    pub new_product: NewProductView,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "invoices/print.html")]
pub struct PrintTemplate {
    pub invoice: InvoiceView,
    pub company_name: String,
    pub company_address: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteInvoiceForm {
    pub invoice_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DeleteInvoiceProductForm {
    pub invoice_product_id: Uuid,
    #[serde(default)]
    pub invoice_id: Option<Uuid>,
}

fn detail_path(invoice_id: Uuid) -> String {
    format!("/invoices/detail/{}", invoice_id)
}

fn to_index() -> Response {
    Redirect::to(INDEX_PATH).into_response()
}

fn to_detail(invoice_id: Uuid) -> Response {
    Redirect::to(&detail_path(invoice_id)).into_response()
}

fn rerender(status: StatusCode, template: impl IntoResponse) -> Response {
    (status, template).into_response()
}

/// Detail page of `invoice_id` with `errors` shown, or the list if the
/// invoice is gone.
async fn detail_with_errors(
    state: &AppState,
    invoice_id: Uuid,
    new_product: NewProductView,
    errors: Vec<String>,
) -> Result<Response, AppError> {
    match state
        .invoices_service
        .get_invoice_by_invoice_id(invoice_id)
        .await?
    {
        Some(invoice) => Ok(rerender(
            StatusCode::UNPROCESSABLE_ENTITY,
            DetailTemplate {
                invoice: InvoiceView::from(&invoice),
                new_product,
                errors,
            },
        )),
        None => Ok(to_index()),
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let invoices = state.invoices_service.get_invoices().await?;
    Ok(IndexTemplate::new(&invoices, FilterFormView::default(), Vec::new()).into_response())
}

pub async fn filter_results(
    State(state): State<AppState>,
    filters: Result<Form<InvoiceFilters>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(filters) = match filters {
        Ok(filters) => filters,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable filter form");
            let invoices = state.invoices_service.get_invoices().await?;
            return Ok(rerender(
                StatusCode::UNPROCESSABLE_ENTITY,
                IndexTemplate::new(
                    &invoices,
                    FilterFormView::default(),
                    vec![INVALID_FILTER_DATES.to_string()],
                ),
            ));
        }
    };
    let form = FilterFormView::from(&filters);
    match state
        .invoices_service
        .get_filtered_invoices(Some(&filters))
        .await
    {
        Ok(invoices) => Ok(IndexTemplate::new(&invoices, form, Vec::new()).into_response()),
        Err(AppError::ValidationError(errors)) => {
            let invoices = state.invoices_service.get_invoices().await?;
            Ok(rerender(
                StatusCode::UNPROCESSABLE_ENTITY,
                IndexTemplate::new(&invoices, form, error_messages(&errors)),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn create_page() -> impl IntoResponse {
    CreateTemplate {
        form: InvoiceFormView::default(),
        errors: Vec::new(),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Form(request): Form<InvoiceAddRequest>,
) -> Result<Response, AppError> {
    match state.invoices_service.add_invoice(&request).await {
        Ok(invoice) => Ok(to_detail(invoice.invoice_id)),
        Err(AppError::ValidationError(errors)) => Ok(rerender(
            StatusCode::UNPROCESSABLE_ENTITY,
            CreateTemplate {
                form: InvoiceFormView::from(&request),
                errors: error_messages(&errors),
            },
        )),
        Err(e) => Err(e),
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(invoice) = state
        .invoices_service
        .get_invoice_by_invoice_id(invoice_id)
        .await?
    else {
        return Ok(to_index());
    };

    Ok(EditTemplate {
        form: InvoiceFormView::from(&invoice.to_update_request()),
        errors: Vec::new(),
    }
    .into_response())
}

pub async fn edit(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Form(mut request): Form<InvoiceUpdateRequest>,
) -> Result<Response, AppError> {
    request.invoice_id = invoice_id;
    match state.invoices_service.update_invoice(&request).await {
        Ok(invoice) => Ok(to_detail(invoice.invoice_id)),
        Err(AppError::ValidationError(errors)) => Ok(rerender(
            StatusCode::UNPROCESSABLE_ENTITY,
            EditTemplate {
                form: InvoiceFormView::from(&request),
                errors: error_messages(&errors),
            },
        )),
        Err(AppError::NotFound(_)) => Ok(to_index()),
        Err(e) => Err(e),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Form(form): Form<DeleteInvoiceForm>,
) -> Result<Response, AppError> {
    state
        .invoices_service
        .delete_invoice_by_invoice_id(form.invoice_id)
        .await?;
    Ok(to_index())
}

pub async fn detail(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(invoice) = state
        .invoices_service
        .get_invoice_by_invoice_id(invoice_id)
        .await?
    else {
        return Ok(to_index());
    };

    Ok(DetailTemplate {
        invoice: InvoiceView::from(&invoice),
        new_product: NewProductView {
            quantity: "1".to_string(),
            ..Default::default()
        },
        errors: Vec::new(),
    }
    .into_response())
}

pub async fn export_excel(
    State(state): State<AppState>,
    axum_extra::extract::Form(form): axum_extra::extract::Form<ExportExcelForm>,
) -> Result<Response, AppError> {
    match state
        .invoices_service
        .get_invoices_excel(&form.selected_invoice)
        .await
    {
        Ok(bytes) => Ok(xlsx_attachment(bytes)),
        Err(AppError::BadRequest(message)) => {
            let invoices = state.invoices_service.get_invoices().await?;
            Ok(rerender(
                StatusCode::BAD_REQUEST,
                IndexTemplate::new(
                    &invoices,
                    FilterFormView::default(),
                    vec![message.to_string()],
                ),
            ))
        }
        Err(e) => Err(e),
    }
}

pub async fn add_invoice_product(
    State(state): State<AppState>,
    Form(request): Form<InvoiceProductAddRequest>,
) -> Result<Response, AppError> {
    match state
        .invoice_products_service
        .add_invoice_product(&request)
        .await
    {
        Ok(product) => Ok(to_detail(product.invoice_id)),
        Err(AppError::ValidationError(errors)) => {
            detail_with_errors(
                &state,
                request.invoice_id,
                NewProductView::from(&request),
                error_messages(&errors),
            )
            .await
        }
        Err(AppError::NotFound(_)) => Ok(to_index()),
        Err(e) => Err(e),
    }
}

pub async fn update_invoice_product(
    State(state): State<AppState>,
    Form(request): Form<InvoiceProductUpdateRequest>,
) -> Result<Response, AppError> {
    match state
        .invoice_products_service
        .update_invoice_product(&request)
        .await
    {
        Ok(product) => Ok(to_detail(product.invoice_id)),
        Err(AppError::ValidationError(errors)) => {
            detail_with_errors(
                &state,
                request.invoice_id,
                NewProductView::default(),
                error_messages(&errors),
            )
            .await
        }
        Err(AppError::NotFound(_)) if !request.invoice_id.is_nil() => {
            Ok(to_detail(request.invoice_id))
        }
        Err(AppError::NotFound(_)) => Ok(to_index()),
        Err(e) => Err(e),
    }
}

pub async fn delete_invoice_product(
    State(state): State<AppState>,
    Form(form): Form<DeleteInvoiceProductForm>,
) -> Result<Response, AppError> {
    match state
        .invoice_products_service
        .delete_invoice_product(form.invoice_product_id)
        .await
    {
        Ok(invoice_id) => Ok(to_detail(invoice_id)),
        Err(AppError::NotFound(_)) => Ok(form.invoice_id.map(to_detail).unwrap_or_else(to_index)),
        Err(e) => Err(e),
    }
}

pub async fn print(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let Some(invoice) = state
        .invoices_service
        .get_invoice_by_invoice_id(invoice_id)
        .await?
    else {
        return Ok(to_index());
    };

    Ok(PrintTemplate {
        invoice: InvoiceView::from(&invoice),
        company_name: state.config.company.name.clone(),
        company_address: state.config.company.address.clone(),
    }
    .into_response())
}
