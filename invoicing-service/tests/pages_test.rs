mod common;

use axum::http::{header, StatusCode};
use common::{body_bytes, body_text, days_from_today, location, xlsx_part, TestApp};

fn content_type(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn index_lists_invoices() {
    let app = TestApp::spawn();
    app.create_invoice("Acme", 7).await;

    for uri in ["/", "/invoices", "/invoices/index"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/html"));

        let html = body_text(response).await;
        assert!(html.contains("IV00001"));
        assert!(html.contains("Acme"));
    }
}

#[tokio::test]
async fn create_form_redirects_to_detail() {
    let app = TestApp::spawn();

    assert_eq!(app.get("/invoices/create").await.status(), StatusCode::OK);

    let due = days_from_today(10).to_string();
    let response = app
        .post_form(
            "/invoices/create",
            &[
                ("due_date", due.as_str()),
                ("customer_name", "Acme"),
                ("customer_address", "1 Main Street"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let detail = location(&response);
    assert!(detail.starts_with("/invoices/detail/"));

    let html = body_text(app.get(&detail).await).await;
    assert!(html.contains("Invoice IV00001"));
    assert!(html.contains("1 Main Street"));
}

#[tokio::test]
async fn invalid_create_form_is_shown_again() {
    let app = TestApp::spawn();

    let response = app
        .post_form(
            "/invoices/create",
            &[
                ("due_date", ""),
                ("customer_name", "Acme"),
                ("customer_address", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Due Date should be newer than or equal to today"));
    assert!(html.contains("Customer Address is required"));
    assert!(html.contains("value=\"Acme\""));
}

#[tokio::test]
async fn edit_form_updates_customer() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();
    let uri = format!("/invoices/edit/{}", id);

    let html = body_text(app.get(&uri).await).await;
    assert!(html.contains("Edit Invoice IV00001"));

    let due = days_from_today(21).to_string();
    let response = app
        .post_form(
            &uri,
            &[
                ("invoice_number", "IV99999"),
                ("due_date", due.as_str()),
                ("customer_name", "Acme Corp"),
                ("customer_address", "2 Side Road"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(app.get(&location(&response)).await).await;
    assert!(html.contains("Acme Corp"));
    assert!(html.contains("Invoice IV00001"));
}

#[tokio::test]
async fn unknown_invoice_pages_redirect_to_index() {
    let app = TestApp::spawn();
    let id = uuid::Uuid::new_v4();

    for uri in [
        format!("/invoices/detail/{}", id),
        format!("/invoices/edit/{}", id),
        format!("/invoices/print/{}", id),
    ] {
        let response = app.get(&uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/invoices");
    }
}

#[tokio::test]
async fn delete_form_removes_invoice() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = app
        .post_form("/invoices/delete", &[("invoice_id", id)])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/invoices");

    let html = body_text(app.get("/invoices").await).await;
    assert!(!html.contains("IV00001"));
}

#[tokio::test]
async fn product_forms_update_detail_totals() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = app
        .post_form(
            "/invoices/add-invoice-product",
            &[
                ("invoice_id", id),
                ("product_name", "Widget"),
                ("product_price", "12.50"),
                ("quantity", "2"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let detail = location(&response);
    assert_eq!(detail, format!("/invoices/detail/{}", id));

    let html = body_text(app.get(&detail).await).await;
    assert!(html.contains("Widget"));
    assert!(html.contains("$25.00"));

    let product = app.add_product(id, "Gadget", "1000", 2).await;
    let product_id = product["invoice_product_id"].as_str().unwrap();
    let html = body_text(app.get(&detail).await).await;
    assert!(html.contains("$2,025.00"));

    let response = app
        .post_form(
            "/invoices/update-invoice-product",
            &[
                ("invoice_product_id", product_id),
                ("invoice_id", id),
                ("product_name", "Gadget"),
                ("product_price", "1000"),
                ("quantity", "1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.get(&detail).await).await;
    assert!(html.contains("$1,025.00"));

    let response = app
        .post_form(
            "/invoices/delete-invoice-product",
            &[("invoice_product_id", product_id), ("invoice_id", id)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);
    let html = body_text(app.get(&detail).await).await;
    assert!(!html.contains("Gadget"));
}

#[tokio::test]
async fn invalid_product_form_shows_errors_on_detail() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = app
        .post_form(
            "/invoices/add-invoice-product",
            &[
                ("invoice_id", id),
                ("product_name", "Widget"),
                ("product_price", "2000000"),
                ("quantity", "0"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Invoice IV00001"));
    assert!(html.contains("Product Price must be between"));
    assert!(html.contains("Product Quantity must be between 1 and 1000"));
}

#[tokio::test]
async fn blank_product_numbers_show_errors_on_detail() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = app
        .post_form(
            "/invoices/add-invoice-product",
            &[
                ("invoice_id", id),
                ("product_name", "Widget"),
                ("product_price", ""),
                ("quantity", "two"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Invoice IV00001"));
    assert!(html.contains("<li>Product Price is required</li>"));
    assert!(html.contains("<li>Product Quantity is required</li>"));
}

#[tokio::test]
async fn blank_product_numbers_on_update_show_errors_on_detail() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();
    let product = app.add_product(id, "Gadget", "10", 2).await;
    let product_id = product["invoice_product_id"].as_str().unwrap();

    let response = app
        .post_form(
            "/invoices/update-invoice-product",
            &[
                ("invoice_product_id", product_id),
                ("invoice_id", id),
                ("product_name", "Gadget"),
                ("product_price", "ten"),
                ("quantity", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("<li>Product Price is required</li>"));
    assert!(html.contains("<li>Product Quantity is required</li>"));
    assert!(html.contains("$20.00"));
}

#[tokio::test]
async fn product_price_with_fractional_cents_is_shown_again() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    let id = invoice["invoice_id"].as_str().unwrap();

    let response = app
        .post_form(
            "/invoices/add-invoice-product",
            &[
                ("invoice_id", id),
                ("product_name", "Widget"),
                ("product_price", "1.005"),
                ("quantity", "3"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Product Price must have at most 2 decimal places"));
}

#[tokio::test]
async fn malformed_due_date_is_shown_again() {
    let app = TestApp::spawn();

    let response = app
        .post_form(
            "/invoices/create",
            &[
                ("due_date", "tomorrow"),
                ("customer_name", "Acme"),
                ("customer_address", "1 Main Street"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Due Date should be newer than or equal to today"));
    assert!(html.contains("value=\"Acme\""));

    let invoice = app.create_invoice("Globex", 7).await;
    let uri = format!("/invoices/edit/{}", invoice["invoice_id"].as_str().unwrap());
    let response = app
        .post_form(
            &uri,
            &[
                ("due_date", "31/12/2030"),
                ("customer_name", "Globex"),
                ("customer_address", "2 Side Road"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("Due Date should be newer than or equal to today"));
    assert!(html.contains("value=\"Globex\""));
}

#[tokio::test]
async fn filter_form_narrows_list() {
    let app = TestApp::spawn();
    app.create_invoice("Acme", 5).await;
    app.create_invoice("Globex", 20).await;

    let response = app
        .post_form(
            "/invoices/filter-results",
            &[
                ("invoice_number", ""),
                ("customer_name", "glob"),
                ("from_due_date", ""),
                ("to_due_date", ""),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("IV00002"));
    assert!(!html.contains("IV00001"));
    assert!(html.contains("value=\"glob\""));
}

#[tokio::test]
async fn filter_form_rejects_inverted_range() {
    let app = TestApp::spawn();
    app.create_invoice("Acme", 5).await;

    let from = days_from_today(10).to_string();
    let to = days_from_today(2).to_string();
    let response = app
        .post_form(
            "/invoices/filter-results",
            &[("from_due_date", from.as_str()), ("to_due_date", to.as_str())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("To Due Date should be newer than or equal to From Due Date"));
    assert!(html.contains("IV00001"));
}

#[tokio::test]
async fn filter_form_with_malformed_date_is_shown_again() {
    let app = TestApp::spawn();
    app.create_invoice("Acme", 5).await;

    let response = app
        .post_form(
            "/invoices/filter-results",
            &[("customer_name", "acme"), ("from_due_date", "notadate")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("<li>Due Date filters must be valid dates</li>"));
    assert!(html.contains("IV00001"));
}

#[tokio::test]
async fn export_form_downloads_selected_invoices() {
    let app = TestApp::spawn();
    let first = app.create_invoice("Acme", 5).await;
    let second = app.create_invoice("Globex", 6).await;

    let response = app
        .post_form(
            "/invoices/export-excel",
            &[
                ("selected_invoice", first["invoice_id"].as_str().unwrap()),
                ("selected_invoice", second["invoice_id"].as_str().unwrap()),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        content_type(&response),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..2], b"PK");

    let strings = xlsx_part(&bytes, "xl/sharedStrings.xml");
    let at = |text: &str| strings.find(&format!(">{}<", text)).unwrap();
    assert!(at("IV00001") < at("IV00002"));
    at("Acme");
    at("Globex");
    at(&days_from_today(5).format("%m/%d/%Y").to_string());
}

#[tokio::test]
async fn export_form_without_selection_shows_message() {
    let app = TestApp::spawn();

    let response = app.post_form("/invoices/export-excel", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let html = body_text(response).await;
    assert!(html.contains("<ul class=\"errors\">"));
    assert!(html.contains("<li>Please select invoices for export.</li>"));
}

#[tokio::test]
async fn print_page_shows_company_letterhead() {
    let app = TestApp::spawn();
    let invoice = app.create_invoice("Acme", 7).await;
    app.add_product(invoice["invoice_id"].as_str().unwrap(), "Widget", "10", 3)
        .await;

    let response = app
        .get(&format!(
            "/invoices/print/{}",
            invoice["invoice_id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Invoices Inc."));
    assert!(html.contains("IV00001"));
    assert!(html.contains("Widget"));
    assert!(html.contains("$30.00"));
}

#[tokio::test]
async fn pages_allow_inline_styles() {
    let app = TestApp::spawn();

    let response = app.get("/invoices").await;
    let headers = response.headers();
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert!(headers
        .get(header::CONTENT_SECURITY_POLICY)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("'unsafe-inline'"));
}
