#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use invoicing_service::config::InvoicingConfig;
use invoicing_service::startup::{build_router, AppState};
use serde_json::Value;
use std::io::{Cursor, Read};
use tower::util::ServiceExt;

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Router over a fresh in-memory store seeded with the `IV` counter.
    pub fn spawn() -> Self {
        let state = AppState::in_memory(InvoicingConfig::default());
        TestApp {
            router: build_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response {
        self.json("POST", uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: &Value) -> Response {
        self.json("PUT", uri, body).await
    }

    async fn json(&self, method: &str, uri: &str, body: &Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Submit `fields` the way a browser posts an HTML form.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Create an invoice through the API and return its JSON.
    pub async fn create_invoice(&self, customer_name: &str, due_in_days: i64) -> Value {
        let response = self
            .post_json(
                "/api/invoices",
                &serde_json::json!({
                    "due_date": days_from_today(due_in_days),
                    "customer_name": customer_name,
                    "customer_address": "1 Main Street",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Add a product to `invoice_id` through the API and return its JSON.
    pub async fn add_product(&self, invoice_id: &str, name: &str, price: &str, quantity: i32) -> Value {
        let response = self
            .post_json(
                &format!("/api/invoices/{}/products", invoice_id),
                &serde_json::json!({
                    "product_name": name,
                    "product_price": price,
                    "quantity": quantity,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }
}

pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
        .to_string()
}

/// Read one XML part out of an xlsx workbook.
pub fn xlsx_part(workbook: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(workbook)).unwrap();
    let mut xml = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}
