//! Spreadsheet export of selected invoices.

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, XlsxError};
use service_core::error::AppError;

use crate::models::Invoice;

pub const EXPORT_SHEET_NAME: &str = "InvoiceSheet";
pub const EXPORT_FILE_NAME: &str = "invoices.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 5] = [
    "Invoice Number",
    "Due Date",
    "Customer Name",
    "Customer Address",
    "Total Price",
];

/// Render `invoices` (already in export order) as an xlsx workbook.
pub fn build_invoices_workbook(invoices: &[Invoice]) -> Result<Vec<u8>, AppError> {
    write_workbook(invoices)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to build spreadsheet: {}", e)))
}

fn write_workbook(invoices: &[Invoice]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(0xD3D3D3));
    let money_format = Format::new().set_num_format("#,##0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (index, invoice) in invoices.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, &invoice.invoice_number)?;
        worksheet.write_string(row, 1, invoice.due_date.format("%m/%d/%Y").to_string())?;
        worksheet.write_string(row, 2, &invoice.customer_name)?;
        worksheet.write_string(row, 3, &invoice.customer_address)?;
        worksheet.write_number_with_format(
            row,
            4,
            invoice.total_price.to_f64().unwrap_or_default(),
            &money_format,
        )?;
    }

    worksheet.autofit();

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use std::io::{Cursor, Read};
    use uuid::Uuid;

    fn invoice(number: &str) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: number.to_string(),
            due_date: NaiveDate::from_ymd_opt(2030, 3, 9).unwrap(),
            customer_name: "Acme".to_string(),
            customer_address: "1 Main Street".to_string(),
            total_price: Decimal::new(123450, 2),
            created_utc: Utc::now(),
            invoice_products: Vec::new(),
        }
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let bytes = build_invoices_workbook(&[invoice("IV00001"), invoice("IV00002")]).unwrap();
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn header_only_workbook_still_renders() {
        let bytes = build_invoices_workbook(&[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn sheet_holds_headers_then_rows_in_given_order() {
        let bytes = build_invoices_workbook(&[invoice("IV00002"), invoice("IV00001")]).unwrap();

        let workbook = part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains("name=\"InvoiceSheet\""));

        let strings = part(&bytes, "xl/sharedStrings.xml");
        let position = |text: &str| {
            strings
                .find(&format!(">{}<", text))
                .unwrap_or_else(|| panic!("{} missing from shared strings", text))
        };
        let mut previous = 0;
        for header in HEADERS {
            let at = position(header);
            assert!(at > previous, "{} out of order", header);
            previous = at;
        }
        assert!(position("IV00002") > previous);
        assert!(position("IV00002") < position("IV00001"));
        position("03/09/2030");
        position("Acme");
        position("1 Main Street");
    }

    #[test]
    fn total_is_written_as_a_number() {
        let bytes = build_invoices_workbook(&[invoice("IV00001")]).unwrap();

        let sheet = part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<v>1234.5</v>"));
        assert!(!part(&bytes, "xl/sharedStrings.xml").contains("1234.5"));
    }
}
