//! Spreadsheet serialization.

use rust_xlsxwriter::{Format, Workbook};

use crate::errors::ServiceError;

use super::rows::ReportRow;

/// Outbound column contract; names and order are fixed.
pub const OUTBOUND_COLUMNS: [&str; 5] = ["Order ID", "Order Date", "SKU", "Lot ID", "Quantity"];

/// Inbound column contract.
pub const INBOUND_COLUMNS: [&str; 5] = ["Order ID", "Date", "SKU", "Lot ID", "Quantity"];

/// Serializes rows into a single-sheet workbook and returns its bytes.
///
/// Row order is preserved; missing values leave the cell blank.
pub fn write_workbook(
    sheet_name: &str,
    columns: &[&str; 5],
    rows: &[ReportRow],
) -> Result<Vec<u8>, ServiceError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in columns.iter().enumerate() {
        worksheet.write(0, col as u16, *header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        if let Some(order_id) = &row.order_id {
            worksheet.write(r, 0, order_id.as_str())?;
        }
        if let Some(date) = row.date {
            worksheet.write_datetime_with_format(r, 1, &date, &date_format)?;
        }
        if let Some(sku) = &row.sku {
            worksheet.write(r, 2, sku.as_str())?;
        }
        if let Some(lot_id) = &row.lot_id {
            worksheet.write(r, 3, lot_id.as_str())?;
        }
        if let Some(quantity) = row.quantity {
            worksheet.write(r, 4, quantity)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> ReportRow {
        ReportRow {
            order_id: Some("O1".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 2, 1),
            sku: Some("S1".to_string()),
            lot_id: Some("L1".to_string()),
            quantity: Some(3),
        }
    }

    #[test]
    fn column_contracts_are_five_wide() {
        assert_eq!(
            OUTBOUND_COLUMNS,
            ["Order ID", "Order Date", "SKU", "Lot ID", "Quantity"]
        );
        assert_eq!(
            INBOUND_COLUMNS,
            ["Order ID", "Date", "SKU", "Lot ID", "Quantity"]
        );
    }

    #[test]
    fn workbook_bytes_are_a_zip_archive() {
        let bytes = write_workbook("Outbound", &OUTBOUND_COLUMNS, &[sample_row()]).unwrap();
        // XLSX is a zip container; the magic bytes are "PK".
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_and_sparse_rows_serialize() {
        let sparse = ReportRow {
            order_id: None,
            date: None,
            sku: Some("S1".to_string()),
            lot_id: None,
            quantity: None,
        };
        assert!(write_workbook("Inbound", &INBOUND_COLUMNS, &[]).is_ok());
        assert!(write_workbook("Inbound", &INBOUND_COLUMNS, &[sparse]).is_ok());
    }

    #[test]
    fn large_quantities_serialize() {
        let row = ReportRow {
            quantity: Some(i64::MAX),
            ..sample_row()
        };
        assert!(write_workbook("Outbound", &OUTBOUND_COLUMNS, &[row]).is_ok());
    }
}
