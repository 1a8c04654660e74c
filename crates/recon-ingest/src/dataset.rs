//! Loading and writing the prepared order dataset.

use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use tracing::{debug, info};

use recon_model::{DATASET_HEADERS, DatasetRow};

use crate::csv_table::{CsvTable, read_csv_table_with_headers};
use crate::error::{IngestError, Result};
use crate::numeric::{parse_amount, parse_quantity};

/// Loads a prepared dataset CSV.
///
/// Requires the columns `Code, Product, Unit, Qty, Cost per Unit,
/// Total Cost` (case-insensitive). Row indexes follow file order, which
/// must stay stable between runs for resume to land on the same rows.
pub fn load_dataset(path: &Path) -> Result<Vec<DatasetRow>> {
    let table = read_csv_table_with_headers(path, &DATASET_HEADERS)?;
    let rows = rows_from_table(&table, path)?;
    info!(path = %path.display(), rows = rows.len(), "dataset loaded");
    Ok(rows)
}

/// Converts a table into dataset rows.
pub fn rows_from_table(table: &CsvTable, path: &Path) -> Result<Vec<DatasetRow>> {
    let column = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })
    };
    let code_idx = column("Code")?;
    let product_idx = column("Product")?;
    let unit_idx = column("Unit")?;
    let qty_idx = column("Qty")?;
    let cost_idx = column("Cost per Unit")?;
    let total_idx = column("Total Cost")?;

    let invalid = |row: usize, column: &str, value: &str| IngestError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        line: table.lines.get(row).copied().unwrap_or(row + 2),
        path: path.to_path_buf(),
    };

    let mut rows = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let qty_raw = table.cell(row, qty_idx);
        let quantity = parse_quantity(qty_raw).ok_or_else(|| invalid(row, "Qty", qty_raw))?;
        let cost_raw = table.cell(row, cost_idx);
        let cost_per_unit =
            parse_amount(cost_raw).ok_or_else(|| invalid(row, "Cost per Unit", cost_raw))?;
        let total_raw = table.cell(row, total_idx);
        let total_cost =
            parse_amount(total_raw).ok_or_else(|| invalid(row, "Total Cost", total_raw))?;
        rows.push(DatasetRow {
            index: rows.len(),
            code: table.cell(row, code_idx).to_string(),
            product: table.cell(row, product_idx).to_string(),
            unit: table.cell(row, unit_idx).to_string(),
            quantity,
            cost_per_unit,
            total_cost,
        });
    }
    debug!(rows = rows.len(), "converted table to dataset rows");
    Ok(rows)
}

/// Writes rows as a dataset CSV with [`DATASET_HEADERS`].
pub fn write_dataset_csv(path: &Path, rows: &[DatasetRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| IngestError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| IngestError::csv(path, err))?;
    writer
        .write_record(DATASET_HEADERS)
        .map_err(|err| IngestError::csv(path, err))?;
    for row in rows {
        writer
            .write_record(row.to_cells())
            .map_err(|err| IngestError::csv(path, err))?;
    }
    writer.flush().map_err(|source| IngestError::Io {
        operation: "flush",
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
