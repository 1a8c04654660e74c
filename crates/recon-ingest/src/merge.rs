//! Builds the order dataset from the two supplier exports.
//!
//! The quantity export lists what was ordered (`Description`, `Qty`,
//! `Cost per Unit`, `Total`); the product export is the supplier
//! catalogue (`Code`, `Description`, `Order Size`, `Price`). Rows are
//! joined on the normalized description.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{info, warn};

use recon_model::DatasetRow;

use crate::csv_table::{CsvTable, read_csv_table_with_headers};
use crate::error::{IngestError, Result};
use crate::numeric::{clean_amount, is_numeric_code, normalize_description, parse_quantity};

/// Output of [`merge_source_files`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    /// Unique rows, re-indexed from 0.
    pub rows: Vec<DatasetRow>,
    /// Rows whose description repeats an earlier row.
    pub duplicates: Vec<DatasetRow>,
    /// Quantity rows with no catalogue entry.
    pub unmatched: usize,
    /// Catalogue rows dropped for a non-numeric code.
    pub non_numeric_codes: usize,
}

struct CatalogEntry {
    code: String,
    unit: String,
}

pub fn merge_source_files(quantity_path: &Path, product_path: &Path) -> Result<MergedDataset> {
    let quantities =
        read_csv_table_with_headers(quantity_path, &["Description", "Qty", "Total"])?;
    let products = read_csv_table_with_headers(product_path, &["Code", "Description"])?;
    merge_tables(&quantities, quantity_path, &products, product_path)
}

fn required(table: &CsvTable, path: &Path, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn first_column(table: &CsvTable, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| table.column_index(name))
}

/// Joins the quantity export with the catalogue.
pub fn merge_tables(
    quantities: &CsvTable,
    quantity_path: &Path,
    products: &CsvTable,
    product_path: &Path,
) -> Result<MergedDataset> {
    let code_idx = required(products, product_path, "Code")?;
    let desc_idx = required(products, product_path, "Description")?;
    let size_idx = first_column(products, &["Order Size", "Unit"]);

    let mut merged = MergedDataset::default();
    let mut catalog: BTreeMap<String, CatalogEntry> = BTreeMap::new();
    for row in 0..products.rows.len() {
        let code = products.cell(row, code_idx).trim();
        if !is_numeric_code(code) {
            merged.non_numeric_codes += 1;
            continue;
        }
        let description = normalize_description(products.cell(row, desc_idx));
        let unit = size_idx
            .map(|idx| products.cell(row, idx).to_string())
            .unwrap_or_default();
        catalog.entry(description).or_insert(CatalogEntry {
            code: code.to_string(),
            unit,
        });
    }

    let q_desc = required(quantities, quantity_path, "Description")?;
    let q_qty = required(quantities, quantity_path, "Qty")?;
    let q_total = first_column(quantities, &["Total", "Total Cost"]).ok_or_else(|| {
        IngestError::MissingColumn {
            column: "Total".to_string(),
            path: quantity_path.to_path_buf(),
        }
    })?;
    let q_cost = required(quantities, quantity_path, "Cost per Unit")?;
    let q_unit = quantities.column_index("Unit");

    let invalid = |row: usize, column: &str, value: &str| IngestError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        line: quantities.lines.get(row).copied().unwrap_or(row + 2),
        path: quantity_path.to_path_buf(),
    };

    let mut seen = BTreeSet::new();
    for row in 0..quantities.rows.len() {
        let product = normalize_description(quantities.cell(row, q_desc));
        let Some(entry) = catalog.get(&product) else {
            merged.unmatched += 1;
            continue;
        };
        let qty_raw = quantities.cell(row, q_qty);
        let quantity = parse_quantity(qty_raw).ok_or_else(|| invalid(row, "Qty", qty_raw))?;
        let cost_raw = quantities.cell(row, q_cost);
        let cost_per_unit =
            clean_amount(cost_raw).ok_or_else(|| invalid(row, "Cost per Unit", cost_raw))?;
        let total_raw = quantities.cell(row, q_total);
        let total_cost =
            clean_amount(total_raw).ok_or_else(|| invalid(row, "Total", total_raw))?;
        let unit = q_unit
            .map(|idx| quantities.cell(row, idx).to_string())
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| entry.unit.clone());
        let is_new = seen.insert(product.clone());
        let target = if is_new {
            &mut merged.rows
        } else {
            &mut merged.duplicates
        };
        let index = target.len();
        target.push(DatasetRow {
            index,
            code: entry.code.clone(),
            product,
            unit,
            quantity,
            cost_per_unit,
            total_cost,
        });
    }

    if merged.unmatched > 0 {
        warn!(
            unmatched = merged.unmatched,
            "quantity rows without a catalogue code were dropped"
        );
    }
    info!(
        rows = merged.rows.len(),
        duplicates = merged.duplicates.len(),
        non_numeric_codes = merged.non_numeric_codes,
        "merged supplier exports"
    );
    Ok(merged)
}
