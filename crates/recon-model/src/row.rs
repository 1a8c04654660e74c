use serde::{Deserialize, Serialize};

/// One line of the prepared order dataset.
///
/// Rows are immutable once loaded. `total_cost` is expected to equal
/// `quantity * cost_per_unit`, but that is checked against the ordering
/// system rather than assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Ordinal position in the dataset, starting at 0.
    pub index: usize,
    /// Supplier item code.
    pub code: String,
    /// Item description as printed by the supplier.
    pub product: String,
    pub unit: String,
    pub quantity: i64,
    pub cost_per_unit: f64,
    pub total_cost: f64,
}

/// Column headers of the dataset, in file order.
pub const DATASET_HEADERS: [&str; 6] = [
    "Code",
    "Product",
    "Unit",
    "Qty",
    "Cost per Unit",
    "Total Cost",
];

impl DatasetRow {
    /// Code and description trimmed, the form used for candidate matching.
    pub fn match_key(&self) -> (&str, &str) {
        (self.code.trim(), self.product.trim())
    }

    /// Cell values aligned with [`DATASET_HEADERS`].
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.product.clone(),
            self.unit.clone(),
            self.quantity.to_string(),
            self.cost_per_unit.to_string(),
            self.total_cost.to_string(),
        ]
    }
}
