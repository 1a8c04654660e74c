use std::fs;
use std::path::PathBuf;

use recon_model::DatasetRow;
use recon_ingest::{IngestError, load_dataset, merge_source_files, write_dataset_csv};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn loads_prepared_dataset() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "orders.csv",
        "Code,Product,Unit,Qty,Cost per Unit,Total Cost\n\
         1001,Flour 25kg,Bag,2,\"$1,250.00\",\"$2,500.00\"\n\
         \n\
         1002, Sugar 1kg ,Each,10,1.25,12.5\n",
    );
    let rows = load_dataset(&path).expect("load dataset");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].index, 0);
    assert_eq!(rows[0].cost_per_unit, 1250.0);
    assert_eq!(rows[0].total_cost, 2500.0);
    assert_eq!(rows[1].index, 1);
    assert_eq!(rows[1].product, "Sugar 1kg");
    assert_eq!(rows[1].quantity, 10);
}

#[test]
fn header_below_title_row() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "orders.csv",
        "Weekly order,,,,,\n\
         code,product,unit,qty,cost per unit,total cost\n\
         1001,Flour,Bag,1,5,5\n",
    );
    let rows = load_dataset(&path).expect("load dataset");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "1001");
}

#[test]
fn missing_column_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(&dir, "orders.csv", "Code,Product,Unit,Qty\n1001,Flour,Bag,1\n");
    let err = load_dataset(&path).unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "Cost per Unit"));
}

#[test]
fn bad_quantity_names_line() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "orders.csv",
        "Code,Product,Unit,Qty,Cost per Unit,Total Cost\n1001,Flour,Bag,two,5,10\n",
    );
    let err = load_dataset(&path).unwrap_err();
    match err {
        IngestError::InvalidValue { column, line, .. } => {
            assert_eq!(column, "Qty");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let err = load_dataset(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn written_dataset_loads_back() {
    let dir = TempDir::new().expect("temp dir");
    let source = write(
        &dir,
        "orders.csv",
        "Code,Product,Unit,Qty,Cost per Unit,Total Cost\n1001,Flour,Bag,3,2.5,7.5\n",
    );
    let rows = load_dataset(&source).expect("load dataset");
    let copy = dir.path().join("out").join("copy.csv");
    write_dataset_csv(&copy, &rows).expect("write dataset");
    assert_eq!(load_dataset(&copy).expect("reload dataset"), rows);
}

#[test]
fn credit_and_small_amounts_survive_a_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let rows = vec![
        DatasetRow {
            index: 0,
            code: "1001".to_string(),
            product: "Credit".to_string(),
            unit: "Each".to_string(),
            quantity: -2,
            cost_per_unit: 5.0,
            total_cost: -10.0,
        },
        DatasetRow {
            index: 1,
            code: "1002".to_string(),
            product: "Rounding".to_string(),
            unit: "Each".to_string(),
            quantity: 1,
            cost_per_unit: 1e-5,
            total_cost: 1e-5,
        },
    ];
    let path = dir.path().join("orders.csv");
    write_dataset_csv(&path, &rows).expect("write dataset");
    assert_eq!(load_dataset(&path).expect("reload dataset"), rows);
}

#[test]
fn exponent_notation_is_read_as_written() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "orders.csv",
        "Code,Product,Unit,Qty,Cost per Unit,Total Cost
1001,Washer,Each,1,1e-05,1e-05
",
    );
    let rows = load_dataset(&path).expect("load dataset");
    assert_eq!(rows[0].total_cost, 1e-5);
}

#[test]
fn junk_amount_names_column() {
    let dir = TempDir::new().expect("temp dir");
    let path = write(
        &dir,
        "orders.csv",
        "Code,Product,Unit,Qty,Cost per Unit,Total Cost
1001,Flour,Bag,2,five,10
",
    );
    let err = load_dataset(&path).unwrap_err();
    assert!(matches!(
        err,
        IngestError::InvalidValue { ref column, ref value, line: 2, .. }
            if column == "Cost per Unit" && value == "five"
    ));
}

#[test]
fn merges_supplier_exports() {
    let dir = TempDir::new().expect("temp dir");
    let quantities = write(
        &dir,
        "quantity.csv",
        "Description,Qty,Cost per Unit,Total\n\
         Flour  25kg,2,$12.50,$25.00\n\
         Sugar 1kg,4,$1.00,$4.00\n\
         Salt,1,$0.50,$0.50\n\
         Flour 25kg,1,$12.50,$12.50\n",
    );
    let products = write(
        &dir,
        "product.csv",
        "Code,Description,Order Size,Price\n\
         1001,Flour 25kg,Bag,12.50\n\
         X-9,Sugar 1kg,Each,1.00\n\
         1003,Sugar 1kg,Each,1.00\n",
    );
    let merged = merge_source_files(&quantities, &products).expect("merge");
    assert_eq!(merged.rows.len(), 2);
    assert_eq!(merged.rows[0].code, "1001");
    assert_eq!(merged.rows[0].product, "Flour 25kg");
    assert_eq!(merged.rows[0].unit, "Bag");
    assert_eq!(merged.rows[1].code, "1003");
    assert_eq!(merged.rows[1].index, 1);
    assert_eq!(merged.duplicates.len(), 1);
    assert_eq!(merged.duplicates[0].quantity, 1);
    assert_eq!(merged.unmatched, 1);
    assert_eq!(merged.non_numeric_codes, 1);
}
