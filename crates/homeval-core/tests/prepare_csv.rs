use std::fs;

use homeval_core::data_handling::{CsvHousingSource, DataPreparation, PrepareOptions};

const CSV: &str = "\
Id,num1,num2,cat,SalePrice
1,1.0,10,A,100
2,2.0,NA,B,200
3,3.0,30,A,300
4,,40,C,400
5,5.0,50,B,500
";

#[test]
fn csv_source_keeps_numeric_columns_and_splits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.csv");
    fs::write(&path, CSV).unwrap();

    let source = CsvHousingSource::new(&path);
    let data = source
        .load_and_prepare(&PrepareOptions {
            test_size: Some(0.4),
            ..PrepareOptions::default()
        })
        .unwrap();

    assert_eq!(data.feature_names, vec!["num1", "num2"]);
    assert_eq!(data.x_train.nrows(), 3);
    assert_eq!(data.x_test.nrows(), 2);
    assert_eq!(data.y_train.len() + data.y_test.len(), 5);
    assert_eq!(data.scaler.n_features(), 2);
}

#[test]
fn selected_features_fix_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.csv");
    fs::write(&path, CSV).unwrap();

    let source = CsvHousingSource::new(&path);
    let selected = vec!["num2".to_string(), "num1".to_string()];
    let data = source
        .load_and_prepare(&PrepareOptions::with_features(&selected))
        .unwrap();
    assert_eq!(data.feature_names, selected);
    assert_eq!(data.x_train.ncols(), 2);

    let unknown = vec!["cat".to_string()];
    assert!(source
        .load_and_prepare(&PrepareOptions::with_features(&unknown))
        .is_err());
}
