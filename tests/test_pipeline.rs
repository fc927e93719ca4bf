//! Integration test: Full pipeline (load → target → preprocess → split → train)

use mlstep::pipeline::{Pipeline, Stage};
use mlstep::training::SourceKind;
use mlstep::PipelineError;

const SPECIES: [&str; 3] = ["setosa", "versicolor", "virginica"];

/// 100 rows, 4 numeric features and a 3-class text target
fn flowers_csv() -> String {
    let mut csv = String::from("sepal_length,sepal_width,petal_length,petal_width,species\n");
    for i in 0..100 {
        let class = i % 3;
        let jitter = (i % 7) as f64 * 0.1;
        csv.push_str(&format!(
            "{:.2},{:.2},{:.2},{:.2},{}\n",
            4.5 + class as f64 * 1.2 + jitter,
            3.0 - class as f64 * 0.3 + jitter / 2.0,
            1.5 + class as f64 * 2.0 + jitter,
            0.2 + class as f64 * 0.8 + jitter / 3.0,
            SPECIES[class]
        ));
    }
    csv
}

fn loaded() -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.load(flowers_csv().as_bytes(), "flowers.csv").unwrap();
    pipeline
}

#[test]
fn test_end_to_end_decision_tree() {
    let mut pipeline = Pipeline::new();
    let loaded = pipeline.load(flowers_csv().as_bytes(), "flowers.csv").unwrap();
    assert_eq!(loaded.row_count, 100);
    assert_eq!(loaded.column_count, 5);

    let target = pipeline.select_target("species").unwrap();
    assert_eq!(target.unique_values, 3);
    assert_eq!(target.rows, 100);

    let pre = pipeline.preprocess("standardization").unwrap();
    assert_eq!(
        pre.features_used,
        vec!["sepal_length", "sepal_width", "petal_length", "petal_width"]
    );
    assert_eq!(pre.rows, 100);

    let split = pipeline.split(0.8).unwrap();
    assert_eq!(split.train_rows, 80);
    assert_eq!(split.test_rows, 20);
    assert_eq!(split.total_rows, 100);
    assert_eq!(split.source, SourceKind::Processed);

    let trained = pipeline.train("decision_tree").unwrap();
    assert!((0.0..=1.0).contains(&trained.accuracy));
    assert!((0.0..=1.0).contains(&trained.train_accuracy));
    assert_eq!(pipeline.stage(), Stage::Trained);
}

#[test]
fn test_logistic_regression_flow() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    pipeline.split(0.7).unwrap();
    let trained = pipeline.train("logistic_regression").unwrap();
    assert!((0.0..=1.0).contains(&trained.accuracy));
    assert!((0.0..=1.0).contains(&trained.train_accuracy));
}

#[test]
fn test_split_and_training_are_deterministic() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    let mut other = loaded();
    other.select_target("species").unwrap();

    for ratio in [0.5, 0.65, 0.8, 0.9] {
        let first = pipeline.split(ratio).unwrap();
        let first_rows = pipeline.split_set().unwrap().partition.clone();
        let second = pipeline.split(ratio).unwrap();
        let second_rows = pipeline.split_set().unwrap().partition.clone();

        assert_eq!(first.train_rows, second.train_rows);
        assert_eq!(first_rows, second_rows, "ratio {}", ratio);
        assert_eq!(first_rows.train.len(), first.train_rows);
        assert_eq!(first_rows.test.len(), first.test_rows);

        // a separate pipeline over the same upload picks the same rows
        other.split(ratio).unwrap();
        assert_eq!(other.split_set().unwrap().partition, first_rows);
    }

    pipeline.split(0.8).unwrap();
    let a = pipeline.train("decision_tree").unwrap();
    let b = pipeline.train("decision_tree").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_load_resets_lineage() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    pipeline.preprocess("normalization").unwrap();
    pipeline.split(0.8).unwrap();
    pipeline.train("decision_tree").unwrap();

    pipeline.load(b"a,b\n1,x\n2,y\n", "other.csv").unwrap();
    let status = pipeline.status();
    assert_eq!(status.stage, Stage::Loaded);
    assert_eq!(status.filename.as_deref(), Some("other.csv"));
    assert!(status.target_column.is_none());
    assert!(!status.processed);
    assert!(status.split.is_none());
    assert!(status.last_training.is_none());
    assert!(matches!(pipeline.target_info(), Err(PipelineError::NoTarget(_))));
    assert!(matches!(pipeline.split_info(), Err(PipelineError::NotSplit(_))));
}

#[test]
fn test_unsupported_format_keeps_previous_dataset() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();

    let err = pipeline.load(b"a,b\n1,2\n", "notes.txt").unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedFormat(_)));

    let status = pipeline.status();
    assert_eq!(status.filename.as_deref(), Some("flowers.csv"));
    assert_eq!(status.target_column.as_deref(), Some("species"));
}

#[test]
fn test_empty_upload_is_rejected() {
    let mut pipeline = Pipeline::new();
    assert!(matches!(
        pipeline.load(b"", "empty.csv"),
        Err(PipelineError::EmptyDataset)
    ));
    assert!(matches!(
        pipeline.load(b"a,b\n", "header_only.csv"),
        Err(PipelineError::EmptyDataset)
    ));
    assert_eq!(pipeline.stage(), Stage::Empty);
}

#[test]
fn test_revert_then_processed_preview_fails() {
    let mut pipeline = loaded();
    pipeline.preprocess("standardization").unwrap();
    assert!(pipeline.processed_preview(Some(5)).is_ok());

    pipeline.revert_preprocess();
    assert!(matches!(
        pipeline.processed_preview(Some(5)),
        Err(PipelineError::NotProcessed)
    ));
}

#[test]
fn test_split_survives_revert() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    pipeline.preprocess("standardization").unwrap();
    pipeline.split(0.8).unwrap();

    pipeline.revert_preprocess();
    let info = pipeline.split_info().unwrap();
    assert_eq!(info.source, SourceKind::Processed);
    assert_eq!(info.train_rows, 80);
    assert_eq!(pipeline.stage(), Stage::Split);
    assert!(pipeline.train("decision_tree").is_ok());
}

#[test]
fn test_invalid_targets() {
    let csv = "x,constant,empty,label\n1,a,,p\n2,a,,q\n3,a,,p\n";
    let mut pipeline = Pipeline::new();
    pipeline.load(csv.as_bytes(), "t.csv").unwrap();

    for column in ["constant", "empty", "missing_column"] {
        let err = pipeline.select_target(column).unwrap_err();
        assert!(
            matches!(err, PipelineError::InvalidTarget(_)),
            "{} gave {:?}",
            column,
            err
        );
    }
    assert!(pipeline.status().target_column.is_none());
    assert_eq!(pipeline.select_target("label").unwrap().unique_values, 2);
}

#[test]
fn test_split_before_target_leaves_state_unchanged() {
    let mut pipeline = loaded();
    let before = pipeline.stage();
    let err = pipeline.split(0.8).unwrap_err();
    assert!(matches!(err, PipelineError::NoTarget(_)));
    assert_eq!(err.to_string(), "Target column must be selected before splitting.");
    assert_eq!(pipeline.stage(), before);
}

#[test]
fn test_invalid_ratio_and_model() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    assert!(matches!(pipeline.split(0.3), Err(PipelineError::InvalidRatio { .. })));
    assert!(matches!(pipeline.split(0.95), Err(PipelineError::InvalidRatio { .. })));

    pipeline.split(0.8).unwrap();
    assert!(matches!(
        pipeline.train("random_forest"),
        Err(PipelineError::InvalidModel(_))
    ));
    assert_eq!(pipeline.stage(), Stage::Split);
}

#[test]
fn test_normalization_range_and_target_untouched() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    pipeline.preprocess("normalization").unwrap();

    let preview = pipeline.processed_preview(Some(100)).unwrap();
    assert_eq!(preview.rows.len(), 100);
    for row in &preview.rows {
        for column in ["sepal_length", "petal_width"] {
            let v = row[column].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{} = {}", column, v);
        }
        assert!(SPECIES.contains(&row["species"].as_str().unwrap()));
    }

    // raw table is untouched
    let raw = pipeline.preview(Some(1)).unwrap();
    assert!(raw.rows[0]["sepal_length"].as_f64().unwrap() > 1.0);
}

#[test]
fn test_preprocess_is_idempotent_on_columns() {
    let mut pipeline = loaded();
    pipeline.select_target("species").unwrap();
    let first = pipeline.preprocess("standardization").unwrap();
    let first_preview = pipeline.processed_preview(Some(10)).unwrap();
    let second = pipeline.preprocess("standardization").unwrap();
    let second_preview = pipeline.processed_preview(Some(10)).unwrap();

    assert_eq!(first.features_used, second.features_used);
    assert_eq!(first_preview.rows, second_preview.rows);
}

#[test]
fn test_missing_feature_values_are_imputed_at_split() {
    let csv = "a,b,label\n1,,x\n2,4,y\n,6,x\n4,8,y\n5,10,x\n6,12,y\n";
    let mut pipeline = Pipeline::new();
    pipeline.load(csv.as_bytes(), "gaps.csv").unwrap();
    pipeline.select_target("label").unwrap();

    let split = pipeline.split(0.5).unwrap();
    assert_eq!(split.source, SourceKind::Raw);
    assert_eq!(split.total_rows, 6);
    assert!(pipeline.train("logistic_regression").is_ok());
}

#[test]
fn test_deep_decision_tree_trains() {
    // alternating labels along one feature grow a chain thousands of levels deep
    let mut csv = String::from("x,label\n");
    for i in 0..20_000 {
        csv.push_str(&format!("{},{}\n", i, if i % 2 == 0 { "a" } else { "b" }));
    }
    let mut pipeline = Pipeline::new();
    pipeline.load(csv.as_bytes(), "alternating.csv").unwrap();
    pipeline.select_target("label").unwrap();
    pipeline.split(0.8).unwrap();

    let trained = pipeline.train("decision_tree").unwrap();
    assert_eq!(trained.train_accuracy, 1.0);
    assert!((0.0..=1.0).contains(&trained.accuracy));
}

#[test]
fn test_padded_labels_are_one_class() {
    let csv = "a, label\n1, x\n2,x\n3, y\n4,y \n";
    let mut pipeline = Pipeline::new();
    pipeline.load(csv.as_bytes(), "padded.csv").unwrap();
    assert_eq!(pipeline.select_target("label").unwrap().unique_values, 2);
}
