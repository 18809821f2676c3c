use serde_json::json;

use crate::errors::IdeologyError;
use crate::records::{require_weights, ColumnSelector, Interaction, RawRecord};

fn raw(value: serde_json::Value) -> RawRecord {
    serde_json::from_value(value).unwrap()
}

#[test]
fn extract_uses_selected_columns() {
    let rows = vec![
        raw(json!({"user": "alice", "domain": "news.example", "lang": "en"})),
        raw(json!({"user": 42, "domain": "blog.example"})),
    ];
    let records = ColumnSelector::new("user", "domain").extract(&rows).unwrap();

    assert_eq!(records[0], Interaction::new("alice", "news.example"));
    assert_eq!(records[1].target, "42");
    assert!(records.iter().all(|r| r.weight.is_none()));
}

#[test]
fn default_selector_reads_target_and_source() {
    let rows = vec![raw(json!({"target": "a", "source": "x"}))];
    let records = ColumnSelector::default().extract(&rows).unwrap();
    assert_eq!(records, vec![Interaction::new("a", "x")]);
}

#[test]
fn missing_column_is_schema_error() {
    let rows = vec![
        raw(json!({"target": "a", "source": "x"})),
        raw(json!({"target": "b"})),
    ];
    let err = ColumnSelector::default().extract(&rows).unwrap_err();
    match err {
        IdeologyError::Schema { row, reason } => {
            assert_eq!(row, 1);
            assert!(reason.contains("source"));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn non_scalar_identifier_is_schema_error() {
    let rows = vec![raw(json!({"target": ["a"], "source": "x"}))];
    assert!(matches!(
        ColumnSelector::default().extract(&rows),
        Err(IdeologyError::Schema { row: 0, .. })
    ));
}

#[test]
fn weight_column_accepts_numbers_and_numeric_strings() {
    let rows = vec![
        raw(json!({"target": "a", "source": "x", "n": 3})),
        raw(json!({"target": "a", "source": "y", "n": "2.5"})),
    ];
    let records = ColumnSelector::default()
        .with_weight("n")
        .extract(&rows)
        .unwrap();
    assert_eq!(records[0].weight, Some(3.0));
    assert_eq!(records[1].weight, Some(2.5));
}

#[test]
fn bad_weight_is_schema_error() {
    for bad in [json!(-1), json!("lots"), json!(null)] {
        let rows = vec![raw(json!({"target": "a", "source": "x", "n": bad}))];
        assert!(matches!(
            ColumnSelector::default().with_weight("n").extract(&rows),
            Err(IdeologyError::Schema { row: 0, .. })
        ));
    }

    let rows = vec![raw(json!({"target": "a", "source": "x"}))];
    assert!(ColumnSelector::default()
        .with_weight("n")
        .extract(&rows)
        .is_err());
}

#[test]
fn require_weights_flags_first_unweighted_record() {
    let records = vec![
        Interaction::weighted("a", "x", 1.0),
        Interaction::new("a", "y"),
    ];
    assert!(matches!(
        require_weights(&records),
        Err(IdeologyError::Schema { row: 1, .. })
    ));
    assert!(require_weights(&records[..1]).is_ok());
}
