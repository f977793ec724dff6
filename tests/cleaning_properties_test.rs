use cricket_etl::core::aggregate::Aggregator;
use cricket_etl::core::clean::{Cleaner, CleaningStage};
use cricket_etl::core::export::Exporter;
use cricket_etl::domain::model::{CleaningOptions, ParseErrorPolicy};
use cricket_etl::LocalStorage;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

/// Two innings with identical over/ball positions, a repeated over and a mix of run values.
fn match_doc(id: usize) -> Value {
    let over = |no: i64, runs: Vec<Value>| {
        json!({
            "over": no,
            "deliveries": runs
                .into_iter()
                .map(|r| json!({"batter": "A", "non_striker": "B", "bowler": "C", "runs": {"batter": r, "extras": 0}}))
                .collect::<Vec<_>>()
        })
    };

    json!({
        "info": {
            "match_id": id,
            "teams": ["Mumbai Indians", "Rajasthan Royals"],
            "venue": "Wankhede Stadium"
        },
        "innings": [
            {"team": "Mumbai Indians", "overs": [
                over(0, vec![json!(1), json!(2), json!(4)]),
                over(1, vec![json!(0), json!("x"), json!(6)]),
                over(1, vec![json!(3)])
            ]},
            {"team": "Rajasthan Royals", "overs": [
                over(0, vec![json!(1), json!(1), json!(-2)]),
                over(1, vec![json!(2.0), json!(null)])
            ]}
        ]
    })
}

fn seed(dir: &Path, matches: usize) {
    for id in 0..matches {
        let name = format!("{:06}.json", 500000 + id * 7 % matches);
        std::fs::write(dir.join(name), match_doc(500000 + id).to_string()).unwrap();
    }
}

async fn table(dir: &Path, concurrency: usize, by_innings: bool) -> (Vec<u8>, usize) {
    let storage = LocalStorage::new(dir.to_string_lossy().into_owned());
    let corpus = Aggregator::new(&storage)
        .with_policy(ParseErrorPolicy::Abort)
        .with_concurrency(concurrency)
        .collect()
        .await
        .unwrap();

    let (rows, report) = Cleaner::new(CleaningOptions {
        dedup_by_innings: by_innings,
    })
    .run(corpus.rows);
    let (bytes, _) = Exporter::default().to_bytes(&rows).unwrap();
    (bytes, report.dropped(CleaningStage::DropDuplicates))
}

#[tokio::test]
async fn test_output_does_not_depend_on_concurrency() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), 12);

    let (sequential, _) = table(dir.path(), 1, false).await;
    let (parallel, _) = table(dir.path(), 5, false).await;
    assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn test_cleaned_rows_hold_table_invariants() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), 3);

    let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());
    let corpus = Aggregator::new(&storage).collect().await.unwrap();
    let input_rows = corpus.rows.len();
    let (rows, report) = Cleaner::default().run(corpus.rows);

    assert_eq!(report.input_rows, input_rows);
    let mut previous = report.input_rows;
    for delta in &report.stages {
        assert_eq!(delta.before, previous);
        assert!(delta.after <= delta.before);
        previous = delta.after;
    }
    assert_eq!(report.output_rows, rows.len());

    let mut keys = HashSet::new();
    for row in &rows {
        assert!(keys.insert((row.context.match_id.clone(), row.over, row.ball)));
        assert!(row.runs.unwrap() >= 0.0);
        assert!(row.extras.unwrap() >= 0.0);
        assert_eq!(row.wicket == 1, row.dismissal.is_some());
    }

    let sorted = rows.windows(2).all(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        (&a.context.match_id, a.over, a.ball) <= (&b.context.match_id, b.over, b.ball)
    });
    assert!(sorted);
}

#[tokio::test]
async fn test_innings_aware_key_keeps_second_innings() {
    let dir = TempDir::new().unwrap();
    seed(dir.path(), 1);

    let (default_key, default_dups) = table(dir.path(), 1, false).await;
    let (innings_key, innings_dups) = table(dir.path(), 1, true).await;

    // Per innings: the repeated over 1 collides on ball 1 only. Without the innings the
    // second innings also collides with the first on every shared (over, ball).
    assert_eq!(innings_dups, 1);
    assert!(default_dups > innings_dups);
    assert!(innings_key.len() > default_key.len());
}
