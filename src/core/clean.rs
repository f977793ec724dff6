use crate::domain::model::{CleanDeliveryRow, CleaningOptions, RawDeliveryRow};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    Coerce,
    DropNullRuns,
    DropDuplicates,
    RangeFilter,
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDelta {
    pub stage: CleaningStage,
    pub before: usize,
    pub after: usize,
}

impl StageDelta {
    pub fn dropped(&self) -> usize {
        self.before - self.after
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    /// Present but non-numeric runs values turned into nulls by coercion.
    pub unparsable_runs: usize,
    pub unparsable_extras: usize,
    pub stages: Vec<StageDelta>,
    pub output_rows: usize,
}

impl CleaningReport {
    pub fn dropped(&self, stage: CleaningStage) -> usize {
        self.stages
            .iter()
            .filter(|delta| delta.stage == stage)
            .map(StageDelta::dropped)
            .sum()
    }

    fn record(&mut self, stage: CleaningStage, before: usize, after: usize) {
        tracing::debug!("Cleaning {:?}: {} -> {} rows", stage, before, after);
        self.stages.push(StageDelta {
            stage,
            before,
            after,
        });
    }
}

/// Numbers and numeric-looking strings convert, fractions included; everything else
/// (text, bool, null, non-finite values) is null.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

pub fn coerce_numeric(rows: Vec<RawDeliveryRow>) -> Vec<CleanDeliveryRow> {
    rows.into_iter()
        .map(|row| row.map_numeric(|v| coerce_number(&v)))
        .collect()
}

pub fn drop_null_runs(rows: &mut Vec<CleanDeliveryRow>) -> usize {
    let before = rows.len();
    rows.retain(|row| row.runs.is_some());
    before - rows.len()
}

type DeliveryKey = (String, Option<usize>, Option<i64>, u32);

fn delivery_key(row: &CleanDeliveryRow, by_innings: bool) -> DeliveryKey {
    (
        row.context.match_id.clone(),
        by_innings.then_some(row.innings),
        row.over,
        row.ball,
    )
}

/// Keeps the first row for every (match id, over, ball), in current table order.
pub fn drop_duplicates(rows: &mut Vec<CleanDeliveryRow>, by_innings: bool) -> usize {
    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(delivery_key(row, by_innings)));
    before - rows.len()
}

/// Null extras fail the comparison and are dropped.
pub fn filter_range(rows: &mut Vec<CleanDeliveryRow>) -> usize {
    let before = rows.len();
    rows.retain(|row| matches!((row.runs, row.extras), (Some(r), Some(e)) if r >= 0.0 && e >= 0.0));
    before - rows.len()
}

/// Stable sort by (match id, over, ball); rows without an over number go last in their match.
pub fn canonical_sort(rows: &mut [CleanDeliveryRow]) {
    rows.sort_by(|a, b| {
        a.context
            .match_id
            .cmp(&b.context.match_id)
            .then_with(|| a.over.is_none().cmp(&b.over.is_none()))
            .then_with(|| a.over.cmp(&b.over))
            .then_with(|| a.ball.cmp(&b.ball))
    });
}

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    options: CleaningOptions,
}

impl Cleaner {
    pub fn new(options: CleaningOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, rows: Vec<RawDeliveryRow>) -> (Vec<CleanDeliveryRow>, CleaningReport) {
        let mut report = CleaningReport {
            input_rows: rows.len(),
            ..Default::default()
        };

        report.unparsable_runs = rows
            .iter()
            .filter(|r| !r.runs.is_null() && coerce_number(&r.runs).is_none())
            .count();
        report.unparsable_extras = rows
            .iter()
            .filter(|r| !r.extras.is_null() && coerce_number(&r.extras).is_none())
            .count();

        let mut rows = coerce_numeric(rows);
        report.record(CleaningStage::Coerce, report.input_rows, rows.len());

        let before = rows.len();
        drop_null_runs(&mut rows);
        report.record(CleaningStage::DropNullRuns, before, rows.len());

        let before = rows.len();
        let duplicates = drop_duplicates(&mut rows, self.options.dedup_by_innings);
        report.record(CleaningStage::DropDuplicates, before, rows.len());
        tracing::info!("Dropped {} duplicate deliveries", duplicates);

        let before = rows.len();
        filter_range(&mut rows);
        report.record(CleaningStage::RangeFilter, before, rows.len());

        canonical_sort(&mut rows);
        report.record(CleaningStage::Sort, rows.len(), rows.len());

        report.output_rows = rows.len();
        (rows, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Dismissal, MatchContext};
    use serde_json::json;

    fn raw(match_id: &str, over: i64, ball: u32, runs: Value, extras: Value) -> RawDeliveryRow {
        RawDeliveryRow {
            context: MatchContext {
                match_id: match_id.to_string(),
                ..Default::default()
            },
            innings: 1,
            batting_team: Some("A".to_string()),
            bowling_team: Some("B".to_string()),
            over: Some(over),
            ball,
            batter: None,
            non_striker: None,
            bowler: None,
            runs_total: json!(null),
            runs,
            extras,
            wicket: 0,
            dismissal: None,
        }
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(4)), Some(4.0));
        assert_eq!(coerce_number(&json!(-1)), Some(-1.0));
        assert_eq!(coerce_number(&json!(2.0)), Some(2.0));
        assert_eq!(coerce_number(&json!(" 6 ")), Some(6.0));
        assert_eq!(coerce_number(&json!("1.0")), Some(1.0));
        assert_eq!(coerce_number(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_number(&json!("2.5")), Some(2.5));
        assert_eq!(coerce_number(&json!("four")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!({"batter": 1})), None);
    }

    #[test]
    fn test_fractional_runs_are_kept() {
        let rows = vec![
            raw("m1", 0, 1, json!(1.5), json!(0)),
            raw("m1", 0, 2, json!("2.5"), json!(0)),
        ];

        let (clean, report) = Cleaner::default().run(rows);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].runs, Some(1.5));
        assert_eq!(clean[1].runs, Some(2.5));
        assert_eq!(report.unparsable_runs, 0);
        assert_eq!(report.dropped(CleaningStage::DropNullRuns), 0);
    }

    #[test]
    fn test_non_numeric_runs_are_dropped_and_counted() {
        let rows = vec![
            raw("m1", 0, 1, json!(1), json!(0)),
            raw("m1", 0, 2, json!("dot"), json!(0)),
            raw("m1", 0, 3, json!(null), json!(0)),
        ];

        let (clean, report) = Cleaner::default().run(rows);
        assert_eq!(clean.len(), 1);
        assert_eq!(report.unparsable_runs, 1);
        assert_eq!(report.dropped(CleaningStage::DropNullRuns), 2);
    }

    #[test]
    fn test_duplicates_keep_first_seen() {
        let mut first = raw("m1", 3, 2, json!(1), json!(0));
        first.batter = Some("first".to_string());
        let mut second = raw("m1", 3, 2, json!(6), json!(0));
        second.batter = Some("second".to_string());

        let (clean, report) = Cleaner::default().run(vec![first, second]);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].batter.as_deref(), Some("first"));
        assert_eq!(report.dropped(CleaningStage::DropDuplicates), 1);
    }

    #[test]
    fn test_innings_aware_key_keeps_both_innings() {
        let first = raw("m1", 0, 1, json!(1), json!(0));
        let mut second = raw("m1", 0, 1, json!(2), json!(0));
        second.innings = 2;

        let (default_clean, _) = Cleaner::default().run(vec![first.clone(), second.clone()]);
        assert_eq!(default_clean.len(), 1);

        let cleaner = Cleaner::new(CleaningOptions {
            dedup_by_innings: true,
        });
        let (clean, _) = cleaner.run(vec![first, second]);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].innings, 1);
    }

    #[test]
    fn test_range_filter_drops_negative_and_null_extras() {
        let rows = vec![
            raw("m1", 0, 1, json!(-1), json!(0)),
            raw("m1", 0, 2, json!(1), json!(-2)),
            raw("m1", 0, 3, json!(1), json!(null)),
            raw("m1", 0, 4, json!(0), json!(0)),
        ];

        let (clean, report) = Cleaner::default().run(rows);
        assert_eq!(clean.len(), 1);
        assert_eq!(clean[0].ball, 4);
        assert_eq!(report.dropped(CleaningStage::RangeFilter), 3);
    }

    #[test]
    fn test_sort_orders_by_match_over_ball() {
        let mut no_over = raw("m1", 0, 1, json!(0), json!(0));
        no_over.over = None;
        let rows = vec![
            raw("m2", 0, 1, json!(0), json!(0)),
            no_over,
            raw("m1", 1, 2, json!(0), json!(0)),
            raw("m1", 1, 1, json!(0), json!(0)),
            raw("m1", 0, 6, json!(0), json!(0)),
        ];

        let (clean, _) = Cleaner::default().run(rows);
        let keys: Vec<(&str, Option<i64>, u32)> = clean
            .iter()
            .map(|r| (r.match_id(), r.over, r.ball))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("m1", Some(0), 6),
                ("m1", Some(1), 1),
                ("m1", Some(1), 2),
                ("m1", None, 1),
                ("m2", Some(0), 1),
            ]
        );
    }

    #[test]
    fn test_report_is_monotonic_and_consistent() {
        let rows = vec![
            raw("m1", 0, 1, json!(1), json!(0)),
            raw("m1", 0, 1, json!(1), json!(0)),
            raw("m1", 0, 2, json!("x"), json!(0)),
            raw("m1", 0, 3, json!(2), json!(-1)),
            raw("m1", 0, 4, json!(0), json!(1)),
        ];

        let (clean, report) = Cleaner::default().run(rows);
        assert_eq!(report.input_rows, 5);
        assert_eq!(report.output_rows, clean.len());
        assert_eq!(report.stages.len(), 5);
        for pair in report.stages.windows(2) {
            assert_eq!(pair[0].after, pair[1].before);
        }
        assert!(report.stages.iter().all(|d| d.after <= d.before));
        assert_eq!(report.stages.last().unwrap().after, 2);
    }

    #[test]
    fn test_wicket_detail_survives_cleaning() {
        let mut row = raw("m1", 0, 1, json!(0), json!(0));
        row.wicket = 1;
        row.dismissal = Some(Dismissal {
            kind: Some("bowled".to_string()),
            player_out: Some("X".to_string()),
            fielders: vec![],
        });

        let (clean, _) = Cleaner::default().run(vec![row]);
        assert_eq!(clean[0].wicket, 1);
        assert!(clean[0].dismissal.is_some());
    }
}
