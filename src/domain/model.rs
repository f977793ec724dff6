use serde::{Deserialize, Serialize};

/// Match-level fields shared by every delivery of one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub match_id: String,
    pub date: Option<String>,
    pub season: Option<String>,
    pub tournament: Option<String>,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
}

/// Detail of the first wicket that fell on a delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: Option<String>,
    pub player_out: Option<String>,
    pub fielders: Vec<String>,
}

/// One flattened delivery. `N` is the representation of the numeric run columns:
/// raw document values straight out of the flattener, `Option<f64>` once coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRow<N = serde_json::Value> {
    pub context: MatchContext,
    /// 1-based position of the innings inside the match. Not exported.
    pub innings: usize,
    pub batting_team: Option<String>,
    pub bowling_team: Option<String>,
    pub over: Option<i64>,
    /// Positional, 1-based, local to the over.
    pub ball: u32,
    pub batter: Option<String>,
    pub non_striker: Option<String>,
    pub bowler: Option<String>,
    pub runs: N,
    pub extras: N,
    pub runs_total: N,
    pub wicket: u8,
    pub dismissal: Option<Dismissal>,
}

pub type RawDeliveryRow = DeliveryRow<serde_json::Value>;
pub type CleanDeliveryRow = DeliveryRow<Option<f64>>;

impl<N> DeliveryRow<N> {
    pub fn match_id(&self) -> &str {
        &self.context.match_id
    }

    /// Converts the three numeric columns, leaving every other column untouched.
    pub fn map_numeric<M, F>(self, mut f: F) -> DeliveryRow<M>
    where
        F: FnMut(N) -> M,
    {
        DeliveryRow {
            context: self.context,
            innings: self.innings,
            batting_team: self.batting_team,
            bowling_team: self.bowling_team,
            over: self.over,
            ball: self.ball,
            batter: self.batter,
            non_striker: self.non_striker,
            bowler: self.bowler,
            runs: f(self.runs),
            extras: f(self.extras),
            runs_total: f(self.runs_total),
            wicket: self.wicket,
            dismissal: self.dismissal,
        }
    }

    pub fn fielder_count(&self) -> usize {
        self.dismissal.as_ref().map_or(0, |d| d.fielders.len())
    }
}

/// What the aggregator does when a match file cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
    /// Stop the whole run on the first bad file.
    #[default]
    Abort,
    /// Record the bad file and keep going.
    Skip,
}

/// How many `fielder_N` columns the export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FielderColumns {
    /// As many as the widest dismissal in the table; wicket columns only appear when
    /// at least one row has a wicket. The header therefore depends on the data.
    #[default]
    Dynamic,
    /// Always `wicket_kind`, `player_out` and exactly this many fielder slots.
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningOptions {
    /// Include the innings position in the duplicate key.
    pub dedup_by_innings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file: String,
    pub rows: usize,
}

/// The aggregated, still uncleaned table plus what was read to build it.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub rows: Vec<RawDeliveryRow>,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub rows: Vec<CleanDeliveryRow>,
    pub report: crate::core::clean::CleaningReport,
    pub columns: Vec<String>,
    pub table_output: Vec<u8>,
    pub options: crate::core::options::CategoryOptions,
    pub sequences: Option<Vec<crate::core::sequence::SequenceWindow>>,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedFile>,
}
