use crate::domain::model::CleanDeliveryRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TOSS_DECISIONS: [&str; 2] = ["bat", "field"];

/// Choice lists a win-probability form offers, derived from the cleaned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOptions {
    pub teams: Vec<String>,
    pub venues: Vec<String>,
    pub toss_decisions: Vec<String>,
}

impl CategoryOptions {
    pub fn from_rows(rows: &[CleanDeliveryRow]) -> Self {
        let teams: BTreeSet<&str> = rows
            .iter()
            .flat_map(|r| [r.batting_team.as_deref(), r.bowling_team.as_deref()])
            .flatten()
            .collect();
        let venues: BTreeSet<&str> = rows
            .iter()
            .filter_map(|r| r.context.venue.as_deref())
            .collect();

        Self {
            teams: teams.into_iter().map(String::from).collect(),
            venues: venues.into_iter().map(String::from).collect(),
            toss_decisions: TOSS_DECISIONS.iter().map(|d| d.to_string()).collect(),
        }
    }
}
