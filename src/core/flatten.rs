use crate::core::record::{read_match, MatchRecord};
use crate::domain::model::RawDeliveryRow;
use crate::utils::error::Result;
use std::path::Path;

/// The fielding side is only known when exactly two teams are listed.
fn bowling_team(teams: &[String], batting: Option<&str>) -> Option<String> {
    if teams.len() != 2 {
        return None;
    }
    teams
        .iter()
        .find(|team| Some(team.as_str()) != batting)
        .cloned()
}

/// One row per delivery, in innings → over → delivery order.
///
/// Ball numbers are assigned by position inside each over starting at 1, whatever the
/// source says about the delivery. Wides and no-balls therefore push later deliveries of
/// the same over to higher numbers than a scorer would use.
pub fn flatten_match(record: &MatchRecord) -> Vec<RawDeliveryRow> {
    let context = record.context();
    let teams = record.teams();
    let mut rows = Vec::new();

    for (innings_idx, innings) in record.innings().enumerate() {
        let batting = innings.team();
        let bowling = bowling_team(&teams, batting.as_deref());

        for over in innings.overs() {
            let over_no = over.number();

            for (ball_idx, delivery) in over.deliveries().enumerate() {
                let dismissal = delivery.first_wicket();
                rows.push(RawDeliveryRow {
                    context: context.clone(),
                    innings: innings_idx + 1,
                    batting_team: batting.clone(),
                    bowling_team: bowling.clone(),
                    over: over_no,
                    ball: (ball_idx + 1) as u32,
                    batter: delivery.batter(),
                    non_striker: delivery.non_striker(),
                    bowler: delivery.bowler(),
                    runs: delivery.batter_runs(),
                    extras: delivery.extras(),
                    runs_total: delivery.total(),
                    wicket: u8::from(dismissal.is_some()),
                    dismissal,
                });
            }
        }
    }

    tracing::debug!(
        "Flattened match {} into {} deliveries",
        context.match_id,
        rows.len()
    );
    rows
}

/// Reads and flattens one file. Each call re-reads the file.
pub fn flatten_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawDeliveryRow>> {
    let record = read_match(path)?;
    Ok(flatten_match(&record))
}
