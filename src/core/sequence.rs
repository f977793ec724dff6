use crate::domain::model::CleanDeliveryRow;
use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};

/// Window length the next-ball runs model was trained with.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 50;

/// Per-delivery features, in order: runs, extras, wicket.
pub type BallFeatures = [f64; 3];

/// `length` consecutive deliveries of one match, labelled with the runs off the next ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceWindow {
    pub match_id: String,
    pub start: usize,
    pub features: Vec<BallFeatures>,
    pub label: f64,
}

fn features(row: &CleanDeliveryRow) -> BallFeatures {
    [
        row.runs.unwrap_or_default(),
        row.extras.unwrap_or_default(),
        f64::from(row.wicket),
    ]
}

/// Slides a window over each match's deliveries in table order. A match is a run of
/// consecutive rows with the same id, which the canonical sort guarantees; windows never
/// span two matches.
pub fn build_windows(rows: &[CleanDeliveryRow], length: usize) -> Result<Vec<SequenceWindow>> {
    if length == 0 {
        return Err(EtlError::InvalidConfigValueError {
            field: "sequence.length".to_string(),
            value: "0".to_string(),
            reason: "Window length must be at least 1".to_string(),
        });
    }

    let mut windows = Vec::new();
    for group in rows.chunk_by(|a, b| a.match_id() == b.match_id()) {
        let feats: Vec<BallFeatures> = group.iter().map(features).collect();
        for start in 0..feats.len().saturating_sub(length) {
            windows.push(SequenceWindow {
                match_id: group[0].match_id().to_string(),
                start,
                features: feats[start..start + length].to_vec(),
                label: feats[start + length][0],
            });
        }
    }

    tracing::debug!("Built {} windows of length {}", windows.len(), length);
    Ok(windows)
}

/// One JSON object per line.
pub fn to_json_lines(windows: &[SequenceWindow]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for window in windows {
        serde_json::to_writer(&mut out, window)?;
        out.push(b'\n');
    }
    Ok(out)
}
