use crate::domain::model::{CleanDeliveryRow, FielderColumns};
use crate::utils::error::{EtlError, Result};
use std::io::Write;

/// Columns every export starts with, in flattener order.
pub const BASE_COLUMNS: [&str; 19] = [
    "match_id",
    "date",
    "season",
    "tournament",
    "toss_winner",
    "toss_decision",
    "venue",
    "city",
    "batting_team",
    "bowling_team",
    "over",
    "ball",
    "batter",
    "non_striker",
    "bowler",
    "runs",
    "extras",
    "runs_total",
    "wicket",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub fielder_columns: FielderColumns,
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fielder_columns: FielderColumns::Dynamic,
            delimiter: b',',
        }
    }
}

/// Trailing wicket columns resolved against a concrete table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WicketLayout {
    detail: bool,
    fielder_slots: usize,
}

fn cell<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    fn layout(&self, rows: &[CleanDeliveryRow]) -> WicketLayout {
        match self.options.fielder_columns {
            FielderColumns::Dynamic => WicketLayout {
                detail: rows.iter().any(|r| r.dismissal.is_some()),
                fielder_slots: rows.iter().map(|r| r.fielder_count()).max().unwrap_or(0),
            },
            FielderColumns::Fixed(slots) => WicketLayout {
                detail: true,
                fielder_slots: slots,
            },
        }
    }

    /// Header for this table. With dynamic fielder columns it changes with the data.
    pub fn columns(&self, rows: &[CleanDeliveryRow]) -> Vec<String> {
        self.columns_for(self.layout(rows))
    }

    fn columns_for(&self, layout: WicketLayout) -> Vec<String> {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        if layout.detail {
            columns.push("wicket_kind".to_string());
            columns.push("player_out".to_string());
            columns.extend((1..=layout.fielder_slots).map(|i| format!("fielder_{}", i)));
        }
        columns
    }

    fn record(row: &CleanDeliveryRow, layout: WicketLayout) -> Vec<String> {
        let ctx = &row.context;
        let mut fields = vec![
            ctx.match_id.clone(),
            cell(&ctx.date),
            cell(&ctx.season),
            cell(&ctx.tournament),
            cell(&ctx.toss_winner),
            cell(&ctx.toss_decision),
            cell(&ctx.venue),
            cell(&ctx.city),
            cell(&row.batting_team),
            cell(&row.bowling_team),
            cell(&row.over),
            row.ball.to_string(),
            cell(&row.batter),
            cell(&row.non_striker),
            cell(&row.bowler),
            cell(&row.runs),
            cell(&row.extras),
            cell(&row.runs_total),
            row.wicket.to_string(),
        ];

        if layout.detail {
            let dismissal = row.dismissal.as_ref();
            fields.push(cell(&dismissal.and_then(|d| d.kind.clone())));
            fields.push(cell(&dismissal.and_then(|d| d.player_out.clone())));
            for slot in 0..layout.fielder_slots {
                fields.push(cell(&dismissal.and_then(|d| d.fielders.get(slot).cloned())));
            }
        }
        fields
    }

    pub fn write<W: Write>(&self, rows: &[CleanDeliveryRow], writer: W) -> Result<Vec<String>> {
        let layout = self.layout(rows);
        let columns = self.columns_for(layout);

        let truncated = rows
            .iter()
            .filter(|r| r.fielder_count() > layout.fielder_slots)
            .count();
        if truncated > 0 {
            tracing::warn!(
                "{} deliveries list more than {} fielders; extra fielders were not exported",
                truncated,
                layout.fielder_slots
            );
        }

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .from_writer(writer);
        wtr.write_record(&columns)?;
        for row in rows {
            wtr.write_record(Self::record(row, layout))?;
        }
        wtr.flush()?;

        Ok(columns)
    }

    /// Returns the encoded table and the header it was written with.
    pub fn to_bytes(&self, rows: &[CleanDeliveryRow]) -> Result<(Vec<u8>, Vec<String>)> {
        let mut buffer = Vec::new();
        let columns = self.write(rows, &mut buffer)?;
        Ok((buffer, columns))
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

/// Reads a previously exported table back into header + string records.
pub fn read_table(bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(bytes);
    let header = rdr.headers()?.iter().map(str::to_string).collect();
    let records = rdr
        .records()
        .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()
        .map_err(EtlError::from)?;
    Ok((header, records))
}
