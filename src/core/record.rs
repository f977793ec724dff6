//! Match record reader and the optional-field accessor layer over the parsed document.
//!
//! Every accessor below owns exactly one "absent field" rule, so the defaulting policy for
//! the whole flattener can be reviewed in this file alone:
//!
//! | accessor | absent → |
//! |---|---|
//! | [`MatchRecord::match_id`] | source file name |
//! | [`MatchRecord::first_date`], `season`, `tournament`, toss, venue, city | `None` |
//! | [`MatchRecord::teams`] | empty |
//! | [`InningsView::team`] | `None` |
//! | [`OverView::number`] | `None` |
//! | [`DeliveryView::batter_runs`] | `null` |
//! | [`DeliveryView::extras`] | `0` |
//! | [`DeliveryView::total`] | batter runs + extras, `null` if either is not a number |
//! | [`DeliveryView::first_wicket`] | `None` |

use crate::domain::model::{Dismissal, MatchContext};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::path::Path;

/// A parsed match file. Nothing beyond successful parsing is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    source: String,
    root: Value,
}

pub fn parse_match(source: &str, bytes: &[u8]) -> Result<MatchRecord> {
    let root = serde_json::from_slice(bytes).map_err(|e| EtlError::ParseError {
        path: source.to_string(),
        source: e,
    })?;

    Ok(MatchRecord {
        source: source.to_string(),
        root,
    })
}

pub fn read_match<P: AsRef<Path>>(path: P) -> Result<MatchRecord> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_match(&source, &bytes).map_err(|e| match e {
        EtlError::ParseError { source, .. } => EtlError::ParseError {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Strings as-is, numbers rendered as text, anything else absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Newer files wrap people and events in `{"name": ...}` objects.
fn name_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(obj) => text(obj.get("name")),
        other => text(Some(other)),
    }
}

fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn array<'a>(value: Option<&'a Value>) -> &'a [Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl MatchRecord {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    fn info(&self, key: &str) -> Option<&Value> {
        self.root.get("info")?.get(key)
    }

    pub fn match_id(&self) -> String {
        text(self.info("match_id")).unwrap_or_else(|| self.source.clone())
    }

    pub fn first_date(&self) -> Option<String> {
        text(array(self.info("dates")).first())
    }

    pub fn season(&self) -> Option<String> {
        text(self.info("season"))
    }

    pub fn tournament(&self) -> Option<String> {
        name_of(self.info("event"))
    }

    pub fn toss_winner(&self) -> Option<String> {
        text(self.info("toss")?.get("winner"))
    }

    pub fn toss_decision(&self) -> Option<String> {
        text(self.info("toss")?.get("decision"))
    }

    pub fn venue(&self) -> Option<String> {
        text(self.info("venue"))
    }

    pub fn city(&self) -> Option<String> {
        text(self.info("city"))
    }

    pub fn teams(&self) -> Vec<String> {
        array(self.info("teams"))
            .iter()
            .filter_map(|team| text(Some(team)))
            .collect()
    }

    pub fn context(&self) -> MatchContext {
        MatchContext {
            match_id: self.match_id(),
            date: self.first_date(),
            season: self.season(),
            tournament: self.tournament(),
            toss_winner: self.toss_winner(),
            toss_decision: self.toss_decision(),
            venue: self.venue(),
            city: self.city(),
        }
    }

    pub fn innings(&self) -> impl Iterator<Item = InningsView<'_>> {
        array(self.root.get("innings")).iter().map(InningsView)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InningsView<'a>(&'a Value);

impl<'a> InningsView<'a> {
    pub fn team(&self) -> Option<String> {
        text(self.0.get("team"))
    }

    pub fn overs(&self) -> impl Iterator<Item = OverView<'a>> {
        array(self.0.get("overs")).iter().map(OverView)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OverView<'a>(&'a Value);

impl<'a> OverView<'a> {
    pub fn number(&self) -> Option<i64> {
        integer(self.0.get("over"))
    }

    pub fn deliveries(&self) -> impl Iterator<Item = DeliveryView<'a>> {
        array(self.0.get("deliveries")).iter().map(DeliveryView)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryView<'a>(&'a Value);

impl<'a> DeliveryView<'a> {
    fn runs(&self, key: &str) -> Option<&'a Value> {
        self.0.get("runs")?.get(key)
    }

    pub fn batter(&self) -> Option<String> {
        text(self.0.get("batter"))
    }

    pub fn non_striker(&self) -> Option<String> {
        text(self.0.get("non_striker"))
    }

    pub fn bowler(&self) -> Option<String> {
        text(self.0.get("bowler"))
    }

    /// Raw value; coercion happens in the cleaning stage.
    pub fn batter_runs(&self) -> Value {
        self.runs("batter").cloned().unwrap_or(Value::Null)
    }

    pub fn extras(&self) -> Value {
        self.runs("extras").cloned().unwrap_or_else(|| Value::from(0))
    }

    pub fn total(&self) -> Value {
        if let Some(total) = self.runs("total") {
            return total.clone();
        }

        let (batter, extras) = (self.batter_runs(), self.extras());
        let exact = match (batter.as_i64(), extras.as_i64()) {
            (Some(b), Some(e)) => b.checked_add(e).map(Value::from),
            _ => None,
        };
        exact.unwrap_or_else(|| match (batter.as_f64(), extras.as_f64()) {
            (Some(b), Some(e)) => Value::from(b + e),
            _ => Value::Null,
        })
    }

    fn wickets(&self) -> &'a [Value] {
        array(self.0.get("wickets"))
    }

    pub fn has_wicket(&self) -> bool {
        !self.wickets().is_empty()
    }

    /// Only the first wicket entry is kept; a second dismissal on the same ball is dropped.
    pub fn first_wicket(&self) -> Option<Dismissal> {
        let wicket = self.wickets().first()?;
        Some(Dismissal {
            kind: text(wicket.get("kind")),
            player_out: text(wicket.get("player_out")),
            fielders: array(wicket.get("fielders"))
                .iter()
                .filter_map(|f| name_of(Some(f)))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> MatchRecord {
        parse_match("1082591.json", value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_match("broken.json", b"{\"info\": ").unwrap_err();
        match err {
            EtlError::ParseError { path, .. } => assert_eq!(path, "broken.json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_object_parses_and_everything_is_absent() {
        let rec = record(json!({}));
        assert_eq!(rec.match_id(), "1082591.json");
        assert_eq!(rec.first_date(), None);
        assert_eq!(rec.tournament(), None);
        assert!(rec.teams().is_empty());
        assert_eq!(rec.innings().count(), 0);
    }

    #[test]
    fn test_match_level_fields() {
        let rec = record(json!({
            "info": {
                "match_id": 335982,
                "dates": ["2008-04-18", "2008-04-19"],
                "season": 2008,
                "event": {"name": "Indian Premier League", "match_number": 1},
                "toss": {"winner": "Royal Challengers Bangalore", "decision": "field"},
                "venue": "M Chinnaswamy Stadium",
                "city": "Bangalore",
                "teams": ["Royal Challengers Bangalore", "Kolkata Knight Riders"]
            }
        }));

        let ctx = rec.context();
        assert_eq!(ctx.match_id, "335982");
        assert_eq!(ctx.date.as_deref(), Some("2008-04-18"));
        assert_eq!(ctx.season.as_deref(), Some("2008"));
        assert_eq!(ctx.tournament.as_deref(), Some("Indian Premier League"));
        assert_eq!(ctx.toss_decision.as_deref(), Some("field"));
        assert_eq!(ctx.city.as_deref(), Some("Bangalore"));
        assert_eq!(rec.teams().len(), 2);
    }

    #[test]
    fn test_plain_string_event_and_text_season() {
        let rec = record(json!({"info": {"event": "IPL", "season": "2007/08"}}));
        assert_eq!(rec.tournament().as_deref(), Some("IPL"));
        assert_eq!(rec.season().as_deref(), Some("2007/08"));
    }

    #[test]
    fn test_delivery_defaults() {
        let rec = record(json!({
            "innings": [{"overs": [{"over": 0, "deliveries": [
                {"runs": {"batter": 4}},
                {"runs": {"batter": 1, "extras": 1}},
                {"runs": {"extras": 1}}
            ]}]}]
        }));
        let innings = rec.innings().next().unwrap();
        let over = innings.overs().next().unwrap();
        let deliveries: Vec<_> = over.deliveries().collect();

        assert_eq!(deliveries[0].extras(), json!(0));
        assert_eq!(deliveries[0].total(), json!(4));
        assert_eq!(deliveries[1].total(), json!(2));
        assert_eq!(deliveries[2].batter_runs(), Value::Null);
        assert_eq!(deliveries[2].total(), Value::Null);
    }

    #[test]
    fn test_derived_total_does_not_overflow() {
        let rec = record(json!({
            "innings": [{"overs": [{"deliveries": [
                {"runs": {"batter": i64::MAX, "extras": 1}},
                {"runs": {"batter": 1.5, "extras": 1}}
            ]}]}]
        }));
        let over = rec.innings().next().unwrap().overs().next().unwrap();
        let deliveries: Vec<_> = over.deliveries().collect();

        assert_eq!(deliveries[0].total(), json!(i64::MAX as f64 + 1.0));
        assert_eq!(deliveries[1].total(), json!(2.5));
    }

    #[test]
    fn test_out_of_range_over_number_is_absent() {
        let rec = record(json!({
            "innings": [{"overs": [
                {"over": 1e30, "deliveries": []},
                {"over": 3.0, "deliveries": []},
                {"over": 2.5, "deliveries": []}
            ]}]
        }));
        let numbers: Vec<Option<i64>> = rec
            .innings()
            .next()
            .unwrap()
            .overs()
            .map(|o| o.number())
            .collect();
        assert_eq!(numbers, vec![None, Some(3), None]);
    }

    #[test]
    fn test_explicit_null_extras_is_kept_null() {
        let rec = record(json!({
            "innings": [{"overs": [{"deliveries": [{"runs": {"batter": 0, "extras": null}}]}]}]
        }));
        let d = rec.innings().next().unwrap().overs().next().unwrap().deliveries().next().unwrap();
        assert_eq!(d.extras(), Value::Null);
    }

    #[test]
    fn test_first_wicket_accepts_named_fielders() {
        let rec = record(json!({
            "innings": [{"overs": [{"deliveries": [{
                "runs": {"batter": 0},
                "wickets": [
                    {"kind": "caught", "player_out": "SC Ganguly", "fielders": [{"name": "JH Kallis"}, "Z Khan"]},
                    {"kind": "run out", "player_out": "RT Ponting"}
                ]
            }]}]}]
        }));
        let d = rec.innings().next().unwrap().overs().next().unwrap().deliveries().next().unwrap();
        let dismissal = d.first_wicket().unwrap();

        assert!(d.has_wicket());
        assert_eq!(dismissal.kind.as_deref(), Some("caught"));
        assert_eq!(dismissal.player_out.as_deref(), Some("SC Ganguly"));
        assert_eq!(dismissal.fielders, vec!["JH Kallis", "Z Khan"]);
    }

    #[test]
    fn test_empty_wickets_list_is_no_wicket() {
        let rec = record(json!({
            "innings": [{"overs": [{"deliveries": [{"runs": {"batter": 0}, "wickets": []}]}]}]
        }));
        let d = rec.innings().next().unwrap().overs().next().unwrap().deliveries().next().unwrap();
        assert!(!d.has_wicket());
        assert!(d.first_wicket().is_none());
    }

    #[test]
    fn test_read_match_uses_file_name_as_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("980901.json");
        std::fs::write(&path, r#"{"info": {}}"#).unwrap();

        let rec = read_match(&path).unwrap();
        assert_eq!(rec.source(), "980901.json");
        assert_eq!(rec.match_id(), "980901.json");
    }
}
