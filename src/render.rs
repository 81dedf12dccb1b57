use crate::recommender::ResultRecord;
use crate::session::Session;
use std::io::{self, Write};

pub fn card(record: &ResultRecord) -> String {
    let mut line = format!("{}\n    Genre: {}\n    Rating: {:.2}", record.title, record.genre, record.rating);
    if let Some(category) = &record.category {
        line.push_str(&format!(" | {}", category));
    }
    if let Some(members) = record.members {
        line.push_str(&format!(" | {} members", members));
    }
    if let Some(distance) = record.distance {
        line.push_str(&format!(" | similarity {:.3}", 1.0 - distance));
    }
    line
}

pub fn write_records<W: Write>(out: &mut W, records: &[ResultRecord], json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, records)?;
        return writeln!(out);
    }

    if records.is_empty() {
        return writeln!(out, "No results.");
    }
    for (rank, record) in records.iter().enumerate() {
        writeln!(out, "{:>2}. {}", rank + 1, card(record))?;
    }
    Ok(())
}

pub fn write_history<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    if session.is_empty() {
        return writeln!(out, "No searches yet.");
    }
    writeln!(out, "Last {} searches, newest first:", session.len())?;
    for entry in session.history() {
        writeln!(out, "[{}] {}", entry.at.format("%H:%M:%S"), entry.query)?;
    }
    Ok(())
}

pub fn write_recent<W: Write>(out: &mut W, session: &Session) -> io::Result<()> {
    if session.is_empty() {
        return writeln!(out, "No recommendations yet.");
    }
    for recommendation in session.recommendations() {
        writeln!(out, "For: {}", recommendation.query)?;
        write_records(out, &recommendation.results, false)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QueryKind;

    fn record() -> ResultRecord {
        ResultRecord {
            title: "Trigun".to_string(),
            genre: "Action, Comedy, Sci-Fi".to_string(),
            rating: 8.32,
            members: Some(283069),
            category: Some("TV".to_string()),
            distance: Some(0.25),
        }
    }

    #[test]
    fn card_includes_optional_fields() {
        let text = card(&record());
        assert!(text.starts_with("Trigun\n"));
        assert!(text.contains("Rating: 8.32 | TV | 283069 members | similarity 0.750"));
    }

    #[test]
    fn empty_results_render_a_message() {
        let mut out = Vec::new();
        write_records(&mut out, &[], false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No results.\n");
    }

    #[test]
    fn json_output_is_an_array() {
        let mut out = Vec::new();
        write_records(&mut out, &[record()], true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["title"], "Trigun");
        assert_eq!(value[0]["distance"], 0.25);
    }

    #[test]
    fn history_header_counts_recorded_searches() {
        let mut session = Session::new(10);
        session.record(QueryKind::Title("Trigun".to_string()), vec![record()]);
        session.record(QueryKind::Genre("Comedy".to_string()), Vec::new());

        let mut out = Vec::new();
        write_history(&mut out, &session).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Last 2 searches, newest first:\n"));
        assert_eq!(text.lines().count(), 3);
    }
}
