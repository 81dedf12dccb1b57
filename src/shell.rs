use crate::error::QueryError;
use crate::recommender::{GenreQuery, Recommender};
use crate::render;
use crate::session::{QueryKind, Session};
use log::debug;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
Enter an anime title to get genre-similar recommendations.
Commands:
  :genre <genres>[ @<category>]  search by genre text, e.g. :genre Romance, School @TV
  :category <category>           random titles of one format (TV, Movie, OVA, ...)
  :top [category]                highest rated titles
  :history                       past searches, newest first
  :recent                        past recommendations, newest first
  :clear                         forget this session's history
  :help                          show this message
  :quit                          leave";

pub struct ShellOptions {
    pub count: usize,
    pub json: bool,
}

enum Step {
    Continue,
    Quit,
}

/// Interactive loop: one query per line, each resolved fully before the next.
pub fn run<R: BufRead, W: Write>(
    engine: &Recommender,
    session: &mut Session,
    input: R,
    mut out: W,
    options: &ShellOptions,
) -> io::Result<()> {
    writeln!(
        out,
        "{} titles loaded. Type :help for commands.",
        engine.catalog().len()
    )?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Shell input: {}", line);
        if let Step::Quit = dispatch(engine, session, line, &mut out, options)? {
            break;
        }
    }
    Ok(())
}

fn dispatch<W: Write>(
    engine: &Recommender,
    session: &mut Session,
    line: &str,
    out: &mut W,
    options: &ShellOptions,
) -> io::Result<Step> {
    let (command, argument) = match line.strip_prefix(':') {
        Some(rest) => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let command = parts.next().unwrap_or_default().to_ascii_lowercase();
            (Some(command), parts.next().unwrap_or_default().trim())
        }
        None => (None, line),
    };

    match command.as_deref() {
        None => match engine.find_by_title(argument, options.count) {
            Ok(records) => {
                render::write_records(out, &records, options.json)?;
                let canonical = engine
                    .catalog()
                    .position_of(argument)
                    .and_then(|p| engine.catalog().get(p))
                    .map_or_else(|| argument.to_string(), |e| e.title.clone());
                session.record(QueryKind::Title(canonical), records);
            }
            Err(err @ QueryError::TitleNotFound { .. }) => {
                writeln!(out, "{}", err)?;
                if !err.suggestions().is_empty() {
                    writeln!(out, "Did you mean: {}?", err.suggestions().join(", "))?;
                }
            }
        },
        Some("genre") => {
            let (genres, category) = match argument.split_once('@') {
                Some((genres, category)) => (genres.trim(), Some(category.trim())),
                None => (argument, None),
            };
            if genres.is_empty() {
                writeln!(out, "Usage: :genre <genres>[ @<category>]")?;
                return Ok(Step::Continue);
            }
            let records = engine.search(&GenreQuery::new(genres, options.count).category(category));
            render::write_records(out, &records, options.json)?;
            session.record(QueryKind::Genre(genres.to_string()), records);
        }
        Some("category") => {
            if argument.is_empty() {
                writeln!(out, "Available: {}", engine.catalog().categories().join(", "))?;
                return Ok(Step::Continue);
            }
            let records = engine.find_by_category_sample(argument, options.count);
            render::write_records(out, &records, options.json)?;
            session.record(QueryKind::Category(argument.to_string()), records);
        }
        Some("top") => {
            let category = Some(argument).filter(|c| !c.is_empty());
            let records = engine.top_rated(options.count, category);
            render::write_records(out, &records, options.json)?;
        }
        Some("history") => render::write_history(out, session)?,
        Some("recent") => render::write_recent(out, session)?,
        Some("clear") => {
            session.clear();
            writeln!(out, "History cleared.")?;
        }
        Some("help") => writeln!(out, "{}", HELP)?,
        Some("quit") | Some("exit") | Some("q") => return Ok(Step::Quit),
        Some(other) => writeln!(out, "Unknown command ':{}'. Type :help for commands.", other)?,
    }

    Ok(Step::Continue)
}
