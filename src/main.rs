mod catalog;
mod catalog_loader;
mod cli;
mod config;
mod error;
mod filters;
mod recommender;
mod render;
mod session;
mod shell;
mod similarity_index;
mod vectorizer;

use clap::Parser;
use cli::{CliArgs, Command};
use log::{error, info};
use recommender::{GenreQuery, Recommender};
use session::Session;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_timestamp_millis()
        .try_init();

    let config = args.engine_config();
    info!("Loading catalog from {}", config.catalog_path.display());

    let engine = match Recommender::load(&config) {
        Ok((engine, report)) => {
            if !report.errors.is_empty() {
                info!("{} malformed catalog rows were skipped", report.errors.len());
            }
            engine
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&engine, &args, config.history_limit) {
        Ok(code) => code,
        Err(e) => {
            error!("Output error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Recommender, args: &CliArgs, history_limit: usize) -> io::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let default_command = Command::Shell {
        count: 5,
        history_limit: None,
    };
    let command = args.command.as_ref().unwrap_or(&default_command);

    match command {
        Command::Title { title, count } => match engine.find_by_title(title, *count) {
            Ok(records) => render::write_records(&mut out, &records, args.json)?,
            Err(e) => {
                writeln!(io::stderr(), "{}", e)?;
                if !e.suggestions().is_empty() {
                    writeln!(io::stderr(), "Did you mean: {}?", e.suggestions().join(", "))?;
                }
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Genre {
            genres,
            count,
            category,
            sort,
            no_contains,
            min_rating,
            pool,
        } => {
            let query = GenreQuery::new(genres.as_str(), *count)
                .category(category.as_deref())
                .require_genre_match(!no_contains)
                .min_rating(*min_rating)
                .sort(*sort)
                .candidate_pool(*pool);
            render::write_records(&mut out, &engine.search(&query), args.json)?;
        }
        Command::Category { category, count } => {
            let records = engine.find_by_category_sample(category, *count);
            render::write_records(&mut out, &records, args.json)?;
        }
        Command::Top { count, category } => {
            let records = engine.top_rated(*count, category.as_deref());
            render::write_records(&mut out, &records, args.json)?;
        }
        Command::Genres => {
            for term in engine.vectorizer().vocabulary() {
                writeln!(out, "{:<20} {:>6} titles  idf {:.3}", term.term, term.document_frequency, term.idf)?;
            }
        }
        Command::Categories => {
            for category in engine.catalog().categories() {
                writeln!(out, "{}", category)?;
            }
        }
        Command::Shell { count, .. } => {
            let mut session = Session::new(history_limit);
            let options = shell::ShellOptions {
                count: *count,
                json: args.json,
            };
            shell::run(engine, &mut session, io::stdin().lock(), &mut out, &options)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
