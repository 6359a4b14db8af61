mod args;
mod commands;
mod error;
mod filter;
mod insights;
mod loader;
mod output;
mod record;

use anyhow::Result;
use clap::Parser;
use commands::CommandPlan;
use log::{debug, warn};
use std::io::{self, Write};
use std::path::Path;

/// Data file used when no CSV file is named.
const DEFAULT_SOURCE: &str = "imdb_top_1000.csv";
const SOURCE_EXTENSION: &str = "csv";

const HELP_TEXT: &str = "\
Movie Query Tool

FORMAT: mq [movie_file_name.csv] [--flag (value | 'value')]...

    Available filter flags:
        --year-before integer
        --year-after integer
            filter movies released before or after a given year
            example: --year-after 2000
        --rating-above number
        --rating-below number
            filter movies with an IMDB rating above or below a given value in [0.0 - 10.0]
            example: --rating-above 8.3
        --runtime-above number
        --runtime-below number
            filter movies with a runtime above or below a given time value in minutes
            example: --runtime-above 120
        --gross-above number
        --gross-below number
            filter movies with a gross revenue above or below a given dollar value
            example: --gross-above 100000000
        --score-above number
        --score-below number
            filter movies with a meta score above or below a given value in [0 - 100]
            example: --score-above 80
        --votes-above number
        --votes-below number
            filter movies with a number of votes above or below a given value
            example: --votes-above 1000000
        --title 'string'
        --director 'string'
        --actor 'string'
        --genre 'string'
        --age-rating 'string'
            filter movies by title, director, actor, genre or age rating
            example: --director 'Christopher Nolan' --age-rating 'PG-13'

    Available command flags:
        --top-ten 'highest-rated' | 'most-popular' | 'highest-grossing'
                | 'longest-runtime' | 'hidden-gems'
            reduce the results to a top 10 list of the highest rated, most popular,
            highest grossing, longest or hidden gem (highly rated with few votes) movies
        --output 'filename[.json | .csv | .txt]'
            save the results to a file; the extension picks the format, anything
            other than json or csv is written as plain text
        --insights 'genre' | 'year'
            average rating, gross and runtime of the results by genre or year

    All filters must match. Filters and commands may appear in any order.
    Set RUST_LOG=info or RUST_LOG=debug for more detail on stderr.
";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mq",
    about = "Query and analyse a CSV dataset of movies",
    version = "0.1.0",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Optional source file followed by `--flag value` pairs
    #[arg(value_name = "ARGS", allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
}

impl Cli {
    fn wants_help(&self) -> bool {
        matches!(self.args.first().map(String::as_str), Some("--help" | "-h"))
            || self.args.iter().any(|arg| arg == "--help")
    }
}

/// Pick the source file and the index where the flags start.
///
/// Only a `.csv` first token is consumed as the source. Any other token is
/// left for the classifier.
fn resolve_source(tokens: &[String]) -> (String, usize) {
    match tokens.first() {
        Some(first)
            if Path::new(first).extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) =>
        {
            (first.clone(), 1)
        }
        // flags only, or nothing at all
        None => {
            warn!("File Missing. Using default data file.");
            (DEFAULT_SOURCE.to_string(), 0)
        }
        Some(first) if first.starts_with(args::FLAG_PREFIX) => {
            warn!("File Missing. Using default data file.");
            (DEFAULT_SOURCE.to_string(), 0)
        }
        Some(first) => {
            warn!("Invalid file format '{}'. Using default data file.", first);
            (DEFAULT_SOURCE.to_string(), 0)
        }
    }
}

/// Classify the arguments, load the source, filter, then run the commands.
///
/// Arguments and command values are validated before the source is read,
/// so a bad invocation never touches the filesystem.
fn run<W: Write>(tokens: &[String], out: &mut W) -> Result<Vec<record::MovieRecord>> {
    let (source, start) = resolve_source(tokens);
    let (filters, commands) = args::classify(tokens, start)?;
    let plan = CommandPlan::from_commands(&commands)?;
    debug!("source: {}, {} filters, plan: {:?}", source, filters.len(), plan);

    let movies = loader::load(&source)?;

    let results = if filters.is_empty() {
        movies
    } else {
        let results = filter::apply(movies, &filters)?;
        writeln!(out, "Found {} movies matching the filter flags", results.len())?;
        results
    };

    Ok(commands::perform(results, &plan, out)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.wants_help() {
        print!("{}", HELP_TEXT);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cli.args, &mut out)?;
    out.flush()?;
    Ok(())
}
