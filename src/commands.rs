use crate::args::{CommandFlag, CommandSet, FLAG_PREFIX};
use crate::error::{QueryError, Result};
use crate::insights::{self, InsightKind};
use crate::output;
use crate::record::MovieRecord;
use std::io::Write;
use std::str::FromStr;

/// Maximum size of a `--top-ten` list.
pub const TOP_N: usize = 10;

/// Ranking criteria for `--top-ten`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopTen {
    HighestRated,
    MostPopular,
    HighestGrossing,
    LongestRuntime,
    HiddenGems,
}

impl FromStr for TopTen {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest-rated" => Ok(TopTen::HighestRated),
            "most-popular" => Ok(TopTen::MostPopular),
            "highest-grossing" => Ok(TopTen::HighestGrossing),
            "longest-runtime" => Ok(TopTen::LongestRuntime),
            "hidden-gems" => Ok(TopTen::HiddenGems),
            _ => Err(()),
        }
    }
}

impl TopTen {
    /// Ranking key, higher ranks first. `None` keeps the movie out of the list.
    fn key(self, movie: &MovieRecord) -> Option<f64> {
        match self {
            TopTen::HighestRated => movie.imdb_rating,
            TopTen::MostPopular => movie.no_of_votes.map(|v| v as f64),
            TopTen::HighestGrossing => movie.gross.map(|g| g as f64),
            TopTen::LongestRuntime => movie.runtime.map(|r| r as f64),
            TopTen::HiddenGems => match (movie.imdb_rating, movie.no_of_votes) {
                (Some(rating), Some(votes)) if votes > 0 => Some(rating / votes as f64),
                _ => None,
            },
        }
    }

    /// At most `TOP_N` movies, best first. Ties keep their input order.
    pub fn select(self, movies: Vec<MovieRecord>) -> Vec<MovieRecord> {
        let mut ranked: Vec<(f64, MovieRecord)> = movies
            .into_iter()
            .filter_map(|movie| self.key(&movie).map(|key| (key, movie)))
            .collect();
        // sort_by is stable, so equal keys keep input order
        ranked.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        ranked.into_iter().take(TOP_N).map(|(_, movie)| movie).collect()
    }
}

/// Validated command flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandPlan {
    pub top_ten: Option<TopTen>,
    pub output: Option<String>,
    pub insights: Option<InsightKind>,
}

fn parse_command<T: FromStr>(commands: &CommandSet, flag: CommandFlag) -> Result<Option<T>> {
    commands
        .get(flag)
        .map(|value| {
            value.parse().map_err(|_| QueryError::UnknownCommandValue {
                flag: format!("{}{}", FLAG_PREFIX, flag.name()),
                value: value.to_string(),
            })
        })
        .transpose()
}

impl CommandPlan {
    pub fn from_commands(commands: &CommandSet) -> Result<Self> {
        Ok(CommandPlan {
            top_ten: parse_command(commands, CommandFlag::TopTen)?,
            output: commands.get(CommandFlag::Output).map(str::to_string),
            insights: parse_command(commands, CommandFlag::Insights)?,
        })
    }
}

fn terminal_error(e: std::io::Error) -> QueryError {
    QueryError::OutputWrite {
        path: "<stdout>".to_string(),
        reason: e.to_string(),
    }
}

/// Run the plan over the filtered movies: reduce to a top-ten list, write
/// the result to a file or to `out`, then report insights on that same
/// result. Returns the movies that were written.
pub fn perform<W: Write>(
    movies: Vec<MovieRecord>,
    plan: &CommandPlan,
    out: &mut W,
) -> Result<Vec<MovieRecord>> {
    let movies = match plan.top_ten {
        Some(criterion) => criterion.select(movies),
        None => movies,
    };

    // A file destination replaces the terminal listing
    match &plan.output {
        Some(output_path) => {
            output::write_output_file(&movies, output_path)?;
            writeln!(out, "Printed {} movies to file {}", movies.len(), output_path)
                .map_err(terminal_error)?;
        }
        None => {
            output::write_listing(out, &movies).map_err(terminal_error)?;
            writeln!(out, "Printed {} movies to terminal", movies.len()).map_err(terminal_error)?;
        }
    }

    if let Some(kind) = plan.insights {
        insights::write_insights(out, kind, &movies).map_err(terminal_error)?;
    }

    Ok(movies)
}
