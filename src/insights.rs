use crate::record::MovieRecord;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::hash::Hash;
use std::io::{self, Write};
use std::str::FromStr;

/// How `--insights` groups the final result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Genre,
    Year,
}

impl FromStr for InsightKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre" => Ok(InsightKind::Genre),
            "year" => Ok(InsightKind::Year),
            _ => Err(()),
        }
    }
}

/// Averages over the movies of one group that have rating, gross and
/// runtime all present.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats<K> {
    pub key: K,
    pub count: usize,
    pub mean_rating: f64,
    pub mean_gross: i64,
    pub mean_runtime: i64,
}

/// Running totals. Integer sums are kept in i128.
#[derive(Default)]
struct Sums {
    rating: f64,
    gross: i128,
    runtime: i128,
    count: usize,
}

/// Group `movies` by every key `key_fn` yields for them and average each
/// group. Groups are returned in first-appearance order.
///
/// A movie missing rating, gross or runtime is left out of all three
/// averages so the denominators agree. Groups left empty are dropped.
pub fn aggregate_by<K, F, I>(movies: &[MovieRecord], key_fn: F) -> Vec<GroupStats<K>>
where
    K: Eq + Hash,
    F: Fn(&MovieRecord) -> I,
    I: IntoIterator<Item = K>,
{
    let mut groups: IndexMap<K, Sums> = IndexMap::new();
    for movie in movies {
        // incomplete movies count toward no average
        let (Some(rating), Some(gross), Some(runtime)) =
            (movie.imdb_rating, movie.gross, movie.runtime)
        else {
            continue;
        };
        for key in key_fn(movie) {
            let sums = groups.entry(key).or_default();
            sums.rating += rating;
            sums.gross += i128::from(gross);
            sums.runtime += i128::from(runtime);
            sums.count += 1;
        }
    }

    groups
        .into_iter()
        .map(|(key, sums)| {
            let count = sums.count as i128;
            // a mean of i64 values always fits back into an i64
            GroupStats {
                key,
                count: sums.count,
                mean_rating: sums.rating / sums.count as f64,
                mean_gross: sums.gross.div_euclid(count) as i64,
                mean_runtime: sums.runtime.div_euclid(count) as i64,
            }
        })
        .collect()
}

/// One group per genre, in first-appearance order.
pub fn by_genre(movies: &[MovieRecord]) -> Vec<GroupStats<String>> {
    aggregate_by(movies, |movie| {
        movie.genres().map(str::to_string).collect::<Vec<_>>()
    })
}

/// One group per release year, most recent first.
pub fn by_year(movies: &[MovieRecord]) -> Vec<GroupStats<i64>> {
    // Option<i64> iterates to zero or one key
    let mut stats = aggregate_by(movies, |movie| movie.released_year);
    stats.sort_by(|a, b| b.key.cmp(&a.key));
    stats
}

fn write_stats<W: Write, K: fmt::Display>(
    out: &mut W,
    label: &str,
    stats: &[GroupStats<K>],
) -> io::Result<()> {
    for stat in stats {
        debug!("{} {}: {} movies with complete data", label, stat.key, stat.count);
        writeln!(
            out,
            "{}: {}, Average Rating: {:.2}, Average Gross: ${}, Average Runtime: {} mins",
            label, stat.key, stat.mean_rating, stat.mean_gross, stat.mean_runtime
        )?;
    }
    Ok(())
}

pub fn write_insights<W: Write>(
    out: &mut W,
    kind: InsightKind,
    movies: &[MovieRecord],
) -> io::Result<()> {
    match kind {
        InsightKind::Genre => {
            writeln!(out, "Printing insights by genre:")?;
            write_stats(out, "Genre", &by_genre(movies))
        }
        InsightKind::Year => {
            writeln!(out, "Printing insights by year:")?;
            write_stats(out, "Year", &by_year(movies))
        }
    }
}
