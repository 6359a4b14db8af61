use crate::error::{QueryError, Result};
use crate::record::{self, MovieRecord, RawRow};
use log::{debug, info};
use polars::prelude::*;
use polars_utils::plpath::PlPath;
use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::Path;

/// Read every row of the source CSV as text, keyed by header name.
///
/// Schema inference is disabled so that coercion stays with the record
/// model instead of polars guessing column types.
fn read_raw_rows(file_path: &str) -> Result<Vec<RawRow>> {
    let unreadable = |reason: String| QueryError::SourceUnreadable {
        path: file_path.into(),
        reason,
    };

    // Tell a missing file apart from one polars cannot open
    match std::fs::metadata(file_path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(unreadable("not a regular file".to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(QueryError::SourceNotFound {
                path: file_path.into(),
            });
        }
        Err(e) => return Err(unreadable(e.to_string())),
    }

    let df = LazyCsvReader::new(PlPath::new(file_path))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| unreadable(e.to_string()))?;

    // Every column is Utf8 since nothing was inferred
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let values = column.str().map_err(|e| unreadable(e.to_string()))?;
        columns.push((column.name().to_string(), values));
    }
    debug!(
        "{}: {} rows, columns [{}]",
        file_path,
        df.height(),
        columns
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let rows = (0..df.height())
        .map(|idx| {
            // null cells become empty text
            columns
                .iter()
                .map(|(name, values)| {
                    (name.clone(), values.get(idx).unwrap_or_default().to_string())
                })
                .collect()
        })
        .collect();

    Ok(rows)
}

/// Rated movies first, highest rating first; unrated movies keep file order
/// at the end.
pub fn by_rating_desc(a: &MovieRecord, b: &MovieRecord) -> Ordering {
    match (a.imdb_rating, b.imdb_rating) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Load and validate every movie in `file_path`, sorted by IMDb rating.
///
/// The first row that fails validation aborts the whole load.
pub fn load(file_path: &str) -> Result<Vec<MovieRecord>> {
    let rows = read_raw_rows(file_path)?;

    let mut movies = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            record::parse_row(row).map_err(|source| QueryError::InvalidRow {
                row: idx + 1,
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    movies.sort_by(by_rating_desc);
    info!("Loaded {} movies from {}", movies.len(), file_path);
    Ok(movies)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use std::io::Write;

    pub(crate) const HEADER: &str = "series_title,released_year,certificate,runtime,genre,imdb_rating,overview,meta_score,director,star_1,star_2,star_3,star_4,no_of_votes,gross";

    /// Five movies, deliberately out of rating order.
    pub(crate) const FIXTURE_ROWS: [&str; 5] = [
        r#"Inception,2010,UA,148 min,"Action, Adventure, Sci-Fi",8.8,A thief steals secrets.,74,Christopher Nolan,Leonardo DiCaprio,Joseph Gordon-Levitt,Elliot Page,Ken Watanabe,2067042,"292,576,195""#,
        r#"The Intouchables,2011,UA,112 min,"Biography, Comedy, Drama",8.5,An unlikely friendship.,57,Olivier Nakache,Éric Toledano,François Cluzet,Omar Sy,Anne Le Ny,760360,"13,182,281""#,
        r#"The Shawshank Redemption,1994,A,142 min,Drama,9.3,Two imprisoned men bond.,80,Frank Darabont,Tim Robbins,Morgan Freeman,Bob Gunton,William Sadler,2343110,"28,341,469""#,
        r#"Interstellar,2014,UA,169 min,"Adventure, Drama, Sci-Fi",8.6,Explorers travel through a wormhole.,74,Christopher Nolan,Matthew McConaughey,Anne Hathaway,Jessica Chastain,Mackenzie Foy,1512360,"188,020,017""#,
        r#"Whiplash,2014,A,106 min,"Drama, Music",8.5,A drummer is pushed to the limit.,,Damien Chazelle,Miles Teller,J.K. Simmons,Melissa Benoist,Paul Reiser,717585,"13,092,000""#,
    ];

    pub(crate) fn create_test_csv(path: &str, rows: &[&str]) -> Result<()> {
        let mut file = fs::File::create(path)?;
        writeln!(file, "{}", HEADER)?;
        for row in rows {
            writeln!(file, "{}", row)?;
        }
        Ok(())
    }

    #[test]
    fn test_load_sorts_by_rating() -> Result<()> {
        let test_file = std::env::temp_dir().join("mq_load_sorted.csv");
        create_test_csv(test_file.to_str().unwrap(), &FIXTURE_ROWS)?;

        let movies = load(test_file.to_str().unwrap())?;
        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            [
                "The Shawshank Redemption",
                "Inception",
                "Interstellar",
                "The Intouchables",
                "Whiplash",
            ]
        );
        assert_eq!(movies[1].gross, Some(292576195));
        assert_eq!(movies[1].genre.as_deref(), Some("Action, Adventure, Sci-Fi"));

        fs::remove_file(test_file)?;
        Ok(())
    }

    #[test]
    fn test_empty_meta_score_is_missing() -> Result<()> {
        let test_file = std::env::temp_dir().join("mq_load_meta.csv");
        create_test_csv(test_file.to_str().unwrap(), &FIXTURE_ROWS[2..])?;

        let movies = load(test_file.to_str().unwrap())?;
        assert_eq!(movies.len(), 3);
        let whiplash = movies.iter().find(|m| m.title == "Whiplash").unwrap();
        assert_eq!(whiplash.meta_score, None);
        assert!(movies.iter().filter(|m| m.title != "Whiplash").all(|m| m.meta_score.is_some()));

        fs::remove_file(test_file)?;
        Ok(())
    }

    #[test]
    fn test_unrated_movies_sort_last() -> Result<()> {
        let test_file = std::env::temp_dir().join("mq_load_unrated.csv");
        create_test_csv(
            test_file.to_str().unwrap(),
            &[
                "Unrated One,2001,,90 min,Drama,,,,,,,,,,",
                FIXTURE_ROWS[4],
                "Unrated Two,2002,,95 min,Drama,,,,,,,,,,",
                FIXTURE_ROWS[2],
            ],
        )?;

        let movies = load(test_file.to_str().unwrap())?;
        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            ["The Shawshank Redemption", "Whiplash", "Unrated One", "Unrated Two"]
        );

        fs::remove_file(test_file)?;
        Ok(())
    }

    #[test]
    fn test_invalid_row_aborts_load() -> Result<()> {
        let test_file = std::env::temp_dir().join("mq_load_invalid.csv");
        create_test_csv(
            test_file.to_str().unwrap(),
            &[FIXTURE_ROWS[0], "Broken,2000,,90 min,Drama,11.2,,,,,,,,10,"],
        )?;

        let err = load(test_file.to_str().unwrap()).unwrap_err();
        match err {
            QueryError::InvalidRow { row, source } => {
                assert_eq!(row, 2);
                assert_eq!(source.field, "imdb_rating");
            }
            other => panic!("unexpected error: {other}"),
        }

        fs::remove_file(test_file)?;
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let result = load("mq_nonexistent_file.csv");
        assert!(matches!(result, Err(QueryError::SourceNotFound { .. })));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = std::env::temp_dir();
        let result = load(dir.to_str().unwrap());
        assert!(matches!(result, Err(QueryError::SourceUnreadable { .. })));
    }
}
