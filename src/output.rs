use crate::error::{QueryError, Result};
use crate::record::{FIELD_NAMES, MovieRecord};
use log::{debug, info};
use polars::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl OutputFormat {
    /// Detect the format from the file extension; anything that is not
    /// `json` or `csv` is plain text.
    pub fn from_path(output_path: &str) -> Self {
        match Path::new(output_path).extension().and_then(|e| e.to_str()) {
            Some("json") => OutputFormat::Json,
            Some("csv") => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

fn text_column<'a>(
    name: &'static str,
    movies: &'a [MovieRecord],
    field: impl Fn(&'a MovieRecord) -> Option<&'a str>,
) -> Column {
    let values: Vec<Option<&str>> = movies.iter().map(field).collect();
    Column::new(PlSmallStr::from_static(name), values)
}

fn int_column(
    name: &'static str,
    movies: &[MovieRecord],
    field: impl Fn(&MovieRecord) -> Option<i64>,
) -> Column {
    let values: Vec<Option<i64>> = movies.iter().map(field).collect();
    Column::new(PlSmallStr::from_static(name), values)
}

/// A typed frame with one column per record field, in `FIELD_NAMES` order.
pub fn to_dataframe(movies: &[MovieRecord]) -> PolarsResult<DataFrame> {
    let ratings: Vec<Option<f64>> = movies.iter().map(|m| m.imdb_rating).collect();

    DataFrame::new(vec![
        text_column("series_title", movies, |m| Some(m.title.as_str())),
        int_column("released_year", movies, |m| m.released_year),
        text_column("certificate", movies, |m| m.certificate.as_deref()),
        int_column("runtime", movies, |m| m.runtime),
        text_column("genre", movies, |m| m.genre.as_deref()),
        Column::new(PlSmallStr::from_static("imdb_rating"), ratings),
        text_column("overview", movies, |m| m.overview.as_deref()),
        int_column("meta_score", movies, |m| m.meta_score),
        text_column("director", movies, |m| m.director.as_deref()),
        text_column("star_1", movies, |m| m.stars[0].as_deref()),
        text_column("star_2", movies, |m| m.stars[1].as_deref()),
        text_column("star_3", movies, |m| m.stars[2].as_deref()),
        text_column("star_4", movies, |m| m.stars[3].as_deref()),
        int_column("no_of_votes", movies, |m| m.no_of_votes),
        int_column("gross", movies, |m| m.gross),
    ])
}

/// Header of field names, then one space separated line per movie.
fn write_text<W: Write>(out: &mut W, movies: &[MovieRecord]) -> io::Result<()> {
    writeln!(out, "{}", FIELD_NAMES.join(", "))?;
    for movie in movies {
        let values: Vec<String> = movie
            .render_row()
            .into_iter()
            .map(|value| if value.is_empty() { "N/A".to_string() } else { value })
            .collect();
        writeln!(out, "{}", values.join(" "))?;
    }
    Ok(())
}

/// Write `movies` to `output_path`, format detected by extension.
pub fn write_output_file(movies: &[MovieRecord], output_path: &str) -> Result<()> {
    let write_error = |reason: String| QueryError::OutputWrite {
        path: output_path.to_string(),
        reason,
    };

    let format = OutputFormat::from_path(output_path);
    debug!("Writing {} movies to {} as {:?}", movies.len(), output_path, format);

    let mut file = File::create(output_path).map_err(|e| write_error(e.to_string()))?;
    match format {
        OutputFormat::Json => {
            let mut df = to_dataframe(movies).map_err(|e| write_error(e.to_string()))?;
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(&mut df)
                .map_err(|e| write_error(e.to_string()))?;
        }
        OutputFormat::Csv => {
            let mut df = to_dataframe(movies).map_err(|e| write_error(e.to_string()))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| write_error(e.to_string()))?;
        }
        OutputFormat::Text => {
            let mut writer = BufWriter::new(&mut file);
            write_text(&mut writer, movies)
                .and_then(|_| writer.flush())
                .map_err(|e| write_error(e.to_string()))?;
        }
    }

    info!("Wrote {} movies to {}", movies.len(), output_path);
    Ok(())
}

/// Terminal listing: one block per movie.
pub fn write_listing<W: Write>(out: &mut W, movies: &[MovieRecord]) -> io::Result<()> {
    for movie in movies {
        writeln!(out, "{}", movie)?;
    }
    Ok(())
}
