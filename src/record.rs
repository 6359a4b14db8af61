use crate::error::ValidationError;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// Column names of the source file, in serialization order.
pub const FIELD_NAMES: [&str; 15] = [
    "series_title",
    "released_year",
    "certificate",
    "runtime",
    "genre",
    "imdb_rating",
    "overview",
    "meta_score",
    "director",
    "star_1",
    "star_2",
    "star_3",
    "star_4",
    "no_of_votes",
    "gross",
];

const STAR_FIELDS: [&str; 4] = ["star_1", "star_2", "star_3", "star_4"];

/// One source row before coercion: column name to raw cell text.
pub type RawRow = HashMap<String, String>;

/// A validated movie. Everything except the title may be missing in the
/// source data.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub released_year: Option<i64>,
    pub certificate: Option<String>,
    /// Minutes, always > 0.
    pub runtime: Option<i64>,
    pub genre: Option<String>,
    /// Always within [0, 10].
    pub imdb_rating: Option<f64>,
    pub overview: Option<String>,
    /// Always within (0, 100].
    pub meta_score: Option<i64>,
    pub director: Option<String>,
    pub stars: [Option<String>; 4],
    /// Always > 0.
    pub no_of_votes: Option<i64>,
    pub gross: Option<i64>,
}

/// A typed cell, as handed to the JSON/CSV serializers.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

/// Shortest text that reads back as the same value, always with a decimal
/// point: `9.0`, `8.75`.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => f.write_str(&format_float(*v)),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Int)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Float)
    }
}

impl From<Option<&String>> for FieldValue {
    fn from(value: Option<&String>) -> Self {
        value.map_or(FieldValue::Null, |v| FieldValue::Text(v.clone()))
    }
}

/// Cell text, with blank cells treated as missing.
fn cell<'a>(row: &'a RawRow, field: &str) -> Option<&'a str> {
    row.get(field)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn text(row: &RawRow, field: &str) -> Option<String> {
    cell(row, field).map(str::to_string)
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{}' is not an integer", value)))
}

/// "142 min" -> 142
fn parse_runtime(value: Option<&str>) -> Result<Option<i64>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let leading = value.split_whitespace().next().unwrap_or_default();
    let minutes = parse_int("runtime", leading)?;
    if minutes <= 0 {
        return Err(ValidationError::new(
            "runtime",
            format!("{} must be greater than 0", minutes),
        ));
    }
    Ok(Some(minutes))
}

/// "1,234,567" -> 1234567
fn parse_gross(value: Option<&str>) -> Result<Option<i64>, ValidationError> {
    value
        .map(|v| parse_int("gross", &v.replace(',', "")))
        .transpose()
}

/// Only all-digit text becomes a number; anything else counts as missing.
fn parse_digits(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_rating(value: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let rating: f64 = value.trim().parse().map_err(|_| {
        ValidationError::new("imdb_rating", format!("'{}' is not a number", value))
    })?;
    if !(0.0..=10.0).contains(&rating) {
        return Err(ValidationError::new(
            "imdb_rating",
            format!("{} is outside [0, 10]", value.trim()),
        ));
    }
    Ok(Some(rating))
}

fn parse_meta_score(value: Option<&str>) -> Result<Option<i64>, ValidationError> {
    match parse_digits(value) {
        Some(score) if score == 0 || score > 100 => Err(ValidationError::new(
            "meta_score",
            format!("{} is outside (0, 100]", score),
        )),
        score => Ok(score),
    }
}

fn parse_votes(value: Option<&str>) -> Result<Option<i64>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let votes = parse_int("no_of_votes", value)?;
    if votes <= 0 {
        return Err(ValidationError::new(
            "no_of_votes",
            format!("{} must be greater than 0", votes),
        ));
    }
    Ok(Some(votes))
}

/// Coerce one raw source row into a validated record.
///
/// Missing or blank cells become `None`. A cell that is present but cannot
/// be coerced, or that falls outside its declared range, is an error.
pub fn parse_row(row: &RawRow) -> Result<MovieRecord, ValidationError> {
    let title = text(row, "series_title")
        .ok_or_else(|| ValidationError::new("series_title", "a title is required"))?;

    Ok(MovieRecord {
        title,
        released_year: parse_digits(cell(row, "released_year")),
        certificate: text(row, "certificate"),
        runtime: parse_runtime(cell(row, "runtime"))?,
        genre: text(row, "genre"),
        imdb_rating: parse_rating(cell(row, "imdb_rating"))?,
        overview: text(row, "overview"),
        meta_score: parse_meta_score(cell(row, "meta_score"))?,
        director: text(row, "director"),
        stars: STAR_FIELDS.map(|field| text(row, field)),
        no_of_votes: parse_votes(cell(row, "no_of_votes"))?,
        gross: parse_gross(cell(row, "gross"))?,
    })
}

impl MovieRecord {
    /// Every field keyed by its column name, in `FIELD_NAMES` order.
    pub fn as_mapping(&self) -> IndexMap<&'static str, FieldValue> {
        let [star_1, star_2, star_3, star_4] = &self.stars;
        IndexMap::from([
            ("series_title", FieldValue::Text(self.title.clone())),
            ("released_year", self.released_year.into()),
            ("certificate", self.certificate.as_ref().into()),
            ("runtime", self.runtime.into()),
            ("genre", self.genre.as_ref().into()),
            ("imdb_rating", self.imdb_rating.into()),
            ("overview", self.overview.as_ref().into()),
            ("meta_score", self.meta_score.into()),
            ("director", self.director.as_ref().into()),
            ("star_1", star_1.as_ref().into()),
            ("star_2", star_2.as_ref().into()),
            ("star_3", star_3.as_ref().into()),
            ("star_4", star_4.as_ref().into()),
            ("no_of_votes", self.no_of_votes.into()),
            ("gross", self.gross.into()),
        ])
    }

    /// Field values as text, in `FIELD_NAMES` order. Missing values are empty.
    pub fn render_row(&self) -> Vec<String> {
        self.as_mapping()
            .into_values()
            .map(|value| value.to_string())
            .collect()
    }

    /// Individual genres of the comma separated genre field.
    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.genre
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|genre| !genre.is_empty())
    }

    pub fn present_stars(&self) -> impl Iterator<Item = &str> {
        self.stars.iter().filter_map(|star| star.as_deref())
    }
}

fn or_na<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// The multi-line block used for terminal listings.
impl fmt::Display for MovieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "{} ({}) - IMDB: {} - {} mins",
            self.title,
            or_na(self.released_year),
            or_na(self.imdb_rating.map(format_float)),
            or_na(self.runtime)
        )?;
        writeln!(f, "Directed by {}", or_na(self.director.as_deref()))?;
        write!(
            f,
            "Starring: {}",
            self.present_stars().collect::<Vec<_>>().join(", ")
        )
    }
}
