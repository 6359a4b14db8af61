use crate::args::{FLAG_PREFIX, FilterFlag, FilterSet};
use crate::error::{QueryError, Result};
use crate::record::MovieRecord;
use std::str::FromStr;

/// A filter flag with its value parsed into the type the predicate needs.
///
/// Every predicate is null-safe: a missing field never matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    YearBefore(i64),
    YearAfter(i64),
    RatingAbove(f64),
    RatingBelow(f64),
    RuntimeAbove(i64),
    RuntimeBelow(i64),
    GrossAbove(i64),
    GrossBelow(i64),
    ScoreAbove(i64),
    ScoreBelow(i64),
    VotesAbove(i64),
    VotesBelow(i64),
    /// Lowercased needles from here on.
    Title(String),
    Director(String),
    Actor(String),
    Genre(String),
    AgeRating(String),
}

fn parse_value<T: FromStr>(flag: FilterFlag, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| QueryError::InvalidFilterValue {
            flag: format!("{}{}", FLAG_PREFIX, flag.name()),
            value: value.to_string(),
        })
}

fn above<T: PartialOrd>(field: Option<T>, threshold: &T) -> bool {
    field.is_some_and(|v| v > *threshold)
}

fn below<T: PartialOrd>(field: Option<T>, threshold: &T) -> bool {
    field.is_some_and(|v| v < *threshold)
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|v| v.to_lowercase().contains(needle))
}

fn equals_ci(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|v| v.to_lowercase() == needle)
}

impl Predicate {
    pub fn compile(flag: FilterFlag, value: &str) -> Result<Self> {
        let predicate = match flag {
            FilterFlag::YearBefore => Predicate::YearBefore(parse_value(flag, value)?),
            FilterFlag::YearAfter => Predicate::YearAfter(parse_value(flag, value)?),
            FilterFlag::RatingAbove => Predicate::RatingAbove(parse_value(flag, value)?),
            FilterFlag::RatingBelow => Predicate::RatingBelow(parse_value(flag, value)?),
            FilterFlag::RuntimeAbove => Predicate::RuntimeAbove(parse_value(flag, value)?),
            FilterFlag::RuntimeBelow => Predicate::RuntimeBelow(parse_value(flag, value)?),
            FilterFlag::GrossAbove => Predicate::GrossAbove(parse_value(flag, value)?),
            FilterFlag::GrossBelow => Predicate::GrossBelow(parse_value(flag, value)?),
            FilterFlag::ScoreAbove => Predicate::ScoreAbove(parse_value(flag, value)?),
            FilterFlag::ScoreBelow => Predicate::ScoreBelow(parse_value(flag, value)?),
            FilterFlag::VotesAbove => Predicate::VotesAbove(parse_value(flag, value)?),
            FilterFlag::VotesBelow => Predicate::VotesBelow(parse_value(flag, value)?),
            FilterFlag::Title => Predicate::Title(value.to_lowercase()),
            FilterFlag::Director => Predicate::Director(value.to_lowercase()),
            FilterFlag::Actor => Predicate::Actor(value.to_lowercase()),
            FilterFlag::Genre => Predicate::Genre(value.to_lowercase()),
            FilterFlag::AgeRating => Predicate::AgeRating(value.to_lowercase()),
        };
        Ok(predicate)
    }

    pub fn matches(&self, movie: &MovieRecord) -> bool {
        match self {
            Predicate::YearBefore(year) => below(movie.released_year, year),
            Predicate::YearAfter(year) => above(movie.released_year, year),
            Predicate::RatingAbove(rating) => above(movie.imdb_rating, rating),
            Predicate::RatingBelow(rating) => below(movie.imdb_rating, rating),
            Predicate::RuntimeAbove(runtime) => above(movie.runtime, runtime),
            Predicate::RuntimeBelow(runtime) => below(movie.runtime, runtime),
            Predicate::GrossAbove(gross) => above(movie.gross, gross),
            Predicate::GrossBelow(gross) => below(movie.gross, gross),
            Predicate::ScoreAbove(score) => above(movie.meta_score, score),
            Predicate::ScoreBelow(score) => below(movie.meta_score, score),
            Predicate::VotesAbove(votes) => above(movie.no_of_votes, votes),
            Predicate::VotesBelow(votes) => below(movie.no_of_votes, votes),
            Predicate::Title(title) => contains_ci(Some(movie.title.as_str()), title),
            Predicate::Director(director) => contains_ci(movie.director.as_deref(), director),
            Predicate::Actor(actor) => movie
                .present_stars()
                .any(|star| equals_ci(Some(star), actor)),
            Predicate::Genre(genre) => movie.genres().any(|g| equals_ci(Some(g), genre)),
            Predicate::AgeRating(rating) => equals_ci(movie.certificate.as_deref(), rating),
        }
    }
}

/// Parse every value of the filter set up front.
pub fn compile(filters: &FilterSet) -> Result<Vec<Predicate>> {
    filters
        .entries
        .iter()
        .map(|(flag, value)| Predicate::compile(*flag, value))
        .collect()
}

/// Keep the movies that satisfy every filter, in their original order.
pub fn apply(movies: Vec<MovieRecord>, filters: &FilterSet) -> Result<Vec<MovieRecord>> {
    let predicates = compile(filters)?;
    Ok(movies
        .into_iter()
        .filter(|movie| predicates.iter().all(|p| p.matches(movie)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_row;
    use crate::record::tests::{full_row, raw_row};

    fn movie(cells: &[(&str, &str)]) -> MovieRecord {
        let mut row = full_row();
        row.extend(raw_row(cells));
        parse_row(&row).unwrap()
    }

    fn filter_set(pairs: &[(FilterFlag, &str)]) -> FilterSet {
        let mut filters = FilterSet::default();
        for (flag, value) in pairs {
            filters.insert(*flag, *value);
        }
        filters
    }

    fn matches(flag: FilterFlag, value: &str, movie: &MovieRecord) -> bool {
        Predicate::compile(flag, value).unwrap().matches(movie)
    }

    #[test]
    fn test_empty_filter_set_keeps_everything() {
        let movies = vec![movie(&[("series_title", "A")]), movie(&[("series_title", "B")])];
        let kept = apply(movies.clone(), &FilterSet::default()).unwrap();
        assert_eq!(kept, movies);
    }

    #[test]
    fn test_numeric_comparisons_are_strict() {
        let m = movie(&[
            ("imdb_rating", "8"),
            ("released_year", "2000"),
            ("runtime", "120 min"),
            ("gross", "1,000"),
            ("meta_score", "80"),
            ("no_of_votes", "500"),
        ]);
        let cases = [
            (FilterFlag::RatingAbove, FilterFlag::RatingBelow, "8"),
            (FilterFlag::YearAfter, FilterFlag::YearBefore, "2000"),
            (FilterFlag::RuntimeAbove, FilterFlag::RuntimeBelow, "120"),
            (FilterFlag::GrossAbove, FilterFlag::GrossBelow, "1000"),
            (FilterFlag::ScoreAbove, FilterFlag::ScoreBelow, "80"),
            (FilterFlag::VotesAbove, FilterFlag::VotesBelow, "500"),
        ];
        for (above, below, value) in cases {
            assert!(!matches(above, value, &m), "{:?}", above);
            assert!(!matches(below, value, &m), "{:?}", below);
        }

        assert!(matches(FilterFlag::RatingAbove, "7.9", &m));
        assert!(matches(FilterFlag::RatingBelow, "8.1", &m));
        assert!(matches(FilterFlag::YearBefore, "2001", &m));
        assert!(matches(FilterFlag::GrossAbove, "999", &m));
    }

    #[test]
    fn test_missing_fields_never_match() {
        let m = movie(&[
            ("imdb_rating", ""),
            ("released_year", ""),
            ("gross", ""),
            ("director", ""),
            ("certificate", ""),
            ("genre", ""),
        ]);
        assert!(!matches(FilterFlag::RatingBelow, "10", &m));
        assert!(!matches(FilterFlag::RatingAbove, "0", &m));
        assert!(!matches(FilterFlag::YearBefore, "3000", &m));
        assert!(!matches(FilterFlag::GrossBelow, "1000000000000", &m));
        assert!(!matches(FilterFlag::Director, "", &m));
        assert!(!matches(FilterFlag::AgeRating, "UA", &m));
        assert!(!matches(FilterFlag::Genre, "Drama", &m));
    }

    #[test]
    fn test_title_and_director_substring() {
        let m = movie(&[]);
        assert!(matches(FilterFlag::Title, "dark", &m));
        assert!(matches(FilterFlag::Director, "NOLAN", &m));
        assert!(!matches(FilterFlag::Director, "Nolan Christopher", &m));
    }

    #[test]
    fn test_actor_is_exact_and_case_insensitive() {
        let m = movie(&[("star_2", "Tom Hanks")]);
        assert!(matches(FilterFlag::Actor, "tom hanks", &m));
        assert!(matches(FilterFlag::Actor, "Christian Bale", &m));
        assert!(!matches(FilterFlag::Actor, "Han", &m));
    }

    #[test]
    fn test_actor_with_missing_stars() {
        let m = movie(&[("star_1", ""), ("star_3", ""), ("star_4", "Tom Hanks")]);
        assert_eq!(m.stars[0], None);
        assert!(matches(FilterFlag::Actor, "Tom Hanks", &m));
        assert!(!matches(FilterFlag::Actor, "Christian Bale", &m));
    }

    #[test]
    fn test_genre_matches_whole_tokens() {
        let m = movie(&[("genre", "Drama, Comedy")]);
        assert!(matches(FilterFlag::Genre, "Drama", &m));
        assert!(matches(FilterFlag::Genre, "comedy", &m));
        assert!(!matches(FilterFlag::Genre, "Dra", &m));
        assert!(!matches(FilterFlag::Genre, "Drama, Comedy", &m));
    }

    #[test]
    fn test_age_rating_is_exact() {
        let m = movie(&[("certificate", "PG-13")]);
        assert!(matches(FilterFlag::AgeRating, "pg-13", &m));
        assert!(!matches(FilterFlag::AgeRating, "PG", &m));
    }

    #[test]
    fn test_conjunction_preserves_order() {
        let movies = vec![
            movie(&[("series_title", "A"), ("imdb_rating", "9"), ("released_year", "2012")]),
            movie(&[("series_title", "B"), ("imdb_rating", "8.5"), ("released_year", "2005")]),
            movie(&[("series_title", "C"), ("imdb_rating", "8.2"), ("released_year", "2015")]),
            movie(&[("series_title", "D"), ("imdb_rating", "8"), ("released_year", "2019")]),
        ];
        let filters = filter_set(&[
            (FilterFlag::YearAfter, "2010"),
            (FilterFlag::RatingAbove, "8"),
        ]);
        let kept = apply(movies, &filters).unwrap();
        let titles: Vec<_> = kept.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn test_invalid_value_aborts() {
        let filters = filter_set(&[(FilterFlag::YearAfter, "2000.5")]);
        let err = apply(vec![movie(&[])], &filters).unwrap_err();
        assert!(matches!(
            err,
            QueryError::InvalidFilterValue { flag, value }
                if flag == "--year-after" && value == "2000.5"
        ));

        let filters = filter_set(&[(FilterFlag::RatingAbove, "high")]);
        assert!(apply(Vec::new(), &filters).is_err());
    }

    #[test]
    fn test_values_are_trimmed() {
        let m = movie(&[]);
        assert!(matches(FilterFlag::YearAfter, " 2000 ", &m));
    }
}
