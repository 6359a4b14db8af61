use crate::error::{QueryError, Result};
use indexmap::IndexMap;
use log::{debug, warn};

pub const FLAG_PREFIX: &str = "--";

/// Flags that contribute one predicate to the filter conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterFlag {
    YearBefore,
    YearAfter,
    RatingAbove,
    RatingBelow,
    RuntimeAbove,
    RuntimeBelow,
    GrossAbove,
    GrossBelow,
    ScoreAbove,
    ScoreBelow,
    VotesAbove,
    VotesBelow,
    Title,
    Director,
    Actor,
    Genre,
    AgeRating,
}

impl FilterFlag {
    pub const ALL: [FilterFlag; 17] = [
        FilterFlag::YearBefore,
        FilterFlag::YearAfter,
        FilterFlag::RatingAbove,
        FilterFlag::RatingBelow,
        FilterFlag::RuntimeAbove,
        FilterFlag::RuntimeBelow,
        FilterFlag::GrossAbove,
        FilterFlag::GrossBelow,
        FilterFlag::ScoreAbove,
        FilterFlag::ScoreBelow,
        FilterFlag::VotesAbove,
        FilterFlag::VotesBelow,
        FilterFlag::Title,
        FilterFlag::Director,
        FilterFlag::Actor,
        FilterFlag::Genre,
        FilterFlag::AgeRating,
    ];

    /// Flag name without the `--` prefix.
    pub fn name(self) -> &'static str {
        match self {
            FilterFlag::YearBefore => "year-before",
            FilterFlag::YearAfter => "year-after",
            FilterFlag::RatingAbove => "rating-above",
            FilterFlag::RatingBelow => "rating-below",
            FilterFlag::RuntimeAbove => "runtime-above",
            FilterFlag::RuntimeBelow => "runtime-below",
            FilterFlag::GrossAbove => "gross-above",
            FilterFlag::GrossBelow => "gross-below",
            FilterFlag::ScoreAbove => "score-above",
            FilterFlag::ScoreBelow => "score-below",
            FilterFlag::VotesAbove => "votes-above",
            FilterFlag::VotesBelow => "votes-below",
            FilterFlag::Title => "title",
            FilterFlag::Director => "director",
            FilterFlag::Actor => "actor",
            FilterFlag::Genre => "genre",
            FilterFlag::AgeRating => "age-rating",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

/// Flags that select a post-filter action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFlag {
    TopTen,
    Output,
    Insights,
}

impl CommandFlag {
    pub const ALL: [CommandFlag; 3] = [
        CommandFlag::TopTen,
        CommandFlag::Output,
        CommandFlag::Insights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandFlag::TopTen => "top-ten",
            CommandFlag::Output => "output",
            CommandFlag::Insights => "insights",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

/// Raw filter values by flag. A repeated flag overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub entries: IndexMap<FilterFlag, String>,
}

impl FilterSet {
    pub fn insert(&mut self, flag: FilterFlag, value: impl Into<String>) {
        self.entries.insert(flag, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Raw command values by flag. A repeated flag keeps the first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSet {
    pub entries: IndexMap<CommandFlag, String>,
    /// Repeats that were reported and dropped.
    pub ignored: Vec<(CommandFlag, String)>,
}

impl CommandSet {
    pub fn get(&self, flag: CommandFlag) -> Option<&str> {
        self.entries.get(&flag).map(String::as_str)
    }

    fn insert(&mut self, flag: CommandFlag, value: String) {
        if self.entries.contains_key(&flag) {
            warn!("Duplicate action flag: {}{}. Ignoring.", FLAG_PREFIX, flag.name());
            self.ignored.push((flag, value));
        } else {
            self.entries.insert(flag, value);
        }
    }
}

/// Split `tokens[start..]` into filter and command flags.
///
/// Tokens are consumed in `--flag value` pairs. Any malformed pair, or a flag
/// that is neither a filter nor a command, is an error and nothing parsed so
/// far is returned.
pub fn classify(tokens: &[String], start: usize) -> Result<(FilterSet, CommandSet)> {
    let mut filters = FilterSet::default();
    let mut commands = CommandSet::default();

    let mut idx = start;
    while idx < tokens.len() {
        // Every pair must open with a `--` flag
        let token = &tokens[idx];
        let Some(name) = token.strip_prefix(FLAG_PREFIX) else {
            return Err(QueryError::MalformedArgument {
                token: token.clone(),
            });
        };

        // The value may not itself look like a flag
        let value = match tokens.get(idx + 1) {
            Some(value) if !value.starts_with(FLAG_PREFIX) => value.clone(),
            _ => {
                return Err(QueryError::MissingFlagValue {
                    flag: token.clone(),
                });
            }
        };

        // Filters first, then commands, else unknown
        if let Some(flag) = FilterFlag::from_name(name) {
            filters.insert(flag, value);
        } else if let Some(flag) = CommandFlag::from_name(name) {
            commands.insert(flag, value);
        } else {
            return Err(QueryError::UnknownFlag {
                flag: token.clone(),
            });
        }

        idx += 2;
    }

    debug!("filters: {:?}", filters.entries);
    debug!("commands: {:?}, ignored: {:?}", commands.entries, commands.ignored);
    Ok((filters, commands))
}
