use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use unicode_normalization::UnicodeNormalization;

use crate::models::TrackedShow;

/// Maps a resolved title to one of the tracked shows.
pub trait ShowMatcher: Send + Sync {
    fn find<'a>(&self, title: &str, shows: &'a [TrackedShow]) -> Option<&'a TrackedShow>;
}

/// Result of attempting to match a parsed title against the show list.
#[derive(Debug, Clone)]
pub enum MatchResult<'a> {
    /// Exact or normalized match found.
    Matched(&'a TrackedShow),
    /// Fuzzy match found with confidence score (0.0–1.0).
    Fuzzy(&'a TrackedShow, f64),
    /// No match found.
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn show(&self) -> Option<&'a TrackedShow> {
        match *self {
            Self::Matched(show) | Self::Fuzzy(show, _) => Some(show),
            Self::NoMatch => None,
        }
    }
}

/// Minimum fuzzy score (0.0–1.0) to consider a match valid.
const FUZZY_THRESHOLD: f64 = 0.6;

/// Attempt to match a parsed title against the tracked shows.
///
/// Strategy: exact → normalized → fuzzy (Skim) → NoMatch. Every pass looks
/// at the main title and all aliases.
pub fn match_title<'a>(query: &str, candidates: &'a [TrackedShow]) -> MatchResult<'a> {
    if query.is_empty() || candidates.is_empty() {
        return MatchResult::NoMatch;
    }

    if let Some(show) = candidates.iter().find(|s| s.titles().any(|t| t == query)) {
        return MatchResult::Matched(show);
    }

    let normalized_query = normalize(query);
    if normalized_query.is_empty() {
        return MatchResult::NoMatch;
    }

    if let Some(show) = candidates
        .iter()
        .find(|s| s.titles().any(|t| normalize(t) == normalized_query))
    {
        return MatchResult::Matched(show);
    }

    let matcher = SkimMatcherV2::default();
    let max_possible = matcher
        .fuzzy_match(&normalized_query, &normalized_query)
        .unwrap_or(1)
        .max(1);

    let mut best: Option<(&TrackedShow, i64)> = None;
    for show in candidates {
        let score = show
            .titles()
            .filter_map(|t| matcher.fuzzy_match(&normalize(t), &normalized_query))
            .max()
            .unwrap_or(0);
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((show, score));
        }
    }

    if let Some((show, score)) = best {
        let confidence = score as f64 / max_possible as f64;
        if confidence >= FUZZY_THRESHOLD {
            return MatchResult::Fuzzy(show, confidence);
        }
    }

    MatchResult::NoMatch
}

/// NFKC + lowercase, separators to spaces, other punctuation dropped,
/// whitespace collapsed.
pub fn normalize(s: &str) -> String {
    let mapped: String = s
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter_map(|c| match c {
            c if c.is_alphanumeric() => Some(c),
            c if c.is_whitespace() => Some(' '),
            '-' | '_' | '/' | '.' | ':' | '~' => Some(' '),
            _ => None,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Default [`ShowMatcher`] built on [`match_title`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TitleMatcher;

impl ShowMatcher for TitleMatcher {
    fn find<'a>(&self, title: &str, shows: &'a [TrackedShow]) -> Option<&'a TrackedShow> {
        let result = match_title(title, shows);
        if let MatchResult::Fuzzy(show, confidence) = &result {
            tracing::debug!(title, matched = %show.title, confidence, "Fuzzy title match");
        }
        result.show()
    }
}
