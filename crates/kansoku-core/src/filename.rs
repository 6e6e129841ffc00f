//! Filename → (title, episode) extraction.
//!
//! The tracker only depends on [`FilenameResolver`]. [`AnimeFilenameResolver`]
//! is the bundled heuristic for fansub/scene style release names.

use regex::Regex;

/// Title and episode extracted from a video filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub title: String,
    /// `None` for single-episode releases (movies, OVAs).
    pub episode: Option<u32>,
}

/// Extracts a show title and episode number from a filename.
pub trait FilenameResolver: Send + Sync {
    /// Returns `None` when no title can be extracted.
    fn resolve(&self, filename: &str) -> Option<ParsedFilename>;
}

/// Regex heuristics for release-style names such as
/// `[Group] Show Title - 04 [1080p][ABCD1234].mkv`.
#[derive(Debug, Clone)]
pub struct AnimeFilenameResolver {
    bracket_episode: Regex,
    bracket_group: Regex,
    paren_group: Regex,
    year: Regex,
    whitespace: Regex,
    season_episode: Regex,
    dash_episode: Regex,
    keyword_episode: Regex,
    bare_episode: Regex,
}

impl AnimeFilenameResolver {
    pub fn new() -> Self {
        Self {
            bracket_episode: re(r"\[(\d{1,4})\]"),
            bracket_group: re(r"\[[^\]]*\]"),
            paren_group: re(r"\(([^)]*)\)"),
            year: re(r"^(?:19|20)\d{2}$"),
            whitespace: re(r"\s+"),
            season_episode: re(r"(?i)\bS(\d{1,2})E(\d{1,4})(?:v\d+)?\b"),
            dash_episode: re(r"\s-\s(\d{1,4})(?:v\d+)?(?:\s|$)"),
            keyword_episode: re(r"(?i)\b(?:episode|ep\.?|e)\s?(\d{1,4})(?:v\d+)?\b"),
            bare_episode: re(r"\s(\d{1,4})(?:v\d+)?(?:\s|$)"),
        }
    }

    /// Strip extension and tags, normalize separators. Returns the cleaned
    /// name and the episode found in a `[NN]` tag, if any.
    fn clean(&self, filename: &str) -> (String, Option<u32>) {
        let stem = strip_extension(filename);
        let spaced = if stem.contains(' ') {
            stem.replace('_', " ")
        } else {
            stem.replace(['.', '_'], " ")
        };

        let bracket_ep = self
            .bracket_episode
            .captures(&spaced)
            .and_then(|c| c[1].parse().ok());

        let no_brackets = self.bracket_group.replace_all(&spaced, " ");
        let no_parens = self.paren_group.replace_all(&no_brackets, |caps: &regex::Captures| {
            if self.year.is_match(&caps[1]) {
                caps[0].to_string()
            } else {
                " ".to_string()
            }
        });
        let collapsed = self.whitespace.replace_all(&no_parens, " ");
        (collapsed.trim().to_string(), bracket_ep)
    }
}

impl Default for AnimeFilenameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameResolver for AnimeFilenameResolver {
    fn resolve(&self, filename: &str) -> Option<ParsedFilename> {
        let (name, bracket_ep) = self.clean(filename);
        if name.is_empty() {
            return None;
        }

        if let Some(caps) = self.season_episode.captures(&name) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let season: u32 = caps[1].parse().ok()?;
            let episode: u32 = caps[2].parse().ok()?;
            let mut title = clean_title(&name[..start])?;
            if season > 1 {
                title = format!("{title} {season}");
            }
            return Some(ParsedFilename {
                title,
                episode: Some(episode),
            });
        }

        for pattern in [&self.dash_episode, &self.keyword_episode, &self.bare_episode] {
            if let Some(caps) = pattern.captures(&name) {
                let start = caps.get(0).map_or(0, |m| m.start());
                if let Some(title) = clean_title(&name[..start]) {
                    return Some(ParsedFilename {
                        title,
                        episode: caps[1].parse().ok(),
                    });
                }
            }
        }

        Some(ParsedFilename {
            title: clean_title(&name)?,
            episode: bracket_ep,
        })
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in filename pattern is valid")
}

/// Drop a trailing `.ext` when it looks like a file extension.
fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic()) =>
        {
            stem
        }
        _ => filename,
    }
}

fn clean_title(raw: &str) -> Option<String> {
    let mut title = raw.trim();
    while let Some(stripped) = title.strip_suffix(" -") {
        title = stripped.trim_end();
    }
    if title.is_empty() || title == "-" {
        None
    } else {
        Some(title.to_string())
    }
}
