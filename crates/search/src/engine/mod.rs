//! Regex query engine
//!
//! Scans every section of a corpus for a pattern and reports, per matching
//! section, where the match starts and a highlighted snippet around it.
//!
//! Behavior callers depend on:
//! - Sections are scanned in corpus order.
//! - Before each section the running match count is compared against the
//!   cap; scanning stops only once the count *exceeds* it, so one section
//!   past the cap can still contribute.
//! - A section keeps only its last match (see [`ResultSet::record`]).

mod pattern;
mod snippet;

pub use pattern::{compile_pattern, PatternCache};
pub use snippet::{render_snippet, SnippetWindow, ELLIPSIS, MARK_CLOSE, MARK_OPEN};

use canto_common::config::SearchConfig;
use canto_common::errors::AppError;
use canto_common::Corpus;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use snippet::{render_span, MatchSpan};
use std::ops::Range;
use thiserror::Error;

/// Default result cap
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Default context window, in characters
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Default upper bound on compiled pattern size
pub const DEFAULT_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Errors raised by the engine
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidPattern { pattern, source } => AppError::InvalidPattern {
                pattern,
                message: source.to_string(),
            },
        }
    }
}

/// Cap and window applied to a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_results: usize,
    pub window_size: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl From<&SearchConfig> for SearchLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_results: config.max_results,
            window_size: config.window_size,
        }
    }
}

/// A match reported for one section
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MatchRecord {
    /// Zero-based char offset of the match start within the section text
    pub start: usize,

    /// `...<pre><mark>match</mark><post>...`
    pub surrounding: String,
}

/// Section id -> match, in scan order.
///
/// Serializes as a JSON object whose keys follow the order sections were scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: Vec<(String, MatchRecord)>,
    total_matches: usize,
}

impl ResultSet {
    /// Record a match for `section_id`, replacing any earlier match for it.
    ///
    /// Last match wins and earlier matches in the section are dropped.
    /// Open question: whether clients want the first match, or every match,
    /// instead.
    fn record(&mut self, section_id: &str, record: MatchRecord) {
        self.total_matches += 1;
        // Corpus ids are unique and a section's matches arrive together,
        // so an existing entry for this section can only be the last one.
        match self.entries.last_mut() {
            Some((id, existing)) if id == section_id => *existing = record,
            _ => self.entries.push((section_id.to_string(), record)),
        }
    }

    /// Matches recorded across all sections, counting overwritten ones
    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    /// Number of sections with a match
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, section_id: &str) -> Option<&MatchRecord> {
        self.entries
            .iter()
            .find(|(id, _)| id == section_id)
            .map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatchRecord)> {
        self.entries.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

impl Serialize for ResultSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, record) in &self.entries {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

/// Search `corpus` for `pattern` with an explicit cap and window
pub fn search(
    corpus: &Corpus,
    pattern: &str,
    max_results: usize,
    window_size: usize,
) -> Result<ResultSet, QueryError> {
    let regex = compile_pattern(pattern, DEFAULT_SIZE_LIMIT)?;
    Ok(scan(corpus, &regex, SearchLimits { max_results, window_size }))
}

/// Run a compiled pattern over the corpus
pub fn scan(corpus: &Corpus, regex: &Regex, limits: SearchLimits) -> ResultSet {
    let mut results = ResultSet::default();

    for section in corpus {
        if results.total_matches > limits.max_results {
            break;
        }

        let text = section.text.as_str();
        let mut char_len = None;
        // Running (byte, char) position so char offsets cost one pass per section
        let mut cursor = (0usize, 0usize);

        let mut record = |bytes: Range<usize>| {
            let start_char = cursor.1 + text[cursor.0..bytes.start].chars().count();
            let end_char = start_char + text[bytes.clone()].chars().count();
            cursor = (bytes.start, start_char);

            let text_len = *char_len.get_or_insert_with(|| text.chars().count());
            let span = MatchSpan {
                bytes,
                chars: start_char..end_char,
            };

            results.record(
                &section.id,
                MatchRecord {
                    start: start_char,
                    surrounding: render_span(text, text_len, &span, limits.window_size),
                },
            );
        };

        // An empty match right where a non-empty one ends still counts
        let mut reported_empty_at = None;
        for m in regex.find_iter(text) {
            if m.is_empty() && reported_empty_at == Some(m.start()) {
                continue;
            }
            record(m.range());

            if !m.is_empty() {
                if let Some(empty) = regex
                    .find_at(text, m.end())
                    .filter(|next| next.is_empty() && next.start() == m.end())
                {
                    record(empty.range());
                    reported_empty_at = Some(empty.start());
                }
            }
        }
    }

    results
}

/// Query engine with configured limits and an optional compiled-pattern cache.
///
/// Holds no per-query state; one engine serves concurrent queries.
pub struct QueryEngine {
    limits: SearchLimits,
    size_limit: usize,
    cache: Option<PatternCache>,
}

impl QueryEngine {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            limits,
            size_limit: DEFAULT_SIZE_LIMIT,
            cache: None,
        }
    }

    /// Build an engine from the `search` config section
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(SearchLimits::from(config))
            .with_size_limit(config.regex_size_limit)
            .with_pattern_cache(config.pattern_cache_size)
    }

    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Cache up to `capacity` compiled patterns; 0 disables the cache
    pub fn with_pattern_cache(mut self, capacity: usize) -> Self {
        self.cache = PatternCache::new(capacity);
        self
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    pub fn compile(&self, pattern: &str) -> Result<Regex, QueryError> {
        match &self.cache {
            Some(cache) => cache.get_or_compile(pattern, self.size_limit),
            None => compile_pattern(pattern, self.size_limit),
        }
    }

    /// Search with the engine's configured limits
    pub fn search(&self, corpus: &Corpus, pattern: &str) -> Result<ResultSet, QueryError> {
        self.search_with(corpus, pattern, self.limits)
    }

    pub fn search_with(
        &self,
        corpus: &Corpus,
        pattern: &str,
        limits: SearchLimits,
    ) -> Result<ResultSet, QueryError> {
        let regex = self.compile(pattern)?;
        Ok(scan(corpus, &regex, limits))
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(SearchLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn corpus(pairs: &[(&str, &str)]) -> Corpus {
        Corpus::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_snippet_example() {
        let corpus = corpus(&[("1:1", "abcdefghij")]);
        let results = search(&corpus, "fgh", 100, 3).unwrap();
        let record = results.get("1:1").unwrap();
        assert_eq!(record.start, 5);
        assert_eq!(record.surrounding, "...cde<mark>fgh</mark>ij...");
    }

    #[test]
    fn test_cap_lets_one_extra_section_through() {
        let corpus = corpus(&[("s1", "x"), ("s2", "x"), ("s3", "x"), ("s4", "x")]);
        let results = search(&corpus, "x", 1, 5).unwrap();
        let ids: Vec<_> = results.section_ids().collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(results.total_matches(), 2);
    }

    #[test]
    fn test_cap_zero_still_scans_first_section() {
        let corpus = corpus(&[("s1", "x x x"), ("s2", "x")]);
        let results = search(&corpus, "x", 0, 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.total_matches(), 3);
    }

    #[test]
    fn test_whole_section_overflows_cap() {
        // The cap is checked between sections, never mid-section
        let corpus = corpus(&[("s1", "aaaa"), ("s2", "a")]);
        let results = search(&corpus, "a", 2, 0).unwrap();
        assert_eq!(results.total_matches(), 4);
        assert!(results.get("s2").is_none());
    }

    #[test]
    fn test_last_match_wins() {
        let corpus = corpus(&[("1:1", "one fish two fish")]);
        let results = search(&corpus, "fish", 100, 3).unwrap();
        assert_eq!(results.len(), 1);
        let record = results.get("1:1").unwrap();
        assert_eq!(record.start, 13);
        assert_eq!(record.surrounding, "...wo <mark>fish</mark>...");
    }

    #[test]
    fn test_short_text_match_at_end() {
        let corpus = corpus(&[("1:1", "hello")]);
        let results = search(&corpus, "lo$", 100, 30).unwrap();
        assert_eq!(results.get("1:1").unwrap().surrounding, "...hel<mark>lo</mark>...");
    }

    #[test]
    fn test_invalid_pattern() {
        let corpus = corpus(&[("1:1", "abc")]);
        assert!(matches!(
            search(&corpus, "(abc", 100, 30),
            Err(QueryError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern_on_empty_corpus() {
        assert!(search(&Corpus::default(), "(abc", 100, 30).is_err());
    }

    #[test]
    fn test_empty_corpus() {
        let results = search(&Corpus::default(), "abc", 100, 30).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_no_matches_is_success() {
        let corpus = corpus(&[("1:1", "abc")]);
        assert!(search(&corpus, "xyz", 100, 30).unwrap().is_empty());
    }

    #[test]
    fn test_empty_pattern_does_not_panic() {
        let corpus = corpus(&[("1:1", "abc"), ("1:2", "")]);
        let results = search(&corpus, "", 100, 2).unwrap();
        // Last empty match sits at the end of the text
        let record = results.get("1:1").unwrap();
        assert_eq!(record.start, 3);
        assert_eq!(record.surrounding, "...bc<mark></mark>...");
        assert_eq!(results.get("1:2").unwrap().start, 0);
    }

    #[test]
    fn test_star_pattern_counts_empty_match_after_run() {
        let corpus = corpus(&[("s", "baaa")]);
        let results = search(&corpus, "a*", 100, 3).unwrap();
        // (0,0), (1,4), (4,4)
        assert_eq!(results.total_matches(), 3);
        let record = results.get("s").unwrap();
        assert_eq!(record.start, 4);
        assert_eq!(record.surrounding, "...aaa<mark></mark>...");
    }

    #[test]
    fn test_word_star_ends_on_empty_match() {
        let corpus = corpus(&[("s", "om nama")]);
        let results = search(&corpus, r"\w*", 100, 2).unwrap();
        // (0,2), (2,2), (3,7), (7,7)
        assert_eq!(results.total_matches(), 4);
        assert_eq!(results.get("s").unwrap().start, 7);
    }

    #[test]
    fn test_empty_match_after_run_counts_toward_cap() {
        let corpus = corpus(&[("s1", "aa"), ("s2", "a")]);
        // s1 yields (0,2) and (2,2), pushing the count past the cap
        let results = search(&corpus, "a*", 1, 0).unwrap();
        assert_eq!(results.total_matches(), 2);
        assert!(results.get("s2").is_none());
    }

    #[test]
    fn test_multiline_and_dotall() {
        let corpus = corpus(&[("1:1", "first line\nsecond line")]);
        let results = search(&corpus, "^second", 100, 4).unwrap();
        assert_eq!(results.get("1:1").unwrap().start, 11);

        let results = search(&corpus, "line.second", 100, 0).unwrap();
        assert_eq!(
            results.get("1:1").unwrap().surrounding,
            "...<mark>line\nsecond</mark>..."
        );
    }

    #[test]
    fn test_offsets_are_chars() {
        let corpus = corpus(&[("1:1", "धर्मो रक्षति रक्षितः")]);
        let results = search(&corpus, "रक्षितः", 100, 6).unwrap();
        let record = results.get("1:1").unwrap();
        let expected = "धर्मो रक्षति ".chars().count();
        assert_eq!(record.start, expected);
        assert!(record.surrounding.ends_with("<mark>रक्षितः</mark>..."));
    }

    #[test]
    fn test_results_follow_corpus_order() {
        let corpus = corpus(&[("9:1", "om"), ("1:1", "om"), ("5:1", "om")]);
        let results = search(&corpus, "om", 100, 0).unwrap();
        let ids: Vec<_> = results.section_ids().collect();
        assert_eq!(ids, vec!["9:1", "1:1", "5:1"]);

        let json = serde_json::to_string(&results).unwrap();
        assert!(json.find("9:1").unwrap() < json.find("1:1").unwrap());
        assert!(json.find("1:1").unwrap() < json.find("5:1").unwrap());
    }

    #[test]
    fn test_serialized_shape() {
        let corpus = corpus(&[("1:1", "abc")]);
        let results = search(&corpus, "b", 100, 1).unwrap();
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "1:1": { "start": 1, "surrounding": "...a<mark>b</mark>c..." } })
        );
    }

    #[test]
    fn test_idempotent() {
        let corpus = corpus(&[("1:1", "abcabc"), ("1:2", "cab")]);
        let first = search(&corpus, "ab", 100, 2).unwrap();
        let second = search(&corpus, "ab", 100, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_engine_with_cache_matches_plain_search() {
        let corpus = corpus(&[("1:1", "abcabc"), ("1:2", "cab")]);
        let engine = QueryEngine::new(SearchLimits { max_results: 100, window_size: 2 })
            .with_pattern_cache(8);
        let cached = engine.search(&corpus, "ab").unwrap();
        let again = engine.search(&corpus, "ab").unwrap();
        assert_eq!(cached, again);
        assert_eq!(cached, search(&corpus, "ab", 100, 2).unwrap());
    }

    #[test]
    fn test_engine_from_config() {
        let config = SearchConfig {
            max_results: 7,
            window_size: 4,
            pattern_cache_size: 0,
            regex_size_limit: DEFAULT_SIZE_LIMIT,
        };
        let engine = QueryEngine::from_config(&config);
        assert_eq!(engine.limits(), SearchLimits { max_results: 7, window_size: 4 });
    }

    #[test]
    fn test_query_error_maps_to_app_error() {
        let err: AppError = compile_pattern("(abc", DEFAULT_SIZE_LIMIT).unwrap_err().into();
        assert!(matches!(err, AppError::InvalidPattern { ref pattern, .. } if pattern == "(abc"));
    }

    proptest! {
        #[test]
        fn prop_results_bounded_by_sections(
            texts in proptest::collection::vec("[ab\n]{0,20}", 0..8),
            max_results in 0usize..5,
            window in 0usize..10,
        ) {
            let pairs: Vec<_> = texts.iter().enumerate().map(|(i, t)| (format!("s{}", i), t.clone())).collect();
            let corpus = Corpus::from_pairs(pairs);
            let results = search(&corpus, "a+", max_results, window).unwrap();
            prop_assert!(results.len() <= corpus.len());
        }

        #[test]
        fn prop_snippet_context_never_exceeds_window(
            text in "[a-c]{0,30}",
            window in 0usize..12,
        ) {
            let corpus = Corpus::from_pairs([("s", text.clone())]);
            let results = search(&corpus, "b+", 100, window).unwrap();
            if let Some(record) = results.get("s") {
                let inner = record.surrounding
                    .strip_prefix(ELLIPSIS).unwrap()
                    .strip_suffix(ELLIPSIS).unwrap();
                let (pre, rest) = inner.split_once(MARK_OPEN).unwrap();
                let (matched, post) = rest.split_once(MARK_CLOSE).unwrap();
                prop_assert!(pre.chars().count() <= window);
                prop_assert!(post.chars().count() <= window);
                let joined = format!("{}{}{}", pre, matched, post);
                prop_assert!(text.contains(&joined));
            }
        }

        #[test]
        fn prop_scan_stops_after_cap_exceeded(
            count in 1usize..10,
            max_results in 0usize..10,
        ) {
            let pairs: Vec<_> = (0..count).map(|i| (format!("s{}", i), "x".to_string())).collect();
            let corpus = Corpus::from_pairs(pairs);
            let results = search(&corpus, "x", max_results, 0).unwrap();
            prop_assert_eq!(results.len(), count.min(max_results + 1));
        }
    }
}
