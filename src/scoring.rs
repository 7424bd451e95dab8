//! Text heuristics used to score agent output against golden criteria.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use tracing::warn;

const MIN_POST_WORDS: usize = 50;
const MAX_POST_WORDS: usize = 280;

const WEIGHT_POST_KEYWORDS: f64 = 0.3;
const WEIGHT_POST_LENGTH: f64 = 0.3;
const WEIGHT_POST_HASHTAG: f64 = 0.2;
const WEIGHT_POST_EMOJI: f64 = 0.2;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("hardcoded regex"));
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("hardcoded regex"));
static EMOJI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{1F300}-\x{1F9FF}]").expect("hardcoded regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Quality breakdown for one social post
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostQuality {
    pub quality: f64,
    pub keyword_coverage: f64,
}

fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Cosine similarity of the TF-IDF vectors of two texts.
///
/// Idf is fitted on the two texts alone. Returns 0.0 when neither text has
/// a term left after stop-word removal.
pub fn cosine_text_similarity(text_a: &str, text_b: &str) -> f64 {
    let docs = [terms(text_a), terms(text_b)];

    let mut counts: [BTreeMap<&str, f64>; 2] = [BTreeMap::new(), BTreeMap::new()];
    for (doc, count) in docs.iter().zip(counts.iter_mut()) {
        for term in doc {
            *count.entry(term.as_str()).or_insert(0.0) += 1.0;
        }
    }

    let vocabulary: HashSet<&str> = counts.iter().flat_map(|c| c.keys().copied()).collect();
    if vocabulary.is_empty() {
        return 0.0;
    }

    let n_docs = docs.len() as f64;
    let weighted: Vec<BTreeMap<&str, f64>> = counts
        .iter()
        .map(|count| {
            count
                .iter()
                .map(|(&term, &tf)| {
                    let df = counts.iter().filter(|c| c.contains_key(term)).count() as f64;
                    let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
                    (term, tf * idf)
                })
                .collect()
        })
        .collect();

    let norm = |v: &BTreeMap<&str, f64>| v.values().map(|w| w * w).sum::<f64>().sqrt();
    let (norm_a, norm_b) = (norm(&weighted[0]), norm(&weighted[1]));
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = weighted[0]
        .iter()
        .filter_map(|(term, wa)| weighted[1].get(term).map(|wb| wa * wb))
        .sum();

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Fraction of case-insensitive patterns that match somewhere in `text`.
///
/// An empty pattern matches any text. Patterns that fail to compile count
/// as misses.
pub fn regex_match_score<S: AsRef<str>>(text: &str, patterns: &[S]) -> f64 {
    let matched = patterns
        .iter()
        .filter(|pattern| {
            let pattern = pattern.as_ref();
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => re.is_match(text),
                Err(e) => {
                    warn!(pattern, error = %e, "Ignoring invalid criteria pattern");
                    false
                }
            }
        })
        .count();

    matched as f64 / patterns.len().max(1) as f64
}

/// Score a social post on keyword coverage, length, hashtag and emoji use
pub fn evaluate_social_post<S: AsRef<str>>(post: &str, expected_keywords: &[S]) -> PostQuality {
    let words = post.split_whitespace().count();
    let length_ok = (MIN_POST_WORDS..=MAX_POST_WORDS).contains(&words);
    let has_hashtag = HASHTAG.is_match(post);
    let has_emoji = EMOJI.is_match(post);

    let lowered = post.to_lowercase();
    let keyword_coverage = if expected_keywords.is_empty() {
        0.0
    } else {
        let found = expected_keywords
            .iter()
            .filter(|kw| lowered.contains(&kw.as_ref().to_lowercase()))
            .count();
        found as f64 / expected_keywords.len() as f64
    };

    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let quality = WEIGHT_POST_KEYWORDS * keyword_coverage
        + WEIGHT_POST_LENGTH * flag(length_ok)
        + WEIGHT_POST_HASHTAG * flag(has_hashtag)
        + WEIGHT_POST_EMOJI * flag(has_emoji);

    PostQuality {
        quality,
        keyword_coverage,
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however",
    "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its",
    "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly", "move",
    "much", "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next",
    "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout", "thru",
    "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un",
    "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what",
    "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever",
    "whole", "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you",
    "your", "yours", "yourself", "yourselves",
];
