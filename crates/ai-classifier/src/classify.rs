//! The four-tier classification cascade.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use ai_core::domain::ALL_DOMAINS;
use ai_core::{Domain, IssueRecord};

use crate::vocab::{KEYWORDS, PATH_PATTERNS, TITLE_TAGS, label_domain};

pub const CONFIDENCE_TITLE_TAG: f64 = 1.0;
pub const CONFIDENCE_LABEL: f64 = 0.9;
pub const CONFIDENCE_PATH: f64 = 0.7;
pub const CONFIDENCE_KEYWORD: f64 = 0.5;

/// The outcome of classifying one issue. Produced once per task and
/// read-only thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub domain: Domain,
    pub confidence: f64,
    /// Triggering evidence, e.g. `"Title tag: [Backend]"` or
    /// `"Keyword: trpc ×2"`. Empty when nothing matched.
    pub reasons: Vec<String>,
}

/// Classify an issue into a domain.
///
/// Tiers are tried in strict order — title tag, labels, path tokens,
/// keywords — and the first tier producing any match wins. Deterministic
/// and side-effect free.
pub fn classify(issue: &IssueRecord) -> Classification {
    if let Some(c) = classify_by_title_tag(issue) {
        return c;
    }
    if let Some(c) = classify_by_labels(issue) {
        return c;
    }
    if let Some(c) = classify_by_paths(issue) {
        return c;
    }
    if let Some(c) = classify_by_keywords(issue) {
        return c;
    }

    Classification {
        domain: Domain::Unknown,
        confidence: 0.0,
        reasons: Vec::new(),
    }
}

/// Tier 1: bracketed tag anywhere in the title, leftmost occurrence wins.
fn classify_by_title_tag(issue: &IssueRecord) -> Option<Classification> {
    let title = issue.title.to_lowercase();

    let mut leftmost: Option<(usize, &str, Domain)> = None;
    for (needle, display, domain) in TITLE_TAGS {
        if let Some(pos) = title.find(needle) {
            if leftmost.is_none_or(|(best, _, _)| pos < best) {
                leftmost = Some((pos, *display, *domain));
            }
        }
    }

    leftmost.map(|(_, display, domain)| Classification {
        domain,
        confidence: CONFIDENCE_TITLE_TAG,
        reasons: vec![format!("Title tag: {display}")],
    })
}

/// Tier 2: labels naming a domain (or a documented synonym). The domain
/// with the most supporting labels wins; ties break in canonical order.
fn classify_by_labels(issue: &IssueRecord) -> Option<Classification> {
    let mut support: BTreeMap<Domain, Vec<String>> = BTreeMap::new();
    for label in &issue.labels {
        let lowered = label.to_lowercase();
        if let Some(domain) = label_domain(&lowered) {
            support.entry(domain).or_default().push(lowered);
        }
    }

    pick_most_frequent(&support).map(|(domain, labels)| Classification {
        domain,
        confidence: CONFIDENCE_LABEL,
        reasons: labels.iter().map(|l| format!("Label: {l}")).collect(),
    })
}

/// Tier 3: path-like tokens in title+body (case-sensitive). Most matches
/// wins; ties break in canonical order.
fn classify_by_paths(issue: &IssueRecord) -> Option<Classification> {
    static COMPILED: OnceLock<Vec<(Regex, Domain)>> = OnceLock::new();
    let patterns = COMPILED.get_or_init(|| {
        PATH_PATTERNS
            .iter()
            .map(|(pattern, domain)| {
                let re = Regex::new(pattern).unwrap_or_else(|e| {
                    unreachable!("vocab path pattern {pattern:?} must compile: {e}")
                });
                (re, *domain)
            })
            .collect()
    });

    let text = format!("{}\n{}", issue.title, issue.body);

    let mut matches: BTreeMap<Domain, Vec<String>> = BTreeMap::new();
    for (re, domain) in patterns {
        for m in re.find_iter(&text) {
            let token = m
                .as_str()
                .trim_end_matches(['.', ',', ';', ':', ')', '`', '\'', '"'])
                .to_string();
            matches.entry(*domain).or_default().push(token);
        }
    }

    pick_most_frequent(&matches).map(|(domain, tokens)| Classification {
        domain,
        confidence: CONFIDENCE_PATH,
        reasons: tokens.iter().map(|t| format!("Path: {t}")).collect(),
    })
}

/// Tier 4: whole-word keyword hits across title+body (case-insensitive).
/// Most hits wins; ties break in canonical order.
fn classify_by_keywords(issue: &IssueRecord) -> Option<Classification> {
    static COMPILED: OnceLock<Vec<(Regex, &'static str, Domain)>> = OnceLock::new();
    let keywords = COMPILED.get_or_init(|| {
        KEYWORDS
            .iter()
            .map(|(keyword, domain)| {
                let pattern = format!(r"\b{}\b", regex::escape(keyword));
                let re = Regex::new(&pattern).unwrap_or_else(|e| {
                    unreachable!("vocab keyword {keyword:?} must compile: {e}")
                });
                (re, *keyword, *domain)
            })
            .collect()
    });

    let text = format!("{}\n{}", issue.title, issue.body).to_lowercase();

    let mut hit_count: BTreeMap<Domain, usize> = BTreeMap::new();
    let mut evidence: BTreeMap<Domain, Vec<String>> = BTreeMap::new();
    for (re, keyword, domain) in keywords {
        let count = re.find_iter(&text).count();
        if count == 0 {
            continue;
        }
        *hit_count.entry(*domain).or_default() += count;
        let reason = if count > 1 {
            format!("Keyword: {keyword} ×{count}")
        } else {
            format!("Keyword: {keyword}")
        };
        evidence.entry(*domain).or_default().push(reason);
    }

    let (domain, _) = hit_count
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))?;

    Some(Classification {
        domain: *domain,
        confidence: CONFIDENCE_KEYWORD,
        reasons: evidence.remove(domain).unwrap_or_default(),
    })
}

/// Pick the domain with the most collected tokens; canonical order breaks
/// ties. Returns `None` when nothing matched at all.
fn pick_most_frequent(
    matches: &BTreeMap<Domain, Vec<String>>,
) -> Option<(Domain, &Vec<String>)> {
    let mut winner: Option<(Domain, &Vec<String>)> = None;
    for domain in ALL_DOMAINS {
        if let Some(tokens) = matches.get(&domain) {
            if winner.is_none_or(|(_, best)| tokens.len() > best.len()) {
                winner = Some((domain, tokens));
            }
        }
    }
    winner
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
