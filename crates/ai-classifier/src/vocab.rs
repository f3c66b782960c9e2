//! Vocabulary tables for the classifier.
//!
//! These are product decisions, not algorithm: one table per tier, nothing
//! hidden in matching code. Tests enumerate them directly.

use ai_core::Domain;

/// Bracketed title tags (tier 1, confidence 1.0).
///
/// `(needle, display, domain)` — `needle` is searched case-insensitively at
/// any position in the title; `display` is the canonical form recorded in
/// the classification reasons. Leftmost occurrence wins.
pub const TITLE_TAGS: &[(&str, &str, Domain)] = &[
    ("[backend]", "[Backend]", Domain::Backend),
    ("[frontend]", "[Frontend]", Domain::Frontend),
    ("[database]", "[Database]", Domain::Database),
    ("[infra]", "[Infra]", Domain::Infrastructure),
    ("[infrastructure]", "[Infrastructure]", Domain::Infrastructure),
    ("[security]", "[Security]", Domain::Security),
    ("[testing]", "[Testing]", Domain::Testing),
    ("[docs]", "[Docs]", Domain::Documentation),
    ("[documentation]", "[Documentation]", Domain::Documentation),
];

/// Label synonyms (tier 2, confidence 0.9). Canonical domain names always
/// match; these extend the accepted set.
pub const LABEL_SYNONYMS: &[(&str, Domain)] = &[
    ("ui", Domain::Frontend),
    ("infra", Domain::Infrastructure),
    ("db", Domain::Database),
];

/// Path-like token patterns (tier 3, confidence 0.7). Case-sensitive
/// regexes matched against title+body; most matches wins.
pub const PATH_PATTERNS: &[(&str, Domain)] = &[
    // backend
    (r"\bsrc/api/\S*", Domain::Backend),
    (r"\bserver/\S*", Domain::Backend),
    (r"\bbackend/\S*", Domain::Backend),
    // frontend
    (r"\bsrc/components/\S*", Domain::Frontend),
    (r"\bui/\S*", Domain::Frontend),
    (r"\bfrontend/\S*", Domain::Frontend),
    (r"\b[\w./-]+\.tsx\b", Domain::Frontend),
    (r"\b[\w./-]+\.jsx\b", Domain::Frontend),
    // database
    (r"\bsrc/db/\S*", Domain::Database),
    (r"\bmigrations/\S*", Domain::Database),
    (r"\bschema\.\w+", Domain::Database),
    // infrastructure
    (r"\binfra/\S*", Domain::Infrastructure),
    (r"\bdeploy/\S*", Domain::Infrastructure),
    (r"\bDockerfile\b", Domain::Infrastructure),
    (r"\.github/workflows/\S*", Domain::Infrastructure),
    // testing
    (r"\btest/\S*", Domain::Testing),
    (r"__tests__/\S*", Domain::Testing),
    (r"\b[\w./-]+\.test\.\w+", Domain::Testing),
    (r"\b[\w./-]+\.spec\.\w+", Domain::Testing),
    // documentation
    (r"\bdocs/\S*", Domain::Documentation),
    (r"\bREADME\b", Domain::Documentation),
];

/// Keyword vocabulary (tier 4, confidence 0.5). Case-insensitive whole-word
/// matches across title+body; most hits wins.
pub const KEYWORDS: &[(&str, Domain)] = &[
    // backend
    ("trpc", Domain::Backend),
    ("endpoint", Domain::Backend),
    ("mutation", Domain::Backend),
    ("handler", Domain::Backend),
    ("api", Domain::Backend),
    ("middleware", Domain::Backend),
    ("graphql", Domain::Backend),
    ("route", Domain::Backend),
    // frontend
    ("react", Domain::Frontend),
    ("component", Domain::Frontend),
    ("modal", Domain::Frontend),
    ("shadcn", Domain::Frontend),
    ("button", Domain::Frontend),
    ("css", Domain::Frontend),
    ("tailwind", Domain::Frontend),
    ("layout", Domain::Frontend),
    // database
    ("migration", Domain::Database),
    ("drizzle", Domain::Database),
    ("table", Domain::Database),
    ("schema", Domain::Database),
    ("postgres", Domain::Database),
    ("sqlite", Domain::Database),
    // infrastructure
    ("docker", Domain::Infrastructure),
    ("kubernetes", Domain::Infrastructure),
    ("terraform", Domain::Infrastructure),
    ("deploy", Domain::Infrastructure),
    ("pipeline", Domain::Infrastructure),
    // security
    ("cve", Domain::Security),
    ("xss", Domain::Security),
    ("sql injection", Domain::Security),
    ("vulnerability", Domain::Security),
    ("csrf", Domain::Security),
    ("exploit", Domain::Security),
    // testing
    ("flaky", Domain::Testing),
    ("coverage", Domain::Testing),
    ("playwright", Domain::Testing),
    ("vitest", Domain::Testing),
    ("e2e", Domain::Testing),
    ("regression", Domain::Testing),
    // documentation
    ("readme", Domain::Documentation),
    ("docs", Domain::Documentation),
    ("documentation", Domain::Documentation),
    ("changelog", Domain::Documentation),
    ("typo", Domain::Documentation),
];

/// Resolve a lowercased label to a domain, if it names one.
///
/// `unknown` is deliberately excluded: it is a classifier outcome, not a
/// label anyone applies on purpose.
pub fn label_domain(label: &str) -> Option<Domain> {
    match label.parse::<Domain>() {
        Ok(Domain::Unknown) => None,
        Ok(domain) => Some(domain),
        Err(_) => LABEL_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == label)
            .map(|(_, domain)| *domain),
    }
}
