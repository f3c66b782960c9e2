use super::*;
use ai_core::{IssueRecord, IssueState, is_valid_domain};
use chrono::Utc;
use proptest::prelude::*;

fn issue(title: &str, body: &str, labels: &[&str]) -> IssueRecord {
    let now = Utc::now();
    IssueRecord {
        number: 1,
        title: title.to_string(),
        body: body.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        state: IssueState::Open,
        created_at: now,
        updated_at: now,
        url: "https://github.com/acme/widgets/issues/1".to_string(),
    }
}

// ── Tier 1: title tags ──────────────────────────────────────────────

#[test]
fn test_title_tag_backend() {
    let c = classify(&issue("[Backend] Add auth", "", &[]));
    assert_eq!(c.domain, Domain::Backend);
    assert_eq!(c.confidence, 1.0);
    assert_eq!(c.reasons, vec!["Title tag: [Backend]"]);
}

#[test]
fn test_title_tag_is_case_insensitive() {
    let c = classify(&issue("fix login [bAcKeNd]", "", &[]));
    assert_eq!(c.domain, Domain::Backend);
    assert_eq!(c.confidence, 1.0);
}

#[test]
fn test_title_tag_at_any_position() {
    let c = classify(&issue("Fix the modal [Frontend] please", "", &[]));
    assert_eq!(c.domain, Domain::Frontend);
}

#[test]
fn test_title_tag_leftmost_wins() {
    let c = classify(&issue("[Testing] then [Backend]", "", &[]));
    assert_eq!(c.domain, Domain::Testing);
    assert_eq!(c.reasons, vec!["Title tag: [Testing]"]);

    let c = classify(&issue("[Backend] then [Testing]", "", &[]));
    assert_eq!(c.domain, Domain::Backend);
}

#[test]
fn test_title_tag_infra_aliases() {
    assert_eq!(
        classify(&issue("[Infra] Bump runners", "", &[])).domain,
        Domain::Infrastructure
    );
    assert_eq!(
        classify(&issue("[Infrastructure] Bump runners", "", &[])).domain,
        Domain::Infrastructure
    );
    assert_eq!(
        classify(&issue("[Docs] Typos", "", &[])).domain,
        Domain::Documentation
    );
    assert_eq!(
        classify(&issue("[Documentation] Typos", "", &[])).domain,
        Domain::Documentation
    );
}

#[test]
fn test_title_tag_beats_labels() {
    // Tier precedence: a tier-2 signal must not change a tier-1 result.
    let tagged = classify(&issue("[Backend] Add auth", "", &[]));
    let tagged_and_labeled = classify(&issue("[Backend] Add auth", "", &["frontend"]));
    assert_eq!(tagged.domain, tagged_and_labeled.domain);
    assert_eq!(tagged.confidence, tagged_and_labeled.confidence);
}

// ── Tier 2: labels ──────────────────────────────────────────────────

#[test]
fn test_label_canonical_name() {
    let c = classify(&issue("Fix login flow", "", &["backend"]));
    assert_eq!(c.domain, Domain::Backend);
    assert_eq!(c.confidence, 0.9);
    assert_eq!(c.reasons, vec!["Label: backend"]);
}

#[test]
fn test_label_synonyms() {
    assert_eq!(
        classify(&issue("x", "", &["ui"])).domain,
        Domain::Frontend
    );
    assert_eq!(
        classify(&issue("x", "", &["db"])).domain,
        Domain::Database
    );
    assert_eq!(
        classify(&issue("x", "", &["infra"])).domain,
        Domain::Infrastructure
    );
}

#[test]
fn test_label_is_lowercased() {
    let c = classify(&issue("x", "", &["Backend"]));
    assert_eq!(c.domain, Domain::Backend);
    assert_eq!(c.confidence, 0.9);
}

#[test]
fn test_label_majority_wins() {
    // Two frontend-ish labels beat one database label.
    let c = classify(&issue("x", "", &["ui", "frontend", "db"]));
    assert_eq!(c.domain, Domain::Frontend);
    assert_eq!(c.reasons.len(), 2);
}

#[test]
fn test_label_tie_breaks_in_canonical_order() {
    // One label each: backend < testing in canonical order.
    let c = classify(&issue("x", "", &["testing", "backend"]));
    assert_eq!(c.domain, Domain::Backend);
}

#[test]
fn test_unrelated_labels_do_not_classify() {
    let c = classify(&issue("x", "", &["good first issue", "p1"]));
    assert_eq!(c.domain, Domain::Unknown);
    assert_eq!(c.confidence, 0.0);
}

// ── Tier 3: path patterns ───────────────────────────────────────────

#[test]
fn test_path_backend_api() {
    let c = classify(&issue("Broken route", "See src/api/auth.ts for details", &[]));
    assert_eq!(c.domain, Domain::Backend);
    assert_eq!(c.confidence, 0.7);
    assert_eq!(c.reasons, vec!["Path: src/api/auth.ts"]);
}

#[test]
fn test_path_tsx_extension() {
    let c = classify(&issue("Crash", "stack points at app/Login.tsx on mount", &[]));
    assert_eq!(c.domain, Domain::Frontend);
}

#[test]
fn test_path_workflow_files() {
    let c = classify(&issue("CI broken", "edit .github/workflows/ci.yml", &[]));
    assert_eq!(c.domain, Domain::Infrastructure);
}

#[test]
fn test_path_is_case_sensitive() {
    // SRC/API/ must not match the lowercase pattern.
    let c = classify(&issue("x", "SRC/API/AUTH.TS", &[]));
    assert_ne!(c.confidence, 0.7);
}

#[test]
fn test_path_most_frequent_wins() {
    let body = "touch migrations/001.sql and migrations/002.sql, then server/index.ts";
    let c = classify(&issue("cleanup", body, &[]));
    assert_eq!(c.domain, Domain::Database);
    assert_eq!(c.reasons.len(), 2);
}

#[test]
fn test_path_readme_counts_as_documentation() {
    let c = classify(&issue("Update README.md badges", "", &[]));
    assert_eq!(c.domain, Domain::Documentation);
    assert_eq!(c.confidence, 0.7);
}

// ── Tier 4: keywords ────────────────────────────────────────────────

#[test]
fn test_keyword_security() {
    let c = classify(&issue("Possible XSS in comments", "", &[]));
    assert_eq!(c.domain, Domain::Security);
    assert_eq!(c.confidence, 0.5);
    assert_eq!(c.reasons, vec!["Keyword: xss"]);
}

#[test]
fn test_keyword_phrase_sql_injection() {
    let c = classify(&issue("Found a sql injection", "", &[]));
    assert_eq!(c.domain, Domain::Security);
}

#[test]
fn test_keyword_repeat_hits_are_counted() {
    let c = classify(&issue("trpc issue", "the trpc client drops the trpc context", &[]));
    assert_eq!(c.domain, Domain::Backend);
    assert!(c.reasons.contains(&"Keyword: trpc ×3".to_string()), "{:?}", c.reasons);
}

#[test]
fn test_keyword_whole_word_only() {
    // "apis" must not hit the "api" keyword.
    let c = classify(&issue("apis are slow sometimes", "", &[]));
    assert_eq!(c.domain, Domain::Unknown);
}

#[test]
fn test_keyword_majority_wins() {
    let c = classify(&issue("Slow page", "react component modal spinner, one endpoint", &[]));
    assert_eq!(c.domain, Domain::Frontend);
}

#[test]
fn test_keyword_tie_breaks_in_canonical_order() {
    // One backend hit, one frontend hit: backend is canonical-first.
    let c = classify(&issue("the endpoint renders a button", "", &[]));
    assert_eq!(c.domain, Domain::Backend);
}

// ── Fallback & invariants ───────────────────────────────────────────

#[test]
fn test_fallback_unknown() {
    let c = classify(&issue("Random title", "nothing of note here", &[]));
    assert_eq!(c.domain, Domain::Unknown);
    assert_eq!(c.confidence, 0.0);
    assert!(c.reasons.is_empty());
}

#[test]
fn test_classify_is_deterministic() {
    let i = issue(
        "[Backend] flaky trpc endpoint",
        "see src/api/auth.ts",
        &["backend", "ui"],
    );
    assert_eq!(classify(&i), classify(&i));
}

#[test]
fn test_confidence_is_always_a_tier_constant() {
    let samples = [
        issue("[Backend] x", "", &[]),
        issue("x", "", &["db"]),
        issue("x", "docs/guide.md", &[]),
        issue("migration needed", "", &[]),
        issue("nothing", "", &[]),
    ];
    for sample in &samples {
        let c = classify(sample);
        assert!(
            [1.0, 0.9, 0.7, 0.5, 0.0].contains(&c.confidence),
            "unexpected confidence {}",
            c.confidence
        );
    }
}

#[test]
fn test_empty_issue_is_unknown() {
    let c = classify(&issue("", "", &[]));
    assert_eq!(c.domain, Domain::Unknown);
    assert_eq!(c.confidence, 0.0);
}

proptest! {
    #[test]
    fn prop_classify_never_panics_and_domain_is_valid(
        title in ".{0,80}",
        body in ".{0,200}",
    ) {
        let c = classify(&issue(&title, &body, &[]));
        prop_assert!(is_valid_domain(c.domain.as_str()));
        prop_assert!([1.0, 0.9, 0.7, 0.5, 0.0].contains(&c.confidence));
    }

    #[test]
    fn prop_unmatched_reasons_empty_iff_unknown(body in "[a-z ]{0,40}") {
        let c = classify(&issue("zzz", &body, &[]));
        if c.domain == Domain::Unknown {
            prop_assert!(c.reasons.is_empty());
        } else {
            prop_assert!(!c.reasons.is_empty());
        }
    }
}
