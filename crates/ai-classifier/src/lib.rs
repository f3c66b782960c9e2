//! Four-tier issue classifier: title tags, labels, path patterns, keywords.
//!
//! `classify` is a pure function over an issue record; the first tier that
//! produces a match wins and terminates the cascade. Vocabulary lives in
//! [`vocab`] so the word lists can be reviewed and enumerated by tests.

mod classify;
pub mod vocab;

pub use ai_core::domain::{Domain, are_domains_compatible, is_valid_domain};
pub use classify::{
    CONFIDENCE_KEYWORD, CONFIDENCE_LABEL, CONFIDENCE_PATH, CONFIDENCE_TITLE_TAG, Classification,
    classify,
};
