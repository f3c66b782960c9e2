//! Task domains and the pairwise compatibility matrix.
//!
//! A domain is the scheduler's unit of conflict reasoning: two tasks may run
//! concurrently only when their domains are compatible. `Unknown` is a real
//! domain with its own semantics (runs alone), not an absent value.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Coarse label for the area of code a task touches.
///
/// Declaration order is the canonical tie-break order used by the
/// classifier; `Unknown` sorts last and never participates in tie-breaks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Backend,
    Frontend,
    Database,
    Infrastructure,
    Security,
    Testing,
    Documentation,
    Unknown,
}

/// Every domain, in canonical order.
pub const ALL_DOMAINS: [Domain; 8] = [
    Domain::Backend,
    Domain::Frontend,
    Domain::Database,
    Domain::Infrastructure,
    Domain::Security,
    Domain::Testing,
    Domain::Documentation,
    Domain::Unknown,
];

impl Domain {
    /// Returns the lowercase name for this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Database => "database",
            Self::Infrastructure => "infrastructure",
            Self::Security => "security",
            Self::Testing => "testing",
            Self::Documentation => "documentation",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            "database" => Ok(Self::Database),
            "infrastructure" => Ok(Self::Infrastructure),
            "security" => Ok(Self::Security),
            "testing" => Ok(Self::Testing),
            "documentation" => Ok(Self::Documentation),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!(
                "Invalid domain '{}'. Valid domains: backend, frontend, database, \
                 infrastructure, security, testing, documentation, unknown",
                other
            )),
        }
    }
}

/// Membership test against the domain enum (lowercase names).
pub fn is_valid_domain(s: &str) -> bool {
    s.parse::<Domain>().is_ok()
}

/// Whether two running tasks may occupy slots at the same time.
///
/// Rules, evaluated in order:
/// 1. `unknown` on either side is incompatible with everything — an
///    unclassified task may touch anything, so it runs alone.
/// 2. Same domain is incompatible — overlapping files are likely.
/// 3. `database` on either side is incompatible — schema and migration
///    changes conflict with all concurrent work.
/// 4. Everything else is compatible.
///
/// The relation is symmetric and non-transitive.
pub fn are_domains_compatible(a: Domain, b: Domain) -> bool {
    if a == Domain::Unknown || b == Domain::Unknown {
        return false;
    }
    if a == b {
        return false;
    }
    if a == Domain::Database || b == Domain::Database {
        return false;
    }
    true
}
