//! Branch-name sanitization and title slugs.

use anyhow::{Result, bail};

pub const MAX_BRANCH_LEN: usize = 100;
const MAX_SLUG_LEN: usize = 50;

/// Sanitize a branch name for git: lowercase, keep `[a-z0-9-_/]`, map
/// everything else to `-`, collapse dash runs, strip edge dashes, cap at
/// [`MAX_BRANCH_LEN`]. Rejects names that sanitize to nothing.
pub fn sanitize_branch_name(name: &str) -> Result<String> {
    let replaced: String = name
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '/') {
                ch
            } else {
                '-'
            }
        })
        .collect();

    // Leading '/' must go too: the sanitized name becomes a path component
    // under .worktrees/ and an absolute segment would escape it.
    let collapsed = collapse_dashes(&replaced);
    let capped: String = collapsed
        .trim_matches(['-', '/'])
        .chars()
        .take(MAX_BRANCH_LEN)
        .collect();
    let result = capped.trim_matches(['-', '/']).to_string();

    if result.is_empty() {
        bail!("branch name '{}' sanitizes to an empty string", name);
    }
    Ok(result)
}

/// Slug for embedding an issue title in a branch name: like
/// [`sanitize_branch_name`] but stricter (`[a-z0-9-]` only) and shorter.
/// Unsluggable titles become an empty string, which callers may drop.
pub fn slugify_title(title: &str) -> String {
    let replaced: String = title
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect();

    let collapsed = collapse_dashes(&replaced);
    let capped: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect();
    capped.trim_matches('-').to_string()
}

fn collapse_dashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_dash = false;
    for ch in input.chars() {
        if ch == '-' {
            if !prev_dash {
                out.push(ch);
            }
            prev_dash = true;
        } else {
            out.push(ch);
            prev_dash = false;
        }
    }
    out
}
