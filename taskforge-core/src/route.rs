//! Route template substitution.
//!
//! Templates use `<name>` placeholders. Substitution is checked both ways:
//! a placeholder without a bound value and a bound value without a
//! placeholder are both author/caller mismatches, caught before any I/O.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Placeholder names appearing in a route template, in order.
fn placeholders(route: &str) -> Result<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = route;
    while let Some(open) = rest.find('<') {
        let tail = &rest[open + 1..];
        let close = tail
            .find('>')
            .ok_or_else(|| Error::failure(format!("unterminated placeholder in route '{}'", route)))?;
        names.push(&tail[..close]);
        rest = &tail[close + 1..];
    }
    Ok(names)
}

/// Substitute bound arguments into a route template.
///
/// Returns the relative path with leading slashes stripped; the base URL is
/// joined by [`join_url`].
pub fn substitute(
    entry_name: &str,
    route: &str,
    bound: &BTreeMap<String, String>,
) -> Result<String> {
    let names = placeholders(route)?;

    for name in &names {
        if !bound.contains_key(*name) {
            return Err(Error::failure(format!(
                "route for '{}' has a '<{}>' placeholder with no bound argument",
                entry_name, name
            )));
        }
    }
    for key in bound.keys() {
        if !names.contains(&key.as_str()) {
            return Err(Error::failure(format!(
                "argument '{}' of '{}' does not appear in route '{}'",
                key, entry_name, route
            )));
        }
    }

    let mut path = route.to_owned();
    for (name, value) in bound {
        path = path.replace(&format!("<{}>", name), value);
    }
    Ok(path.trim_start_matches('/').to_owned())
}

/// Join a base URL and a relative path with exactly one slash between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
