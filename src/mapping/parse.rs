//! Line grammar of the mapping file.
//!
//! ```text
//! <entitlement> = <kind>:<query>   # optional trailing comment
//! ```
//!
//! Whitespace anywhere on a line is insignificant and a `#` starts a comment
//! running to the end of the line.

/// The three raw fields of a declaration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Entitlement name.
    pub entitlement: String,
    /// Resolver tag as written.
    pub kind: String,
    /// Query handed to the resolver.
    pub query: String,
}

/// Removes comments and all whitespace from a line.
#[must_use]
pub fn strip(line: &str) -> String {
    let code = line.split_once('#').map_or(line, |(code, _)| code);
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parses one line.
///
/// Returns `Ok(None)` for lines that are blank or comment-only.
///
/// # Errors
///
/// Returns a description of the problem when the line lacks `=` or `:`, or
/// when the entitlement name or the kind is empty.
pub fn parse_line(line: &str) -> Result<Option<Declaration>, String> {
    let stripped = strip(line);
    if stripped.is_empty() {
        return Ok(None);
    }
    let (entitlement, definition) =
        stripped.split_once('=').ok_or_else(|| format!("missing '=' in {stripped:?}"))?;
    let (kind, query) =
        definition.split_once(':').ok_or_else(|| format!("missing ':' in {stripped:?}"))?;
    if entitlement.is_empty() {
        return Err(format!("missing entitlement name in {stripped:?}"));
    }
    if kind.is_empty() {
        return Err(format!("missing resolver kind in {stripped:?}"));
    }
    Ok(Some(Declaration {
        entitlement: entitlement.to_string(),
        kind: kind.to_string(),
        query: query.to_string(),
    }))
}

/// Formats a static-user declaration with the name padded to `width`.
#[must_use]
pub fn format_user_line(entitlement: &str, user: &str, width: usize) -> String {
    format!("{entitlement:<width$} = user:{user}\n")
}
