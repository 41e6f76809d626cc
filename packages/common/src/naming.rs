//! # Field naming
//!
//! Wire-level field names use the bracket scheme `outer[middle][leaf]`.
//! Groups rewrite the names of their children with the helpers below; they
//! are plain string functions so the rules can be checked without a tree.
//!
//! Names are application-controlled, so tokenization is best-effort and never
//! fails: `a[b` tokenizes the same as `a[b]`.

/// Split a wire name into its segments: `a[b][c]` → `["a", "b", "c"]`.
///
/// Every `]` is dropped before splitting on `[`, so an empty name yields a
/// single empty segment.
pub fn tokenize(name: &str) -> Vec<String> {
    name.replace(']', "")
        .split('[')
        .map(str::to_string)
        .collect()
}

/// Rebuild a relative name from segments: `["a", "b"]` → `a[b]`.
pub fn join(tokens: &[String]) -> String {
    let mut iter = tokens.iter();
    let mut name = iter.next().cloned().unwrap_or_default();
    for token in iter {
        name.push('[');
        name.push_str(token);
        name.push(']');
    }
    name
}

/// Prefix segments with a group name: `("g", ["a", "b"])` → `g[a][b]`.
pub fn prefix(group: &str, tokens: &[String]) -> String {
    format!("{}[{}]", group, tokens.join("]["))
}

/// Drop the prefix a group applied under its previous name.
///
/// Everything up to and including the **last** occurrence of the previous
/// name's final segment is removed. When that segment does not occur at all
/// the tokens are returned untouched.
pub fn strip_previous(mut tokens: Vec<String>, previous: &str) -> Vec<String> {
    let last = tokenize(previous).pop().unwrap_or_default();
    match tokens.iter().rposition(|token| *token == last) {
        Some(pos) => tokens.split_off(pos + 1),
        None => tokens,
    }
}

/// Compute the new wire name of a group child.
///
/// * `current` - the child's present name
/// * `group` - the group's (new) name
/// * `previous` - the group's name before the last rename
/// * `already_child` - whether the child is already attached to this group,
///   i.e. carries a prefix applied under `previous`
///
/// Returns `None` when the name stays as it is.
pub fn rename(
    current: &str,
    group: Option<&str>,
    previous: Option<&str>,
    already_child: bool,
) -> Option<String> {
    let previous = previous.filter(|p| !p.is_empty());
    let mut tokens = tokenize(current);
    if already_child {
        if let Some(previous) = previous {
            tokens = strip_previous(tokens, previous);
        }
    }

    match group.filter(|g| !g.is_empty()) {
        Some(group) => Some(prefix(group, &tokens)),
        // Unnamed group: only rewrite when a prefix is being unwrapped
        None => previous.map(|_| join(&tokens)),
    }
}

/// Remove a group's prefix from a detached child's name: `("a[x][y]", "a")`
/// → `x[y]`. Names that do not carry the prefix are returned as-is.
pub fn strip_group_prefix(name: &str, group: &str) -> String {
    if group.is_empty() {
        return name.to_string();
    }
    let tokens = tokenize(name);
    let group_tokens = tokenize(group);
    if tokens.len() > group_tokens.len() && tokens.starts_with(&group_tokens) {
        join(&tokens[group_tokens.len()..])
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("a[b][c]"), strings(&["a", "b", "c"]));
        assert_eq!(tokenize("plain"), strings(&["plain"]));
        assert_eq!(tokenize(""), strings(&[""]));
        assert_eq!(tokenize("a[b"), strings(&["a", "b"]));
    }

    #[test]
    fn test_join_and_prefix() {
        assert_eq!(join(&strings(&["x", "y"])), "x[y]");
        assert_eq!(join(&[]), "");
        assert_eq!(prefix("g", &strings(&["x", "y"])), "g[x][y]");
        assert_eq!(prefix("a[b]", &strings(&["x"])), "a[b][x]");
    }

    #[test]
    fn test_strip_previous_uses_last_occurrence() {
        // The terminal segment "a" also appears deeper in the chain
        let tokens = strings(&["a", "x", "a", "y"]);
        assert_eq!(strip_previous(tokens, "a"), strings(&["y"]));

        let tokens = strings(&["o", "i", "x"]);
        assert_eq!(strip_previous(tokens, "o[i]"), strings(&["x"]));
    }

    #[test]
    fn test_strip_previous_missing_segment_keeps_tokens() {
        let tokens = strings(&["p", "x"]);
        assert_eq!(strip_previous(tokens.clone(), "zzz"), tokens);
    }

    #[test]
    fn test_strip_previous_empty_final_segment() {
        // A group named "a[]" prefixes with an empty segment
        let tokens = tokenize("a[][x]");
        assert_eq!(strip_previous(tokens, "a[]"), strings(&["x"]));
    }

    #[test]
    fn test_rename_first_attach() {
        assert_eq!(rename("x", Some("a"), None, false), Some("a[x]".into()));
        assert_eq!(rename("x[y]", Some("a"), None, false), Some("a[x][y]".into()));
        // A fresh child is never stripped, even if it looks prefixed
        assert_eq!(rename("a[x]", Some("b"), Some("a"), false), Some("b[a][x]".into()));
    }

    #[test]
    fn test_rename_existing_child() {
        assert_eq!(rename("a[x]", Some("b"), Some("a"), true), Some("b[x]".into()));
        assert_eq!(rename("a[x]", Some("a"), Some("a"), true), Some("a[x]".into()));
    }

    #[test]
    fn test_rename_unnamed_group() {
        assert_eq!(rename("x", None, None, false), None);
        assert_eq!(rename("x", Some(""), Some(""), true), None);
        assert_eq!(rename("a[x][y]", Some(""), Some("a"), true), Some("x[y]".into()));
    }

    #[test]
    fn test_strip_group_prefix() {
        assert_eq!(strip_group_prefix("a[x][y]", "a"), "x[y]");
        assert_eq!(strip_group_prefix("o[i][x]", "o[i]"), "x");
        assert_eq!(strip_group_prefix("b[x]", "a"), "b[x]");
        assert_eq!(strip_group_prefix("a", "a"), "a");
        assert_eq!(strip_group_prefix("x", ""), "x");
    }
}
