//! Path pattern tokenizer.
//!
//! A pattern such as `/users/:id.json` is cut into the same pieces the matcher
//! cuts an incoming path into: every `/` and every `.` is a piece of its own,
//! and the text between them is one piece. Wildcards replace a text piece:
//!
//! ```text
//! /users/:id.json  →  "/" "users" "/" :id "." "json"
//! /files/*path     →  "/" "files" "/" *path
//! ```
//!
//! Because the matcher and the tokenizer agree on piece boundaries, a literal
//! trie edge always compares one whole piece against one whole piece.

use std::collections::HashSet;

use crate::error::Error;

/// One token of a compiled pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Segment {
    /// Exact text: a separator (`/`, `.`) or the run between separators.
    Literal(String),
    /// `:name`, binds the next run up to `/` or `.`.
    Param(String),
    /// `*name`, binds everything left, slashes included.
    Splat(String),
}

/// Tokenizes `pattern`, validating its syntax.
pub(crate) fn parse(pattern: &str) -> Result<Vec<Segment>, Error> {
    let Some(body) = pattern.strip_prefix('/') else {
        return Err(Error::invalid_pattern(pattern, "must start with `/`"));
    };

    let parts: Vec<&str> = body.split('/').collect();
    let mut segments = Vec::new();
    let mut names = HashSet::new();

    for (i, part) in parts.iter().enumerate() {
        segments.push(Segment::Literal("/".to_owned()));

        if let Some(name) = part.strip_prefix('*') {
            if name.is_empty() {
                return Err(Error::invalid_pattern(pattern, "splat needs a name"));
            }
            if i + 1 != parts.len() {
                return Err(Error::invalid_pattern(pattern, "splat must be the last segment"));
            }
            if !names.insert(name) {
                return Err(Error::invalid_pattern(pattern, "duplicate placeholder name"));
            }
            segments.push(Segment::Splat(name.to_owned()));
        } else if let Some(rest) = part.strip_prefix(':') {
            let end = rest.find('.').unwrap_or(rest.len());
            let (name, suffix) = rest.split_at(end);
            if name.is_empty() {
                return Err(Error::invalid_pattern(pattern, "param needs a name"));
            }
            if !names.insert(name) {
                return Err(Error::invalid_pattern(pattern, "duplicate placeholder name"));
            }
            segments.push(Segment::Param(name.to_owned()));
            push_literals(&mut segments, suffix);
        } else {
            push_literals(&mut segments, part);
        }
    }

    Ok(segments)
}

fn push_literals(segments: &mut Vec<Segment>, text: &str) {
    let mut rest = text;
    while !rest.is_empty() {
        let piece = next_piece(rest);
        segments.push(Segment::Literal(piece.to_owned()));
        rest = &rest[piece.len()..];
    }
}

/// Returns the leading piece of a non-empty `rest`: a lone separator, or the
/// run of text up to the next separator.
pub(crate) fn next_piece(rest: &str) -> &str {
    match rest.find(['/', '.']) {
        Some(0) => &rest[..1],
        Some(end) => &rest[..end],
        None => rest,
    }
}

pub(crate) fn is_separator(piece: &str) -> bool {
    piece == "/" || piece == "."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Segment {
        Segment::Literal(s.to_owned())
    }

    #[test]
    fn root() {
        assert_eq!(parse("/").unwrap(), vec![lit("/")]);
    }

    #[test]
    fn literals_and_param_with_suffix() {
        assert_eq!(
            parse("/users/:id.json").unwrap(),
            vec![
                lit("/"),
                lit("users"),
                lit("/"),
                Segment::Param("id".into()),
                lit("."),
                lit("json"),
            ]
        );
    }

    #[test]
    fn splat_is_last() {
        assert_eq!(
            parse("/files/*path").unwrap(),
            vec![lit("/"), lit("files"), lit("/"), Segment::Splat("path".into())]
        );
        assert!(parse("/files/*path/more").is_err());
    }

    #[test]
    fn dotted_literal_is_split() {
        assert_eq!(
            parse("/index.html").unwrap(),
            vec![lit("/"), lit("index"), lit("."), lit("html")]
        );
    }

    #[test]
    fn rejects_bad_patterns() {
        assert!(parse("users").is_err());
        assert!(parse("/users/:").is_err());
        assert!(parse("/files/*").is_err());
        assert!(parse("/a/:id/b/:id").is_err());
    }

    #[test]
    fn pieces() {
        assert_eq!(next_piece("/abc"), "/");
        assert_eq!(next_piece(".json"), ".");
        assert_eq!(next_piece("42.json"), "42");
        assert_eq!(next_piece("tail"), "tail");
    }
}
