// Path whitelist
//
// Exact string matching only, `*` is the single sentinel that allows every path.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const ALLOW_ALL: &str = "*";

/// Ordered list of allowed request paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist(Vec<String>);

impl Whitelist {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// Parse the comma-separated `WHITELIST` form, trimming each entry
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn allows(&self, path: &str) -> bool {
        path_allowed(path, &self.0)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An empty path is checked as `/`
pub fn normalize_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Percent-decoded request path, the form the whitelist is written in.
/// Invalid UTF-8 sequences become U+FFFD.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Check `path` against the whitelist entries
pub fn path_allowed(path: &str, whitelist: &[String]) -> bool {
    let path = normalize_path(path);
    whitelist.iter().any(|p| p == ALLOW_ALL || p == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_allows_everything() {
        let list = Whitelist::new(["*"]);
        for path in ["", "/", "/v1/data", "/a/b/c?x=1", "no-slash"] {
            assert!(list.allows(path), "{path} should be allowed");
        }
    }

    #[test]
    fn test_exact_match_only() {
        let list = Whitelist::new(["/v1/other", "/health"]);
        assert!(list.allows("/v1/other"));
        assert!(!list.allows("/v1/data"));
        assert!(!list.allows("/v1/other/"));
        assert!(!list.allows("/v1"));
    }

    #[test]
    fn test_pattern_characters_are_literal() {
        let list = Whitelist::new(["/v1/*"]);
        assert!(!list.allows("/v1/data"));
        assert!(list.allows("/v1/*"));
    }

    #[test]
    fn test_empty_path_is_root() {
        let with_root = Whitelist::new(["/"]);
        assert_eq!(with_root.allows(""), with_root.allows("/"));
        assert!(with_root.allows(""));

        let without_root = Whitelist::new(["/v1"]);
        assert_eq!(without_root.allows(""), without_root.allows("/"));
        assert!(!without_root.allows(""));
    }

    #[test]
    fn test_empty_whitelist_rejects() {
        let list = Whitelist::default();
        assert!(list.is_empty());
        assert!(!list.allows("/"));
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/v1/%64ata"), "/v1/data");
        assert_eq!(decode_path("/a%20b/c"), "/a b/c");
        assert_eq!(decode_path("/plain"), "/plain");
        assert_eq!(decode_path(""), "");

        let list = Whitelist::new(["/v1/data"]);
        assert!(list.allows(&decode_path("/v1/%64ata")));
        assert!(!list.allows(&decode_path("/v1/%64ata2")));
    }

    #[test]
    fn test_parse_trims_entries() {
        let list = Whitelist::parse(" /a ,/b,, *");
        assert_eq!(list.entries(), &["/a", "/b", "*"]);
        assert!(Whitelist::parse("").is_empty());
    }
}
