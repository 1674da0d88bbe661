//! Directory emulation over a flat object namespace.
//!
//! A "directory" is never stored. Membership is decided purely from object
//! names: `D/x` is inside `D`, `D/x/y` is inside `D` only when listing
//! recursively. Directory names are compared as literal strings.

pub const SEPARATOR: char = '/';

/// Membership rule selected by `(recursive, directory is empty)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchRule {
    /// Whole bucket, any depth.
    Everything,
    /// Names without any separator.
    TopLevel,
    /// Names starting with `D/`, any depth.
    Descendants { prefix: String },
    /// Names starting with `D/` with no separator after the prefix.
    Children { prefix: String },
}

impl MatchRule {
    pub fn new(directory: &str, recursive: bool) -> Self {
        match (recursive, directory.is_empty()) {
            (true, true) => MatchRule::Everything,
            (false, true) => MatchRule::TopLevel,
            (true, false) => MatchRule::Descendants {
                prefix: format!("{directory}{SEPARATOR}"),
            },
            (false, false) => MatchRule::Children {
                prefix: format!("{directory}{SEPARATOR}"),
            },
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            MatchRule::Everything => true,
            MatchRule::TopLevel => !name.contains(SEPARATOR),
            MatchRule::Descendants { prefix } => name.starts_with(prefix.as_str()),
            MatchRule::Children { prefix } => name
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.contains(SEPARATOR)),
        }
    }
}

/// Keep the items whose name belongs to `directory`, preserving input order.
pub fn filter_directory<T, F>(items: Vec<T>, directory: &str, recursive: bool, name_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let rule = MatchRule::new(directory, recursive);
    items
        .into_iter()
        .filter(|item| rule.matches(name_of(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_names<'a>(names: &[&'a str], directory: &str, recursive: bool) -> Vec<&'a str> {
        filter_directory(names.to_vec(), directory, recursive, |name| *name)
    }

    const BUCKET: [&str; 3] = ["a/b.txt", "a/c/d.txt", "e.txt"];

    #[test]
    fn direct_children_only_when_not_recursive() {
        assert_eq!(match_names(&BUCKET, "a", false), ["a/b.txt"]);
    }

    #[test]
    fn recursive_includes_nested_entries() {
        assert_eq!(match_names(&BUCKET, "a", true), ["a/b.txt", "a/c/d.txt"]);
    }

    #[test]
    fn root_listing_has_top_level_names_only() {
        assert_eq!(match_names(&BUCKET, "", false), ["e.txt"]);
        assert_eq!(match_names(&BUCKET, "", true), BUCKET);
    }

    #[test]
    fn directory_name_is_matched_literally_and_anchored() {
        let names = ["a.b/x", "axb/x", "za.b/x", "a.b", "a.bc/x", "a+/y", "aa+/y"];
        assert_eq!(match_names(&names, "a.b", false), ["a.b/x"]);
        assert_eq!(match_names(&names, "a+", true), ["a+/y"]);
    }

    #[test]
    fn marker_and_empty_remainder() {
        let names = ["a", "a/", "a//b", "a/b/"];
        assert_eq!(match_names(&names, "a", false), ["a/"]);
        assert_eq!(match_names(&names, "a", true), ["a/", "a//b", "a/b/"]);
        assert_eq!(match_names(&names, "", false), ["a"]);
    }

    #[test]
    fn nested_directory() {
        assert_eq!(match_names(&BUCKET, "a/c", false), ["a/c/d.txt"]);
        assert!(match_names(&BUCKET, "a/c/d.txt", true).is_empty());
    }

    #[test]
    fn preserves_backend_order() {
        let names = ["z/1", "a/9", "z/0"];
        assert_eq!(match_names(&names, "z", false), ["z/1", "z/0"]);
    }

    #[test]
    fn recursive_is_superset_of_children() {
        let names = ["d/a", "d/b/c", "d/b/c/e", "x/d/a", "d", "dd/a"];
        for dir in ["", "d", "d/b", "x"] {
            let recursive = match_names(&names, dir, true);
            for child in match_names(&names, dir, false) {
                assert!(recursive.contains(&child), "{dir}: {child}");
            }
        }
    }
}
