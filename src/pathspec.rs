use crate::error::SiltGenericError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// path filter restricting which paths participate in a diff
///
/// only the non-wildcard prefix is honored: the pattern is cut at the first
/// unescaped wildcard and matched on path-component boundaries
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Pathspec {
    prefix: String,
}

impl Pathspec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// a pathspec that matches anything
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn matches_path(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            // the prefix must cover whole components: `foo` matches `foo`
            // and `foo/bar` but not `foobar`
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/'),
            None => false,
        }
    }

    // prefix is the section up to the first unescaped wildcard symbol
    fn find_prefix_end(s: &str) -> Option<usize> {
        let mut prev = None;
        for (i, c) in s.char_indices() {
            if Self::is_wildcard(c) && prev != Some('\\') {
                return Some(i);
            }
            prev = Some(c);
        }
        None
    }

    fn is_wildcard(c: char) -> bool {
        c == '*' || c == '?' || c == '['
    }
}

impl Display for Pathspec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)
    }
}

impl FromStr for Pathspec {
    type Err = SiltGenericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "." {
            return Ok(Self::match_all());
        }
        let prefix = match Self::find_prefix_end(s) {
            Some(i) => &s[..i],
            None => s,
        };
        Ok(Self::new(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiltResult;

    #[test]
    fn pathspec_prefix() -> SiltResult<()> {
        assert_eq!(Pathspec::find_prefix_end(r"\*"), None);
        assert_eq!(Pathspec::find_prefix_end(r"*"), Some(0));
        assert_eq!(Pathspec::find_prefix_end(r"abc?"), Some(3));
        Ok(())
    }

    #[test]
    fn pathspec_dot_matches_all() -> SiltResult<()> {
        let pathspec = Pathspec::from_str(".")?;
        assert!(pathspec.matches_path("wer"));
        assert!(pathspec.matches_path("foo/bar"));
        Ok(())
    }

    #[test]
    fn pathspec_matches_on_component_boundaries() -> SiltResult<()> {
        let pathspec = Pathspec::from_str("hello")?;
        assert!(pathspec.matches_path("hello"));
        assert!(!pathspec.matches_path("hello-world"));

        let pathspec = Pathspec::from_str("path")?;
        assert!(pathspec.matches_path("path/to/dir"));
        Ok(())
    }
}
