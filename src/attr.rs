use std::collections::HashMap;

/// resolved value of the `diff` attribute for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffAttr {
    /// attribute explicitly set: the file diffs as text
    True,
    /// attribute explicitly unset: the file is binary
    False,
    Unspecified,
    /// a named diff driver; recognized but currently not acted upon
    Driver(String),
}

/// the attribute-engine seam; the diff core only ever asks about `diff`
pub trait AttributeSource {
    fn diff_attr(&self, path: &str) -> DiffAttr;
}

/// default source for repositories without attribute data
#[derive(Default)]
pub struct NoAttributes;

impl AttributeSource for NoAttributes {
    fn diff_attr(&self, _path: &str) -> DiffAttr {
        DiffAttr::Unspecified
    }
}

/// fixed path -> attribute map
#[derive(Default)]
pub struct StaticAttributes {
    map: HashMap<String, DiffAttr>,
}

impl StaticAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, attr: DiffAttr) {
        self.map.insert(path.into(), attr);
    }
}

impl AttributeSource for StaticAttributes {
    fn diff_attr(&self, path: &str) -> DiffAttr {
        self.map.get(path).cloned().unwrap_or(DiffAttr::Unspecified)
    }
}
