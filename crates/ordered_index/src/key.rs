use std::fmt;

/// Composite index key.
///
/// Keys compare by `n` first and then by `s`, which is exactly the derived
/// lexicographic order over the two fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    pub n: i64,
    pub s: String,
}

impl Key {
    pub fn new(n: i64, s: impl Into<String>) -> Self {
        Self { n, s: s.into() }
    }
}

impl From<(i64, &str)> for Key {
    fn from((n, s): (i64, &str)) -> Self {
        Self::new(n, s)
    }
}

impl From<(i64, String)> for Key {
    fn from((n, s): (i64, String)) -> Self {
        Self { n, s }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.n, self.s)
    }
}
