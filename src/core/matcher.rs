//! Include/exclude key matching.
//!
//! Compiles the run's include and exclude key lists (plain names or glob
//! patterns like `API_*`) into two pure predicates. Exclusion wins over
//! inclusion at the matcher level, so callers never see a name as included
//! when an exclude pattern also matches it.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::Result;

/// Compiled include/exclude predicates for key names.
#[derive(Debug)]
pub struct KeyMatcher {
    include: GlobSet,
    exclude: GlobSet,
    include_all: bool,
}

impl KeyMatcher {
    /// Compile include and exclude pattern lists.
    ///
    /// Fails fast with `Error::Pattern` on invalid glob syntax, before any
    /// env file is touched.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
            include_all: include.is_empty(),
        })
    }

    /// Whether a key name matches the exclude list.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.is_match(name)
    }

    /// Whether a key name matches the include list.
    ///
    /// A name that also matches the exclude list never reports included.
    pub fn is_included(&self, name: &str) -> bool {
        !self.is_excluded(name) && self.include.is_match(name)
    }

    /// Whether a key name is eligible for rotation.
    ///
    /// An empty include list means every key is a candidate except excluded
    /// ones; a non-empty include list restricts candidates to listed keys,
    /// still subject to exclusion.
    pub fn participates(&self, name: &str) -> bool {
        !self.is_excluded(name) && (self.include_all || self.is_included(name))
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
