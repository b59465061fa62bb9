//! Unit id → absolute starting page, built once during discovery and then
//! frozen.

use crate::unit::UnitId;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageMapError {
    #[error("unit '{0}' was already recorded in the page map")]
    DuplicateUnit(UnitId),

    #[error("unit '{0}' produced zero pages")]
    EmptyUnit(UnitId),

    #[error("page numbering overflowed while recording unit '{0}'")]
    Overflow(UnitId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    unit: UnitId,
    start: u32,
    pages: u32,
}

/// Append-only accumulator used by the discovery pass.
///
/// Each recorded unit starts where the previous one ended, so contiguity
/// holds by construction.
#[derive(Debug)]
pub struct PageMapBuilder {
    entries: Vec<Entry>,
    index: HashMap<UnitId, usize>,
    next_page: u32,
}

impl Default for PageMapBuilder {
    fn default() -> Self {
        Self { entries: Vec::new(), index: HashMap::new(), next_page: 1 }
    }
}

impl PageMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `unit` at the running page counter and advances the counter by
    /// `page_count`. Returns the unit's starting page.
    pub fn record(&mut self, unit: UnitId, page_count: u32) -> Result<u32, PageMapError> {
        if self.index.contains_key(&unit) {
            return Err(PageMapError::DuplicateUnit(unit));
        }
        if page_count == 0 {
            return Err(PageMapError::EmptyUnit(unit));
        }
        let start = self.next_page;
        let next = start
            .checked_add(page_count)
            .ok_or_else(|| PageMapError::Overflow(unit.clone()))?;

        self.index.insert(unit.clone(), self.entries.len());
        self.entries.push(Entry { unit, start, pages: page_count });
        self.next_page = next;
        Ok(start)
    }

    /// Freezes the map. No further mutation is possible afterwards.
    pub fn finalize(self) -> PageMap {
        PageMap { entries: self.entries, index: self.index, total_pages: self.next_page - 1 }
    }
}

/// The finalized, read-only page map.
///
/// Iteration and serialization follow emission order, so the JSON form is
/// stable across identical builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMap {
    entries: Vec<Entry>,
    index: HashMap<UnitId, usize>,
    total_pages: u32,
}

impl PageMap {
    /// Starting page of `unit`, 1-based.
    pub fn start(&self, unit: &str) -> Option<u32> {
        self.entry(unit).map(|e| e.start)
    }

    /// Page count measured for `unit` during discovery.
    pub fn page_count(&self, unit: &str) -> Option<u32> {
        self.entry(unit).map(|e| e.pages)
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(unit, start)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&UnitId, u32)> {
        self.entries.iter().map(|e| (&e.unit, e.start))
    }

    pub fn keys(&self) -> impl Iterator<Item = &UnitId> {
        self.entries.iter().map(|e| &e.unit)
    }

    /// Compact JSON, as handed to the compiler's `page-map` input.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Indented JSON, as written to `page_map.json`.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn entry(&self, unit: &str) -> Option<&Entry> {
        self.index.get(&UnitId::from(unit)).map(|&i| &self.entries[i])
    }
}

impl Serialize for PageMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.unit.as_str(), &entry.start)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(counts: &[(&str, u32)]) -> PageMap {
        let mut builder = PageMapBuilder::new();
        for (unit, pages) in counts {
            builder.record(UnitId::from(*unit), *pages).unwrap();
        }
        builder.finalize()
    }

    #[test]
    fn starts_are_contiguous_and_one_based() {
        let map = build(&[("cover", 1), ("preface", 2), ("outline", 1)]);
        assert_eq!(map.start("cover"), Some(1));
        assert_eq!(map.start("preface"), Some(2));
        assert_eq!(map.start("outline"), Some(4));
        assert_eq!(map.page_count("preface"), Some(2));
        assert_eq!(map.total_pages(), 4);
    }

    #[test]
    fn serializes_in_emission_order() {
        let map = build(&[("cover", 1), ("preface", 2), ("outline", 1), ("chapter-01", 1)]);
        assert_eq!(
            map.to_json().unwrap(),
            r#"{"cover":1,"preface":2,"outline":4,"chapter-01":5}"#
        );
        assert!(map.to_json_pretty().unwrap().starts_with("{\n  \"cover\": 1,"));
    }

    #[test]
    fn rejects_duplicates_and_empty_units() {
        let mut builder = PageMapBuilder::new();
        builder.record("cover".into(), 1).unwrap();
        assert_eq!(
            builder.record("cover".into(), 1),
            Err(PageMapError::DuplicateUnit("cover".into()))
        );
        assert_eq!(
            builder.record("preface".into(), 0),
            Err(PageMapError::EmptyUnit("preface".into()))
        );
        assert_eq!(builder.finalize().total_pages(), 1);
    }

    #[test]
    fn detects_overflow() {
        let mut builder = PageMapBuilder::new();
        builder.record("cover".into(), u32::MAX - 1).unwrap();
        assert!(matches!(builder.record("preface".into(), 5), Err(PageMapError::Overflow(_))));
    }

    #[test]
    fn empty_map_has_no_pages() {
        let map = PageMapBuilder::new().finalize();
        assert!(map.is_empty());
        assert_eq!(map.total_pages(), 0);
        assert_eq!(map.start("cover"), None);
    }
}
