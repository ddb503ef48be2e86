//! Strips framework-internal properties from records before they are written.

use std::collections::BTreeSet;

use crate::observability::record::LogRecord;

/// Properties removed from every record unless configured otherwise.
pub const DEFAULT_FILTERED_PROPERTIES: [&str; 4] = ["EventId", "ActionId", "ActionName", "RequestId"];

/// Removes a fixed set of property names from each record.
///
/// Pure: it touches only the record it is given, so it can run before or
/// after any other enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    names: BTreeSet<String>,
}

impl PropertyFilter {
    /// Filter for exactly `names`.
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The default names plus `extra`.
    pub fn with_extra<I, N>(extra: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut filter = Self::default();
        filter.names.extend(extra.into_iter().map(Into::into));
        filter
    }

    pub fn apply(&self, record: &mut LogRecord) {
        record.properties.retain(|name, _| !self.names.contains(name));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for PropertyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FILTERED_PROPERTIES)
    }
}
