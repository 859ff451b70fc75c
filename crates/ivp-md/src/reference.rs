//! Reference data: instrument codes, display names and kinds.
//!
//! Loaded once from a [`ReferenceSource`] and read-only afterwards. The
//! registry is passed explicitly to whoever needs it; tests substitute a
//! [`StaticReferenceSource`].

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::provider::ProviderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstrumentKind {
    Index,
    Region,
    Industry,
    Concept,
    Stock,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Index => "index",
            InstrumentKind::Region => "region",
            InstrumentKind::Industry => "industry",
            InstrumentKind::Concept => "concept",
            InstrumentKind::Stock => "stock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Some(InstrumentKind::Index),
            "region" => Some(InstrumentKind::Region),
            "industry" => Some(InstrumentKind::Industry),
            "concept" => Some(InstrumentKind::Concept),
            "stock" => Some(InstrumentKind::Stock),
            _ => None,
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub code: String,
    /// Venue prefix used by upstream quote services (e.g. `"90"` for boards).
    pub prefix: String,
    pub name: String,
    pub kind: InstrumentKind,
}

impl InstrumentInfo {
    pub fn new(code: &str, prefix: &str, name: &str, kind: InstrumentKind) -> Self {
        Self {
            code: code.to_string(),
            prefix: prefix.to_string(),
            name: name.to_string(),
            kind,
        }
    }
}

/// Loader for the instrument universe.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn load(&self) -> Result<Vec<InstrumentInfo>, ProviderError>;
}

/// Fixed in-memory source.
#[derive(Clone, Debug, Default)]
pub struct StaticReferenceSource {
    rows: Vec<InstrumentInfo>,
}

impl StaticReferenceSource {
    pub fn new(rows: Vec<InstrumentInfo>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl ReferenceSource for StaticReferenceSource {
    async fn load(&self) -> Result<Vec<InstrumentInfo>, ProviderError> {
        Ok(self.rows.clone())
    }
}

/// Read-only registry keyed by instrument code.
#[derive(Clone, Debug, Default)]
pub struct ReferenceData {
    by_code: BTreeMap<String, InstrumentInfo>,
}

impl ReferenceData {
    /// Load the full universe once. A repeated code keeps the last row.
    pub async fn load(source: &dyn ReferenceSource) -> Result<Self, ProviderError> {
        let rows = source.load().await?;
        let by_code: BTreeMap<String, InstrumentInfo> =
            rows.into_iter().map(|r| (r.code.clone(), r)).collect();
        info!(instruments = by_code.len(), "reference data loaded");
        Ok(Self { by_code })
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&InstrumentInfo> {
        self.by_code.get(code)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.get(code).map(|i| i.name.as_str())
    }

    pub fn prefix(&self, code: &str) -> Option<&str> {
        self.get(code).map(|i| i.prefix.as_str())
    }

    pub fn kind(&self, code: &str) -> Option<InstrumentKind> {
        self.get(code).map(|i| i.kind)
    }

    /// All instruments of `kind`, ordered by code.
    pub fn instruments_of_kind(&self, kind: InstrumentKind) -> Vec<&InstrumentInfo> {
        self.by_code.values().filter(|i| i.kind == kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> StaticReferenceSource {
        StaticReferenceSource::new(vec![
            InstrumentInfo::new("BK0623", "90", "Ocean Economy", InstrumentKind::Concept),
            InstrumentInfo::new("BK0501", "90", "New Listings", InstrumentKind::Concept),
            InstrumentInfo::new("BK0477", "90", "Brewing", InstrumentKind::Industry),
            InstrumentInfo::new("000001.SH", "1", "SSE Composite", InstrumentKind::Index),
        ])
    }

    #[tokio::test]
    async fn lookups_by_code_and_kind() {
        let data = ReferenceData::load(&source()).await.unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data.name("BK0477"), Some("Brewing"));
        assert_eq!(data.prefix("000001.SH"), Some("1"));
        assert_eq!(data.kind("BK0623"), Some(InstrumentKind::Concept));
        assert!(data.name("BK9999").is_none());

        let concepts: Vec<&str> = data
            .instruments_of_kind(InstrumentKind::Concept)
            .iter()
            .map(|i| i.code.as_str())
            .collect();
        assert_eq!(concepts, vec!["BK0501", "BK0623"]);
        assert!(data.instruments_of_kind(InstrumentKind::Stock).is_empty());
    }

    #[test]
    fn kind_parse_round_trip() {
        for k in [
            InstrumentKind::Index,
            InstrumentKind::Region,
            InstrumentKind::Industry,
            InstrumentKind::Concept,
            InstrumentKind::Stock,
        ] {
            assert_eq!(InstrumentKind::parse(k.as_str()), Some(k));
        }
        assert_eq!(InstrumentKind::parse("Concept"), Some(InstrumentKind::Concept));
        assert!(InstrumentKind::parse("etf").is_none());
    }
}
