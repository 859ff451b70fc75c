//! ivp-md
//!
//! Market-data boundary for the volume profile.
//!
//! This crate owns the collaborator traits (trading calendar, historical and
//! live fetch, reference data) and their in-process implementations: a static
//! calendar, a fixture provider, and CSV sample ingest. It performs no
//! aggregation; callers hand the resulting samples to `ivp-engine`.

pub mod calendar;
pub mod fixture;
pub mod ingest_csv;
pub mod provider;
pub mod reference;

pub use calendar::StaticCalendar;
pub use fixture::FixtureProvider;
pub use provider::{HistoricalFetch, LiveFetch, ProviderError, TradingCalendar};
pub use reference::{
    InstrumentInfo, InstrumentKind, ReferenceData, ReferenceSource, StaticReferenceSource,
};
