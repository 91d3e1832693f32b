// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Fareclip

//! Booking-text extraction engine: turns a pasted Vietnamese/English airline
//! booking blob into a structured flight record (price, route, schedule,
//! flight code, airline, aircraft type, one-way/round-trip).
//!
//! Extraction never fails: every gap in the input degrades to a placeholder
//! plus an entry in the result's `warnings`. The only fatal errors are
//! configuration-time ones (unreadable or empty city/airline datasets).

pub mod cache;
pub mod catalog;
pub mod data;
pub mod patterns;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod resolver;
mod trie;

use thiserror::Error;

pub use cache::{CachedExtraction, ResultCache, SWEEP_INTERVAL_SECS};
pub use catalog::{AirlineCatalog, AirlineInfo, AirlineRecord};
pub use patterns::CompiledPatterns;
pub use pipeline::{
    AircraftType, DayOfWeek, Endpoint, ExtractionResult, FlightLeg, AIRCRAFT_PENDING,
    UNKNOWN_CITY, UNKNOWN_DATE, UNKNOWN_TIME,
};
pub use registry::{City, CityRecord, CityRegistry};
pub use render::{RenderedFields, RenderedLeg};
pub use resolver::{AirportResolver, FirstCandidate, Unresolved};

/// Fatal configuration-time failures. Extraction-time issues never surface
/// here; they become warnings on the result instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dataset: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("City dataset is empty after deduplication")]
    EmptyCities,
    #[error("Airline catalog is empty")]
    EmptyAirlines,
    #[error("Pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),
}

/// The engine façade: immutable registry, catalog, and compiled patterns,
/// plus the mutex-guarded result cache and the injected ambiguity resolver.
/// Safe to share behind `&` across threads.
pub struct ExtractionEngine {
    registry: CityRegistry,
    catalog: AirlineCatalog,
    patterns: CompiledPatterns,
    cache: ResultCache,
    resolver: Box<dyn AirportResolver>,
}

impl ExtractionEngine {
    /// Builds an engine with the default non-interactive resolver (first
    /// candidate wins). Patterns are compiled here, once, and reused for
    /// every extraction.
    pub fn new(registry: CityRegistry, catalog: AirlineCatalog) -> Result<Self, ConfigError> {
        Self::with_resolver(registry, catalog, Box::new(FirstCandidate))
    }

    pub fn with_resolver(
        registry: CityRegistry,
        catalog: AirlineCatalog,
        resolver: Box<dyn AirportResolver>,
    ) -> Result<Self, ConfigError> {
        let patterns = CompiledPatterns::build(&registry, &catalog)?;
        Ok(Self {
            registry,
            catalog,
            patterns,
            cache: ResultCache::new(),
            resolver,
        })
    }

    /// Engine over the bundled default datasets.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::new(
            CityRegistry::from_records(data::default_cities())?,
            AirlineCatalog::from_records(data::default_airlines())?,
        )
    }

    /// Extracts a structured flight record from raw booking text.
    ///
    /// Cache-first: a repeated paste of identical text reproduces the first
    /// extraction exactly, resolver decisions included, without re-running
    /// the pipeline.
    pub fn extract(&self, text: &str) -> CachedExtraction {
        let key = ResultCache::key_for(text);
        if let Some(hit) = self.cache.get(key) {
            log::debug!("[Engine] Cache hit for key {:x}", key);
            return hit;
        }

        let ctx = pipeline::PassContext {
            registry: &self.registry,
            catalog: &self.catalog,
            patterns: &self.patterns,
            resolver: self.resolver.as_ref(),
        };
        let result = pipeline::run(&ctx, text);
        let fields = render::render(&result, &self.catalog);
        let entry = CachedExtraction { result, fields };
        self.cache.put(key, entry.clone());
        entry
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &AirlineCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }
}
