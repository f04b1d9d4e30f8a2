//! Registration table of known station hardware models.

use indexmap::IndexMap;

use crate::devices::evse::ChargingStation;
use crate::devices::rates::RateDomain;

/// Model used when a station has to be created without an explicit type.
pub const DEFAULT_MODEL: &str = "AeroVironment";

/// Maps hardware model names to their rate domains.
///
/// Built once at startup; scenarios name a model instead of spelling out its
/// rate set.
#[derive(Debug, Clone)]
pub struct StationModels {
    models: IndexMap<String, RateDomain>,
}

impl StationModels {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            models: IndexMap::new(),
        }
    }

    /// The built-in models: `BASIC`, `AeroVironment`, and `ClipperCreek`.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.register("BASIC", RateDomain::unbounded());
        table.register(
            "AeroVironment",
            RateDomain::discretized(std::iter::once(0.0).chain((6..=32).map(f64::from))),
        );
        table.register(
            "ClipperCreek",
            RateDomain::discretized([0.0, 8.0, 16.0, 24.0, 32.0]),
        );
        table
    }

    /// Adds or replaces a model.
    pub fn register(&mut self, name: impl Into<String>, rates: RateDomain) {
        self.models.insert(name.into(), rates);
    }

    pub fn get(&self, name: &str) -> Option<&RateDomain> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Builds a station of the named model, or `None` for an unknown model.
    pub fn build(&self, station_id: impl Into<String>, model: &str) -> Option<ChargingStation> {
        self.get(model)
            .map(|rates| ChargingStation::new(station_id, rates.clone()))
    }
}

impl Default for StationModels {
    fn default() -> Self {
        Self::builtin()
    }
}
