//! Consent and capability oracles: externally provided, read-only interfaces
//! consulted per feature request. The core never implements the real consent
//! service; it only consumes one through these traits.
//!
//! Grounded on the `VendorPayloadAdapter` trait-injected-at-construction
//! pattern used for pluggable data sources in the feature-math sibling crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which pipeline module a consent/capability query concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    Biosignal,
    Behavior,
    Context,
}

/// Per-module consent state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub biosignal: bool,
    pub behavior: bool,
    pub context: bool,
}

impl ConsentRecord {
    pub fn allows(&self, module: Module) -> bool {
        match module {
            Module::Biosignal => self.biosignal,
            Module::Behavior => self.behavior,
            Module::Context => self.context,
        }
    }
}

/// Access tier controlling feature fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityLevel {
    None,
    Core,
    Extended,
    Research,
}

/// Read-only consent oracle, queried fresh per feature request.
pub trait ConsentOracle: Send + Sync {
    fn current(&self) -> ConsentRecord;
}

/// Read-only capability oracle, queried fresh per feature request.
pub trait CapabilityOracle: Send + Sync {
    fn capability(&self, module: Module) -> CapabilityLevel;
}

/// Deterministic consent oracle for tests and local development: every
/// module defaults to granted unless overridden.
pub struct StaticConsentOracle {
    record: ConsentRecord,
}

impl StaticConsentOracle {
    pub fn new(record: ConsentRecord) -> Self {
        Self { record }
    }

    pub fn all_granted() -> Self {
        Self::new(ConsentRecord {
            biosignal: true,
            behavior: true,
            context: true,
        })
    }
}

impl ConsentOracle for StaticConsentOracle {
    fn current(&self) -> ConsentRecord {
        self.record
    }
}

/// Deterministic capability oracle for tests and local development.
pub struct StaticCapabilityOracle {
    levels: HashMap<Module, CapabilityLevel>,
    default_level: CapabilityLevel,
}

impl StaticCapabilityOracle {
    pub fn new(default_level: CapabilityLevel) -> Self {
        Self {
            levels: HashMap::new(),
            default_level,
        }
    }

    pub fn with_override(mut self, module: Module, level: CapabilityLevel) -> Self {
        self.levels.insert(module, level);
        self
    }

    pub fn research_everywhere() -> Self {
        Self::new(CapabilityLevel::Research)
    }
}

impl CapabilityOracle for StaticCapabilityOracle {
    fn capability(&self, module: Module) -> CapabilityLevel {
        self.levels
            .get(&module)
            .copied()
            .unwrap_or(self.default_level)
    }
}
