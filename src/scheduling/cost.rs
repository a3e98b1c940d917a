//! Cost model: estimated service duration per (backend class, request).

use std::collections::HashMap;
use std::time::Duration;

use crate::backend::BackendClass;
use crate::core::config::CostConfig;

/// The scheduling-relevant view of one client request
///
/// Only the first two bytes of the payload carry meaning: a type-tag
/// character and a single decimal magnitude digit. Everything else is opaque
/// and relayed untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDescriptor {
    /// Fewer than two bytes, or a non-digit magnitude byte. A defined
    /// degenerate case that estimates to zero cost, never an error.
    Malformed,
    Request { tag: char, magnitude: u32 },
}

impl RequestDescriptor {
    /// Parse a descriptor from the leading bytes of a client payload
    pub fn parse(payload: &[u8]) -> Self {
        if payload.len() < 2 {
            return RequestDescriptor::Malformed;
        }
        let tag = payload[0] as char;
        match (payload[1] as char).to_digit(10) {
            Some(magnitude) => RequestDescriptor::Request { tag, magnitude },
            None => RequestDescriptor::Malformed,
        }
    }
}

/// Static mapping from (backend class, request tag) to a duration multiplier
///
/// Pairs absent from the table default to multiplier 1. The model is pure
/// and immutable for the process lifetime, so it needs no synchronization
/// and is safe to consult from any number of sessions concurrently.
#[derive(Debug, Clone)]
pub struct CostModel {
    multipliers: HashMap<(BackendClass, char), u32>,
}

impl CostModel {
    pub fn from_config(config: &CostConfig) -> Self {
        let multipliers = config
            .multipliers
            .iter()
            .map(|entry| ((entry.class, entry.request), entry.factor))
            .collect();
        Self { multipliers }
    }

    /// Estimate how long `descriptor` would occupy a backend of `class`
    ///
    /// `magnitude * multiplier` seconds; zero for malformed descriptors.
    pub fn estimate(&self, class: BackendClass, descriptor: &RequestDescriptor) -> Duration {
        match descriptor {
            RequestDescriptor::Malformed => Duration::ZERO,
            RequestDescriptor::Request { tag, magnitude } => {
                let multiplier = self.multipliers.get(&(class, *tag)).copied().unwrap_or(1);
                Duration::from_secs(u64::from(*magnitude) * u64::from(multiplier))
            }
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from_config(&CostConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_and_magnitude() {
        assert_eq!(
            RequestDescriptor::parse(b"V5 please"),
            RequestDescriptor::Request { tag: 'V', magnitude: 5 }
        );
        assert_eq!(
            RequestDescriptor::parse(b"M0"),
            RequestDescriptor::Request { tag: 'M', magnitude: 0 }
        );
    }

    #[test]
    fn short_or_non_numeric_payloads_are_malformed() {
        assert_eq!(RequestDescriptor::parse(b""), RequestDescriptor::Malformed);
        assert_eq!(RequestDescriptor::parse(b"V"), RequestDescriptor::Malformed);
        assert_eq!(RequestDescriptor::parse(b"Vx"), RequestDescriptor::Malformed);
    }

    #[test]
    fn applies_class_specific_multipliers() {
        let model = CostModel::default();
        let v5 = RequestDescriptor::parse(b"V5");

        assert_eq!(model.estimate(BackendClass::Video, &v5), Duration::from_secs(5));
        assert_eq!(model.estimate(BackendClass::Music, &v5), Duration::from_secs(15));
    }

    #[test]
    fn unknown_pairs_default_to_multiplier_one() {
        let model = CostModel::default();
        let unknown = RequestDescriptor::parse(b"Z4");

        assert_eq!(model.estimate(BackendClass::Video, &unknown), Duration::from_secs(4));
        assert_eq!(model.estimate(BackendClass::Music, &unknown), Duration::from_secs(4));
    }

    #[test]
    fn extreme_multipliers_widen_without_overflow() {
        let config = CostConfig {
            multipliers: vec![crate::core::config::MultiplierEntry {
                class: BackendClass::Video,
                request: 'V',
                factor: u32::MAX,
            }],
        };
        let model = CostModel::from_config(&config);
        let v9 = RequestDescriptor::parse(b"V9");

        assert_eq!(
            model.estimate(BackendClass::Video, &v9),
            Duration::from_secs(9 * u64::from(u32::MAX))
        );
    }

    #[test]
    fn malformed_costs_zero_everywhere() {
        let model = CostModel::default();
        assert_eq!(
            model.estimate(BackendClass::Video, &RequestDescriptor::Malformed),
            Duration::ZERO
        );
        assert_eq!(
            model.estimate(BackendClass::Music, &RequestDescriptor::Malformed),
            Duration::ZERO
        );
    }
}
