//! Declarative parameter surface.
//!
//! Strategies describe their tunables as [`ParamSpec`]s so a host
//! optimizer UI can render and sweep them, and receive concrete values
//! back as a [`ParamValues`] map. All values travel as `f64`; integer
//! parameters are validated on extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One optimizable parameter: name, default, and sweep range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub default: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub optimizable: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            default,
            min,
            max,
            step,
            optimizable: true,
        }
    }

    /// A parameter shown in the UI but excluded from optimization sweeps.
    pub fn fixed(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            default,
            min: default,
            max: default,
            step: 0.0,
            optimizable: false,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Concrete parameter assignment, keyed by name.
///
/// `BTreeMap` keeps serialization deterministic, so two identical
/// assignments always serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamValues(BTreeMap<String, f64>);

impl ParamValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Value or fallback — the factory idiom for optional parameters.
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Value for a parameter with no sensible default.
    pub fn get_required(&self, name: &str) -> Result<f64, ParamError> {
        self.get(name).ok_or_else(|| ParamError::Missing {
            name: name.to_string(),
        })
    }

    /// Integer parameter with fallback. Rejects non-integral values.
    pub fn get_usize_or(&self, name: &str, default: usize) -> Result<usize, ParamError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => {
                if value < 0.0 || (value - value.round()).abs() > 1e-9 {
                    return Err(ParamError::NotAnInteger {
                        name: name.to_string(),
                        value,
                    });
                }
                Ok(value.round() as usize)
            }
        }
    }

    /// Check every assigned value against its spec's range.
    pub fn validate_against(&self, specs: &[ParamSpec]) -> Result<(), ParamError> {
        for spec in specs {
            if let Some(value) = self.get(&spec.name) {
                if !spec.contains(value) {
                    return Err(ParamError::OutOfRange {
                        name: spec.name.clone(),
                        value,
                        min: spec.min,
                        max: spec.max,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, f64)> for ParamValues {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("parameter {name} is required")]
    Missing { name: String },

    #[error("parameter {name}={value} must be an integer")]
    NotAnInteger { name: String, value: f64 },

    #[error("parameter {name}={value} outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_falls_back_to_default() {
        let mut params = ParamValues::new();
        params.set("fast_period", 12.0);
        assert_eq!(params.get_or("fast_period", 10.0), 12.0);
        assert_eq!(params.get_or("slow_period", 26.0), 26.0);
    }

    #[test]
    fn required_parameter_must_be_assigned() {
        let mut params = ParamValues::new();
        assert!(matches!(
            params.get_required("risk_fraction"),
            Err(ParamError::Missing { .. })
        ));
        params.set("risk_fraction", 0.01);
        assert_eq!(params.get_required("risk_fraction").unwrap(), 0.01);
    }

    #[test]
    fn usize_extraction_rejects_fractions() {
        let mut params = ParamValues::new();
        params.set("period", 14.5);
        assert!(params.get_usize_or("period", 14).is_err());
        params.set("period", 14.0);
        assert_eq!(params.get_usize_or("period", 0).unwrap(), 14);
    }

    #[test]
    fn validation_catches_out_of_range() {
        let specs = vec![ParamSpec::new("stop_points", 20.0, 0.0, 100.0, 1.0)];
        let mut params = ParamValues::new();
        params.set("stop_points", 250.0);
        assert!(params.validate_against(&specs).is_err());
        params.set("stop_points", 50.0);
        assert!(params.validate_against(&specs).is_ok());
    }

    #[test]
    fn fixed_spec_is_not_optimizable() {
        let spec = ParamSpec::fixed("volume_lots", 0.1);
        assert!(!spec.optimizable);
        assert!(spec.contains(0.1));
    }

    #[test]
    fn param_values_serialization_is_deterministic() {
        let mut a = ParamValues::new();
        a.set("b", 2.0).set("a", 1.0);
        let mut b = ParamValues::new();
        b.set("a", 1.0).set("b", 2.0);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
