//! Injected configuration.
//!
//! Lookup data that older strategy collections hardcoded — instrument
//! definitions and the carry (interest-rate differential) direction per
//! currency pair — is loaded from TOML instead and handed to strategies
//! at construction time.
//!
//! ```toml
//! [[instruments]]
//! symbol = "EURUSD"
//! tick_size = 0.00001
//! digits = 5
//! lot_step = 0.01
//! min_volume = 0.01
//!
//! [carry]
//! AUDJPY = "long"
//! EURCHF = "short"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::domain::{Instrument, InstrumentError, Side};

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid instrument {symbol}: {source}")]
    Instrument {
        symbol: String,
        source: InstrumentError,
    },

    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },
}

/// All tradable instruments known to the deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    #[serde(default)]
    instruments: Vec<Instrument>,
}

impl InstrumentCatalog {
    /// Parse a catalog, rejecting entries that violate the instrument
    /// invariants. Deserialization bypasses `Instrument::new`, so every
    /// parsed entry is re-validated here; a zero tick size must fail at
    /// load time, not as NaN price math later.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigLoadError> {
        let catalog: Self = toml::from_str(text)?;
        for instrument in &catalog.instruments {
            instrument
                .validate()
                .map_err(|source| ConfigLoadError::Instrument {
                    symbol: instrument.symbol.clone(),
                    source,
                })?;
        }
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn get(&self, symbol: &str) -> Result<&Instrument, ConfigLoadError> {
        self.instruments
            .iter()
            .find(|i| i.symbol == symbol)
            .ok_or_else(|| ConfigLoadError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(|i| i.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Serialized carry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarryDirection {
    Long,
    Short,
}

impl CarryDirection {
    pub fn side(&self) -> Side {
        match self {
            CarryDirection::Long => Side::Long,
            CarryDirection::Short => Side::Short,
        }
    }
}

/// Per-pair carry direction map, injected into carry strategies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarryTable {
    #[serde(default)]
    carry: BTreeMap<String, CarryDirection>,
}

impl CarryTable {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn direction(&self, symbol: &str) -> Option<CarryDirection> {
        self.carry.get(symbol).copied()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, direction: CarryDirection) -> &mut Self {
        self.carry.insert(symbol.into(), direction);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.carry.is_empty()
    }
}
