//! File-backed conversion settings.
//!
//! Settings cover the declarative part of a [`Configuration`]: field
//! policies, strategy order and explicit map keys. They load from TOML or
//! JSON and fold into a [`ConfigurationBuilder`].
//!
//! ```toml
//! excluded = ["password"]
//! expandable = "all"
//! strategies = ["by-name-then-path", "map-key"]
//!
//! [map-keys]
//! fullName = "full_name"
//! ```

use crate::config::{
    Configuration, ConfigurationBuilder, ExcludedFields, ExpandableFields, FieldSelection,
};
use crate::error::{Error, Result};
use crate::strategy::{ByName, ByNameThenPath, ByPath, FieldStrategy, MapKey, MapKeyValue};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// `"all"` or `"none"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKeyword {
    All,
    None,
}

/// A field selection as written in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SelectionSetting {
    Keyword(SelectionKeyword),
    Names(Vec<String>),
}

impl From<&SelectionSetting> for FieldSelection {
    fn from(setting: &SelectionSetting) -> Self {
        match setting {
            SelectionSetting::Keyword(SelectionKeyword::All) => FieldSelection::All,
            SelectionSetting::Keyword(SelectionKeyword::None) => FieldSelection::None,
            SelectionSetting::Names(names) => FieldSelection::from_names(Some(names.clone())),
        }
    }
}

/// Built-in field strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    ByName,
    ByPath,
    ByNameThenPath,
    MapKey,
}

/// Map key as written in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum KeySetting {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl From<&KeySetting> for MapKeyValue {
    fn from(key: &KeySetting) -> Self {
        match key {
            KeySetting::Integer(n) => match i32::try_from(*n) {
                Ok(n) => MapKeyValue::Int(n),
                Err(_) => MapKeyValue::Long(*n),
            },
            KeySetting::Boolean(b) => MapKeyValue::Bool(*b),
            KeySetting::Text(s) => MapKeyValue::Str(s.clone()),
        }
    }
}

/// Declarative conversion settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConversionSettings {
    /// Destination fields never written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded: Option<SelectionSetting>,
    /// Expandable fields to populate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expandable: Option<SelectionSetting>,
    /// Strategy order; empty keeps the default order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strategies: Vec<StrategyKind>,
    /// Destination field name to source map key
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub map_keys: IndexMap<String, KeySetting>,
}

impl ConversionSettings {
    /// Load settings from a file; `.json` is read as JSON, anything else as
    /// TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = match path.extension() {
            Some(ext) if ext == "json" => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// JSON schema of the settings format.
    pub fn json_schema() -> Result<serde_json::Value> {
        Ok(serde_json::to_value(schemars::schema_for!(ConversionSettings))?)
    }

    fn validate(&self) -> Result<()> {
        for (index, kind) in self.strategies.iter().enumerate() {
            if self.strategies[..index].contains(kind) {
                return Err(Error::Settings(format!("strategy {kind:?} listed twice")));
            }
        }
        if !self.map_keys.is_empty()
            && !self.strategies.is_empty()
            && !self.strategies.contains(&StrategyKind::MapKey)
        {
            return Err(Error::Settings(
                "map-keys given but the map-key strategy is not enabled".to_string(),
            ));
        }
        Ok(())
    }

    fn map_key_strategy(&self) -> MapKey {
        self.map_keys
            .iter()
            .fold(MapKey::new(), |strategy, (field, key)| {
                strategy.with_key(field.clone(), MapKeyValue::from(key))
            })
    }

    fn strategy(&self, kind: StrategyKind) -> Arc<dyn FieldStrategy> {
        match kind {
            StrategyKind::ByName => Arc::new(ByName),
            StrategyKind::ByPath => Arc::new(ByPath),
            StrategyKind::ByNameThenPath => Arc::new(ByNameThenPath),
            StrategyKind::MapKey => Arc::new(self.map_key_strategy()),
        }
    }

    /// Fold these settings into `builder`. Unset entries keep the builder's
    /// values.
    pub fn apply(&self, mut builder: ConfigurationBuilder) -> ConfigurationBuilder {
        if let Some(excluded) = &self.excluded {
            builder = builder.excluded(ExcludedFields::new(excluded.into()));
        }
        if let Some(expandable) = &self.expandable {
            builder = builder.expandable(ExpandableFields::new(expandable.into()));
        }
        if !self.strategies.is_empty() {
            builder = builder.strategies(self.strategies.iter().map(|k| self.strategy(*k)).collect());
        } else if !self.map_keys.is_empty() {
            builder = builder.strategies(vec![
                self.strategy(StrategyKind::ByNameThenPath),
                self.strategy(StrategyKind::MapKey),
            ]);
        }
        builder
    }

    /// Default configuration with these settings applied.
    pub fn to_configuration(&self) -> Configuration {
        self.apply(Configuration::builder()).build()
    }
}
