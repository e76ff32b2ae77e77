// prvd - CLI for the Provide platform API
// Copyright (C) 2024 The prvd contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Configuration documents submitted with create requests
//!
//! A [`ConfigDocument`] is a nested key/value tree that serializes to a plain
//! JSON object. Keys are ordered so two documents built from the same inputs
//! serialize identically.

use serde::Serialize;
use std::collections::BTreeMap;

/// A single value inside a [`ConfigDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    String(String),
    Bool(bool),
    UInt(u64),
    Sequence(Vec<u64>),
    Document(ConfigDocument),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::UInt(value)
    }
}

impl From<Vec<u64>> for ConfigValue {
    fn from(value: Vec<u64>) -> Self {
        ConfigValue::Sequence(value)
    }
}

impl From<ConfigDocument> for ConfigValue {
    fn from(value: ConfigDocument) -> Self {
        ConfigValue::Document(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; an existing key is replaced.
    pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.entries.insert(key.to_string(), value.into());
    }

    /// Inserts `value` only when it is non-empty. Empty inputs leave the key
    /// absent rather than present with an empty value.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    pub fn with_non_empty(mut self, key: &str, value: &str) -> Self {
        self.insert_non_empty(key, value);
        self
    }
}

/// Read access for assertions on assembled documents.
#[cfg(test)]
impl ConfigDocument {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Nested document under `key`, if that key holds one.
    pub fn document(&self, key: &str) -> Option<&ConfigDocument> {
        match self.entries.get(key) {
            Some(ConfigValue::Document(doc)) => Some(doc),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
