use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One declarative assertion against the computed risk overlay. The operator
/// stays a raw token so an unknown one deserializes fine and fails at
/// evaluation time instead of poisoning the whole scenario document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(alias = "operator")]
    pub op: String,
    #[serde(alias = "expected")]
    pub value: f64,
    #[serde(default, alias = "tolerance")]
    pub tol: Option<f64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Assertion-name → expectation map that keeps JSON declaration order, so
/// reports diff reproducibly across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations(Vec<(String, Expectation)>);

impl Expectations {
    pub fn new(entries: Vec<(String, Expectation)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Expectation)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Expectations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, expectation) in &self.0 {
            map.serialize_entry(key, expectation)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Expectations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor;

        impl<'de> Visitor<'de> for OrderedMapVisitor {
            type Value = Expectations;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of assertion names to expectations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Expectation>()? {
                    entries.push(entry);
                }
                Ok(Expectations(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor)
    }
}

/// A named, reusable regression input for the risk overlay: market features
/// plus portfolio state plus expected-outcome assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Map<String, Value>,
    #[serde(default)]
    pub portfolio_state: Map<String, Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub expectations: Expectations,
}

impl Scenario {
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}
