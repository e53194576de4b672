//! Comparison operators used by threshold watches and branch predicates.

use serde::{Deserialize, Serialize};

/// A binary comparison between a reading and a reference value.
///
/// Serialized in snake case (`"lt"`); the upper-case spellings used by
/// generated scripts (`"LT"`) are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[serde(alias = "LT")]
    Lt,
    #[serde(alias = "LE")]
    Le,
    #[serde(alias = "GT")]
    Gt,
    #[serde(alias = "GE")]
    Ge,
    #[serde(alias = "EQ")]
    Eq,
    #[serde(alias = "NE")]
    Ne,
}

impl Comparison {
    /// Whether `value <op> reference` holds.
    ///
    /// Any comparison involving `NaN` is false, except `Ne`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn holds(self, value: f64, reference: f64) -> bool {
        match self {
            Self::Lt => value < reference,
            Self::Le => value <= reference,
            Self::Gt => value > reference,
            Self::Ge => value >= reference,
            Self::Eq => value == reference,
            Self::Ne => value != reference,
        }
    }

    /// The operator symbol, e.g. `"<"`.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
