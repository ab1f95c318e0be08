use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-item forced purchasability.
///
/// `Unset` means "no opinion": the catalog's own purchasability applies.
/// Items that were never touched read as `Unset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchasabilityOverride {
    #[default]
    Unset,
    Purchasable,
    Unpurchasable,
}

impl PurchasabilityOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Purchasable => "purchasable",
            Self::Unpurchasable => "unpurchasable",
        }
    }
}

impl fmt::Display for PurchasabilityOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchasabilityOverride {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unset" => Ok(Self::Unset),
            "purchasable" => Ok(Self::Purchasable),
            "unpurchasable" => Ok(Self::Unpurchasable),
            other => Err(anyhow::anyhow!("unknown purchasability override: {other}")),
        }
    }
}

/// Direction of a flip. Only the two forced states can be targeted;
/// there is no transition back to `Unset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Purchasable,
    Unpurchasable,
}

impl Target {
    pub fn as_override(self) -> PurchasabilityOverride {
        match self {
            Target::Purchasable => PurchasabilityOverride::Purchasable,
            Target::Unpurchasable => PurchasabilityOverride::Unpurchasable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.as_override().as_str()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_text_form_is_stable() {
        for v in [
            PurchasabilityOverride::Unset,
            PurchasabilityOverride::Purchasable,
            PurchasabilityOverride::Unpurchasable,
        ] {
            assert_eq!(v.as_str().parse::<PurchasabilityOverride>().unwrap(), v);
        }
    }

    #[test]
    fn legacy_boolean_strings_are_rejected() {
        assert!("true".parse::<PurchasabilityOverride>().is_err());
        assert!("".parse::<PurchasabilityOverride>().is_err());
    }

    #[test]
    fn targets_map_to_forced_states() {
        assert_eq!(
            Target::Purchasable.as_override(),
            PurchasabilityOverride::Purchasable
        );
        assert_eq!(
            Target::Unpurchasable.as_override(),
            PurchasabilityOverride::Unpurchasable
        );
        assert_eq!(Target::Unpurchasable.to_string(), "unpurchasable");
    }
}
