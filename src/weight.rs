//! Mount weight: the uniqueness key for router registration and the sort key
//! for mount ordering. Higher weights are mounted first.

use crate::error::BootError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(pub u32);

impl Weight {
    /// Parse a weight from untyped input (env vars, manifests). Anything that
    /// is not a non-negative integer is rejected.
    pub fn parse(s: &str) -> Result<Weight, BootError> {
        s.trim()
            .parse::<u32>()
            .map(Weight)
            .map_err(|_| BootError::InvalidWeight(s.to_string()))
    }
}

impl From<u32> for Weight {
    fn from(w: u32) -> Self {
        Weight(w)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integers() {
        assert_eq!(Weight::parse("0").unwrap(), Weight(0));
        assert_eq!(Weight::parse(" 42 ").unwrap(), Weight(42));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(matches!(
            Weight::parse("heavy"),
            Err(BootError::InvalidWeight(_))
        ));
        assert!(matches!(
            Weight::parse("-1"),
            Err(BootError::InvalidWeight(_))
        ));
        assert!(matches!(
            Weight::parse("1.5"),
            Err(BootError::InvalidWeight(_))
        ));
    }
}
