//! Course Tiers
//!
//! The fixed-price offerings sold through checkout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PaymentError;

/// Prefix of every checkout line-item name, followed by the tier name
pub const LINE_ITEM_PREFIX: &str = "Quantum Course - ";

/// Course tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Starter,
    Pro,
    Elite,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Starter, Self::Pro, Self::Elite];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Pro => "Pro",
            Self::Elite => "Elite",
        }
    }

    /// Price in minor currency units
    pub const fn price(self) -> i64 {
        match self {
            Self::Starter => 19_700,
            Self::Pro => 49_700,
            Self::Elite => 149_700,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Starter => "Core curriculum and community access",
            Self::Pro => "Everything in Starter plus live sessions",
            Self::Elite => "Everything in Pro plus one-on-one coaching",
        }
    }

    /// Name of the checkout line item for this tier
    pub fn line_item_name(self) -> String {
        format!("{LINE_ITEM_PREFIX}{}", self.as_str())
    }

    /// Recover the tier from a checkout line-item name
    pub fn from_line_item_name(name: &str) -> Option<Self> {
        name.strip_prefix(LINE_ITEM_PREFIX)
            .and_then(|rest| rest.parse().ok())
    }
}

impl FromStr for Tier {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starter" => Ok(Self::Starter),
            "Pro" => Ok(Self::Pro),
            "Elite" => Ok(Self::Elite),
            _ => Err(PaymentError::InvalidArgument("Invalid tier".into())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
