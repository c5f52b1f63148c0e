//! # Asset and Pool Identifiers
//!
//! String-backed identifiers for on-chain assets and liquidity pools. Both
//! order lexically, which gives the ranking stage a deterministic tie-break.
//!
//! ```rust
//! use types::{AssetId, PoolId};
//!
//! let usdc = AssetId::new("USDC");
//! let pool = PoolId::new("curve:USDC/USDT");
//! assert_eq!(usdc.as_str(), "USDC");
//! assert!(PoolId::new("a") < pool);
//! ```

use crate::common::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Highest token precision accepted for an [`Asset`]
pub const MAX_ASSET_DECIMALS: u8 = 36;

macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Create a new identifier, rejecting empty strings
            pub fn new_validated(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::EmptyId { kind: $kind });
                }
                Ok(Self(id))
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id! {
    /// Unique asset identifier (token address or symbol)
    AssetId, "asset"
}

define_string_id! {
    /// Unique pool identifier (pool address or venue-qualified name)
    PoolId, "pool"
}

/// An asset node: identifier plus decimal precision. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub decimals: u8,
}

impl Asset {
    pub fn new(id: AssetId, decimals: u8) -> Result<Self, ValidationError> {
        let asset = Self { id, decimals };
        asset.validate()?;
        Ok(asset)
    }

    /// Re-check invariants, used after deserialization
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyId { kind: "asset" });
        }
        if self.decimals > MAX_ASSET_DECIMALS {
            return Err(ValidationError::DecimalsOutOfRange {
                asset: self.id.to_string(),
                decimals: self.decimals,
                max: MAX_ASSET_DECIMALS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ids_rejected() {
        assert_eq!(
            AssetId::new_validated("  "),
            Err(ValidationError::EmptyId { kind: "asset" })
        );
        assert!(PoolId::new_validated("pool-1").is_ok());
    }

    #[test]
    fn test_pool_ids_order_lexically() {
        let mut ids = vec![PoolId::new("b"), PoolId::new("a2"), PoolId::new("a10")];
        ids.sort();
        let names: Vec<_> = ids.iter().map(PoolId::as_str).collect();
        assert_eq!(names, vec!["a10", "a2", "b"]);
    }

    #[test]
    fn test_asset_decimals_bound() {
        assert!(Asset::new(AssetId::new("WETH"), 18).is_ok());
        assert!(matches!(
            Asset::new(AssetId::new("ODD"), 40),
            Err(ValidationError::DecimalsOutOfRange { decimals: 40, .. })
        ));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&AssetId::new("USDC")).unwrap();
        assert_eq!(json, "\"USDC\"");
        let back: PoolId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, PoolId::new("p1"));
    }
}
