use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// A Sui account address (`0x...`).
    Address
);
string_id!(
    /// A Sui object id (`0x...`).
    ObjectId
);
string_id!(
    /// Fully-qualified asset type, `address::module::name`.
    AssetType
);

/// The owner's vault and the capability that authorises withdrawals from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHandle {
    pub vault_id: ObjectId,
    pub capability_id: ObjectId,
}

/// One entry of the vault's dynamic member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMembership {
    pub object_id: ObjectId,
    pub name: String,
}

/// Decoded content of a member object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetObject {
    pub object_id: ObjectId,
    /// `None` when the object's type has no generic parameter.
    pub full_type: Option<AssetType>,
    pub raw_balance: String,
}

/// Coin metadata as published on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub decimals: u8,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AssetMetadata {
    pub fn new(decimals: u8, symbol: Option<String>) -> Self {
        Self {
            decimals,
            symbol,
            name: None,
        }
    }
}

/// Object returned by a chain query, reduced to what the tracker reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub object_id: ObjectId,
    /// Move type of the object, e.g. `0x2::coin::Coin<0x2::sui::SUI>`.
    pub type_: Option<String>,
    /// Move struct fields, present only when content was requested and
    /// decodable.
    pub fields: Option<serde_json::Value>,
}

impl ObjectDescriptor {
    /// Read a string-valued field, accepting numbers as well since the RPC
    /// encodes `u64` balances as strings but older nodes used numbers.
    pub fn field_str(&self, name: &str) -> Option<String> {
        match self.fields.as_ref()?.get(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Filter for owned-object queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectFilter {
    StructType(String),
}

/// Which parts of an object to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectOptions {
    pub show_content: bool,
    pub show_type: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            show_content: true,
            show_type: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_string_and_numeric_fields() {
        let descriptor = ObjectDescriptor {
            object_id: ObjectId::new("0x1"),
            type_: None,
            fields: Some(json!({ "balance": "42", "count": 7, "flag": true })),
        };
        assert_eq!(descriptor.field_str("balance").as_deref(), Some("42"));
        assert_eq!(descriptor.field_str("count").as_deref(), Some("7"));
        assert_eq!(descriptor.field_str("flag"), None);
        assert_eq!(descriptor.field_str("missing"), None);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ObjectId::new("0xabc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xabc\"");
    }
}
