//! String identifiers for nodes, edges, and areas.
//!
//! Identifiers order by their string value; every deterministic tie-break in
//! the engine relies on that order.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            #[must_use]
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
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`Node`](crate::Node).
    NodeId
);
string_id!(
    /// Identifier of an [`Edge`](crate::Edge).
    EdgeId
);
string_id!(
    /// Identifier of an [`Area`](crate::Area).
    AreaId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_string_value() {
        let mut ids = vec![NodeId::from("b"), NodeId::from("a10"), NodeId::from("a2")];
        ids.sort();
        assert_eq!(
            ids.iter().map(NodeId::as_str).collect::<Vec<_>>(),
            vec!["a10", "a2", "b"]
        );
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&EdgeId::from("edge-1")).expect("serialize");
        assert_eq!(json, "\"edge-1\"");
    }
}
