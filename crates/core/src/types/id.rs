//! Newtype IDs for type-safe entity references.
//!
//! Every persisted entity gets its own ID wrapper so a `CustomerId` can
//! never be passed where a `ProductId` is expected. The wrappers are plain
//! `i32` newtypes (serial primary keys in the schema); repositories convert
//! at the query seam with [`as_i32`](CustomerId::as_i32).

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The underlying database key.
            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// A Krambambouli customer (one per submitted order).
    CustomerId
);
define_id!(
    /// A catalog product.
    ProductId
);
define_id!(
    /// A pickup location.
    PickupLocationId
);
define_id!(
    /// A delivery zone.
    DeliveryZoneId
);
define_id!(
    /// A staff user account.
    StaffUserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_i32() {
        let id = CustomerId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(CustomerId::from(42), id);
        assert_eq!(i32::from(id), 42);
    }

    #[test]
    fn serde_is_transparent() {
        let id = ProductId::new(7);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
    }
}
