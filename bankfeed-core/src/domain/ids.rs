//! Integer id newtypes shared across the domain
//!
//! Ids come from the owning application's storage layer and are opaque to
//! the engine, except that lower ids were assigned earlier. Precedence
//! rules ("lowest id wins") rely on that ordering.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// Identifies an account
    AccountId
}

id_type! {
    /// Identifies a currency
    CurrencyId
}

id_type! {
    /// Identifies a timezone
    TimezoneId
}

id_type! {
    /// Identifies an import strategy
    StrategyId
}

id_type! {
    /// Identifies a persisted account mapping
    MappingId
}

id_type! {
    /// Identifies a stored transfer
    TransferId
}

impl AccountId {
    /// Sentinel for transfer sides that could not be resolved
    ///
    /// A transfer carrying this id on either side cannot be persisted until
    /// the caller replaces it with a real account.
    pub const PLACEHOLDER: AccountId = AccountId(-1);

    pub fn is_placeholder(&self) -> bool {
        *self == Self::PLACEHOLDER
    }
}
