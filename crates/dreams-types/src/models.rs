use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Registered user. Ids are handed out in registration order.
    UserId
);
id_type!(ChannelId);
id_type!(
    /// Direct-message conversation. Never reused after removal.
    DmId
);
id_type!(
    /// Shared counter across channels and DMs, strictly increasing.
    MessageId
);
id_type!(ReactId);

impl ReactId {
    /// The only reaction kind the server accepts.
    pub const THUMBS_UP: ReactId = ReactId(1);
}

/// Identifies one login session of a user; embedded in the bearer token.
pub type SessionId = Uuid;

/// Where a message lives: exactly one channel or one DM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerRef {
    Channel(ChannelId),
    Dm(DmId),
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel {}", id),
            Self::Dm(id) => write!(f, "dm {}", id),
        }
    }
}

/// Global (server-wide) permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Owner,
    Member,
}
