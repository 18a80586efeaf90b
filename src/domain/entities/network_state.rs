//! Upstream reachability state.

use serde::Serialize;
use std::fmt;

/// Whether upstream services are believed to be reachable.
///
/// There is no `Unknown` state: a fresh process assumes `Online` until the
/// first probe or upstream call says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    #[default]
    Online,
    Offline,
}

impl NetworkState {
    pub fn from_online(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }

    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Value of the `X-Network-Status` header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
