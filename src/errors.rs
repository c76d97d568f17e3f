use std::sync::Arc;

/// Faults raised while talking to WiZ bulbs.
///
/// A bulb that simply does not answer, or answers with garbage, is not an
/// error: those exchanges resolve to `Ok(None)`. The variants here are the
/// outcomes a caller can act on.
///
/// `Error` is `Clone` so that one coalesced `getPilot` outcome can be handed
/// to every waiting caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Failed to serialize a request to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(Arc<serde_json::Error>),

    /// A socket operation failed while talking to a bulb.
    #[error("socket {action} error: {err:?}")]
    Socket {
        action: String,
        err: Arc<std::io::Error>,
    },

    /// Attempted to send `setPilot` with no parameters set.
    #[error("invalid params; no attributes set")]
    InvalidParams,

    /// The bulb answered a `setPilot` but reported it did not apply it.
    #[error("bulb at {ip} rejected setPilot")]
    Rejected { ip: std::net::Ipv4Addr },

    /// The in-flight exchange ended without delivering a result.
    #[error("in-flight exchange dropped before delivering a result")]
    Dropped,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err: Arc::new(err),
        }
    }

    pub fn json_dump(err: serde_json::Error) -> Self {
        Error::JsonDump(Arc::new(err))
    }

    /// True for faults of the local host rather than of a remote bulb.
    ///
    /// Only a failure to bind the ephemeral socket qualifies; discovery
    /// aborts on these and swallows everything else.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Socket { action, .. } if action == "bind")
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
