#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The initial bulk query failed. Terminal for the view that issued it.
    Fetch(String),
    /// The change-event stream could not be established or dropped.
    Subscription(String),
    /// A fetched row could not be decoded into the expected shape.
    Decode(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Fetch(msg) => write!(f, "fetch failed: {msg}"),
            SyncError::Subscription(msg) => write!(f, "subscription error: {msg}"),
            SyncError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}
