use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `linksweep`.
///
/// Each component defines its own error variant. Library callers can match on
/// these to decide recovery strategy; the CLI continues to use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SweepError {
    // ── Shared store ────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Browser host ────────────────────────────────────────────────────
    #[error("host: {0}")]
    Host(#[from] HostError),

    // ── Page ↔ coordinator messaging ────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store at {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write store at {path}: {message}")]
    Write { path: String, message: String },
}

// ─── Host errors ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HostError {
    #[error("tab {0} not found")]
    TabNotFound(u64),

    #[error("window {0} not found")]
    WindowNotFound(u64),

    /// The page refuses script injection (browser-internal pages, galleries, files).
    #[error("cannot script {url}")]
    Unscriptable { url: String },

    #[error("host call failed: {0}")]
    Failed(String),
}

// ─── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// The coordinator endpoint is gone (stale page context, shutdown).
    #[error("coordinator unavailable")]
    Unavailable,

    #[error("coordinator dropped the request without replying")]
    NoReply,

    #[error("unexpected reply to {request}")]
    UnexpectedReply { request: &'static str },
}
