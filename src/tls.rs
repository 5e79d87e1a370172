//! Process-wide TLS setup for `wss://` endpoints.

use tracing::debug;

/// Installs the `ring` crypto provider as the rustls process default.
///
/// The socket task resolves its TLS configuration from this default, so it
/// must run before the first connection is dialed. Calling it again is a
/// no-op.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}
