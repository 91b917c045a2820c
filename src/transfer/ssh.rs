//! Shared SSH transport plumbing used by both transfer clients.

use std::sync::Arc;

use russh::client::{self, AuthResult, Handler};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// SSH client handler (required by russh).
#[derive(Clone)]
pub(crate) struct ClientHandler;

impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        // The benchmark trusts the server it is pointed at; no known_hosts
        // check is performed.
        debug!("accepting server host key without verification");
        Ok(true)
    }
}

/// Connect to the server and authenticate with the configured password.
///
/// Each network step is bounded by `config.connect_timeout`; a timeout or
/// a rejected login fails without leaving a partial session live.
pub(crate) async fn establish_session(config: &Config) -> Result<client::Handle<ClientHandler>> {
    let ssh_config = Arc::new(client::Config::default());
    let addr = (config.host.as_str(), config.port);

    debug!(host = %config.host, port = config.port, "connecting");
    let mut handle = tokio::time::timeout(
        config.connect_timeout,
        client::connect(ssh_config, addr, ClientHandler),
    )
    .await
    .map_err(|_| Error::Timeout {
        after: config.connect_timeout,
    })?
    .map_err(|e| Error::connection(format!("ssh connection to {}:{} failed: {e}", config.host, config.port)))?;

    debug!(user = %config.username, "authenticating");
    let auth = tokio::time::timeout(
        config.connect_timeout,
        handle.authenticate_password(&config.username, &config.password),
    )
    .await
    .map_err(|_| Error::Timeout {
        after: config.connect_timeout,
    })?
    .map_err(|e| Error::connection(format!("authentication exchange failed: {e}")))?;

    match auth {
        AuthResult::Success => {
            info!(user = %config.username, host = %config.host, "logged in");
            Ok(handle)
        }
        AuthResult::Failure { .. } => Err(Error::AuthenticationFailed {
            user: config.username.clone(),
            host: config.host.clone(),
        }),
    }
}

/// Best-effort session teardown. Errors are logged, never propagated.
pub(crate) async fn close_session(handle: client::Handle<ClientHandler>) {
    if let Err(e) = handle
        .disconnect(russh::Disconnect::ByApplication, "benchmark complete", "en")
        .await
    {
        debug!(error = %e, "disconnect failed");
    }
}
