use super::BrokerGateway;
use crate::config::BrokerConfig;
use crate::error::BotError;
use crate::Result;

/// Logged-in terminal connection, held for the life of the process
///
/// Acquire with [`BrokerSession::open`], release with [`BrokerSession::close`].
/// Closing consumes the session so the terminal is shut down exactly once.
pub struct BrokerSession<G: BrokerGateway> {
    gateway: G,
    account: u64,
    closed: bool,
}

impl<G: BrokerGateway> BrokerSession<G> {
    /// Log in to the account; on failure the terminal is released before returning
    pub async fn open(gateway: G, broker: &BrokerConfig) -> Result<Self> {
        let account = broker
            .account
            .ok_or_else(|| BotError::Config("broker.account is not set".to_string()))?;
        let password = broker.password.as_deref().unwrap_or_default();
        let server = broker.server.as_deref().unwrap_or_default();

        match gateway.login(account, password, server).await {
            Ok(true) => {
                tracing::info!("✓ Connected to account #{}", account);
                Ok(Self {
                    gateway,
                    account,
                    closed: false,
                })
            }
            Ok(false) => {
                release(&gateway).await;
                Err(BotError::Connection(format!(
                    "failed to connect to account #{}",
                    account
                )))
            }
            Err(e) => {
                release(&gateway).await;
                Err(e)
            }
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn account(&self) -> u64 {
        self.account
    }

    pub async fn close(mut self) {
        release(&self.gateway).await;
        self.closed = true;
        tracing::info!("Disconnected from account #{}", self.account);
    }
}

impl<G: BrokerGateway> Drop for BrokerSession<G> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "Session for account #{} dropped without shutting down the terminal",
                self.account
            );
        }
    }
}

async fn release<G: BrokerGateway>(gateway: &G) {
    if let Err(e) = gateway.shutdown().await {
        tracing::warn!("Terminal shutdown failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeGateway;

    fn broker(password: &str) -> BrokerConfig {
        BrokerConfig {
            bridge_url: "http://127.0.0.1:8228".to_string(),
            account: Some(2121944313),
            password: Some(password.to_string()),
            server: Some("XBTFX-MetaTrader5".to_string()),
            request_timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_open_and_close_releases_once() {
        let gateway = FakeGateway::new();
        let shutdown_calls = gateway.shutdown_calls.clone();

        let session = BrokerSession::open(gateway, &broker("secret"))
            .await
            .unwrap();
        assert_eq!(session.account(), 2121944313);
        assert_eq!(*shutdown_calls.lock().unwrap(), 0);

        session.close().await;
        assert_eq!(*shutdown_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_releases_terminal() {
        let gateway = FakeGateway::new();
        let shutdown_calls = gateway.shutdown_calls.clone();

        let result = BrokerSession::open(gateway, &broker("wrong")).await;
        assert!(matches!(result, Err(BotError::Connection(_))));
        assert_eq!(*shutdown_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_account_is_config_error() {
        let mut config = broker("secret");
        config.account = None;

        let result = BrokerSession::open(FakeGateway::new(), &config).await;
        assert!(matches!(result, Err(BotError::Config(_))));
    }
}
