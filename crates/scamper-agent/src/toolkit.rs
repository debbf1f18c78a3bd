// ABOUTME: Builds the wallet/action-provider bundle and bridges it into persona tools.
// ABOUTME: Every build loads the credential blob, restores the wallet, and writes the blob back.

use std::sync::Arc;

use scamper_store::CredentialStore;

use crate::runtime::AgentError;
use crate::tools::price_feed::{DEFAULT_HERMES_URL, HermesClient};
use crate::tools::{
    FetchPrice, FetchPriceFeedId, GetErc20Balance, GetNativeBalance, GetWalletDetails, ToolSet,
    WebSearchTool,
};
use crate::wallet::{RpcWallet, WalletConfig, WalletProvider};

/// Constructs toolkits on demand. Owns the credential file location and the
/// wallet settings, so nothing about the wallet lives in process globals.
#[derive(Debug, Clone)]
pub struct ToolkitFactory {
    store: CredentialStore,
    wallet_config: WalletConfig,
    http: reqwest::Client,
    hermes_url: String,
}

impl ToolkitFactory {
    pub fn new(store: CredentialStore, wallet_config: WalletConfig) -> Self {
        Self {
            store,
            wallet_config,
            http: reqwest::Client::new(),
            hermes_url: DEFAULT_HERMES_URL.to_string(),
        }
    }

    pub fn with_hermes_url(mut self, url: impl Into<String>) -> Self {
        self.hermes_url = url.into();
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Build a toolkit on the blocking pool. See [`ToolkitFactory::build_blocking`].
    pub async fn build(&self) -> Result<Toolkit, AgentError> {
        let factory = self.clone();
        tokio::task::spawn_blocking(move || factory.build_blocking())
            .await
            .map_err(|e| AgentError::Toolkit(format!("toolkit build task failed: {}", e)))?
    }

    /// Load the persisted blob (if any), restore the wallet from it, and
    /// persist the wallet's exported state. The credential file is rewritten
    /// on every call.
    pub fn build_blocking(&self) -> Result<Toolkit, AgentError> {
        let blob = self
            .store
            .load()
            .map_err(|e| AgentError::Toolkit(e.to_string()))?;
        let restored_from_file = blob.is_some();

        let wallet = RpcWallet::restore(blob.as_ref(), &self.wallet_config, self.http.clone())
            .map_err(|e| AgentError::Toolkit(e.to_string()))?;

        let exported = wallet
            .export()
            .map_err(|e| AgentError::Toolkit(e.to_string()))?;
        self.store
            .save(&exported)
            .map_err(|e| AgentError::Toolkit(e.to_string()))?;

        tracing::debug!(
            network = %wallet.network_id(),
            has_address = wallet.address().is_some(),
            restored_from_file,
            "built wallet toolkit"
        );

        Ok(Toolkit {
            wallet: Arc::new(wallet),
            http: self.http.clone(),
            hermes: HermesClient::with_base_url(self.http.clone(), self.hermes_url.clone()),
        })
    }
}

/// A wallet plus the action providers built around it.
#[derive(Clone)]
pub struct Toolkit {
    wallet: Arc<dyn WalletProvider>,
    http: reqwest::Client,
    hermes: HermesClient,
}

impl Toolkit {
    /// Wrap an existing wallet provider (used when the wallet does not come
    /// from the credential file).
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        let http = reqwest::Client::new();
        Self {
            wallet,
            hermes: HermesClient::new(http.clone()),
            http,
        }
    }

    pub fn wallet(&self) -> &Arc<dyn WalletProvider> {
        &self.wallet
    }

    /// The action providers as callable tools.
    pub fn action_tools(&self) -> ToolSet {
        vec![
            Arc::new(GetWalletDetails::new(Arc::clone(&self.wallet))),
            Arc::new(GetNativeBalance::new(Arc::clone(&self.wallet))),
            Arc::new(GetErc20Balance::new(Arc::clone(&self.wallet))),
            Arc::new(FetchPriceFeedId::new(self.hermes.clone())),
            Arc::new(FetchPrice::new(self.hermes.clone())),
        ]
    }

    /// Fresh tool set: every action tool followed by web search.
    pub fn tools(&self) -> ToolSet {
        let mut tools = self.action_tools();
        tools.push(Arc::new(WebSearchTool::with_client(self.http.clone())));
        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWallet;
    use scamper_core::CredentialBlob;
    use tempfile::TempDir;

    const ADDR: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    fn factory(dir: &TempDir, address: Option<&str>) -> ToolkitFactory {
        ToolkitFactory::new(
            CredentialStore::new(dir.path().join("wallet_data.txt")),
            WalletConfig {
                address: address.map(String::from),
                ..WalletConfig::default()
            },
        )
    }

    #[test]
    fn build_writes_credentials_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let factory = factory(&dir, Some(ADDR));
        assert!(factory.store().load().unwrap().is_none());

        let toolkit = factory.build_blocking().unwrap();

        let saved = factory.store().load().unwrap().expect("blob written on build");
        assert!(saved.as_str().contains(ADDR));
        assert_eq!(toolkit.wallet().address(), Some(ADDR));
    }

    #[test]
    fn subsequent_build_reads_back_what_was_written() {
        let dir = TempDir::new().unwrap();
        let factory = factory(&dir, Some(ADDR));

        factory.build_blocking().unwrap();
        let first = factory.store().load().unwrap().unwrap();
        factory.build_blocking().unwrap();
        let second = factory.store().load().unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn stored_blob_takes_precedence_over_config() {
        let dir = TempDir::new().unwrap();
        let factory = factory(&dir, Some(ADDR));
        let stored = CredentialBlob::new(format!(
            r#"{{"network_id":"base-mainnet","address":"{}"}}"#,
            "0x000000000000000000000000000000000000dead"
        ));
        factory.store().save(&stored).unwrap();

        let toolkit = factory.build_blocking().unwrap();

        assert_eq!(toolkit.wallet().network_id(), "base-mainnet");
        assert_eq!(
            toolkit.wallet().address(),
            Some("0x000000000000000000000000000000000000dead")
        );
        assert_eq!(factory.store().load().unwrap().unwrap(), stored);
    }

    #[test]
    fn corrupt_blob_fails_the_build() {
        let dir = TempDir::new().unwrap();
        let factory = factory(&dir, None);
        factory.store().save(&CredentialBlob::new("garbage")).unwrap();

        let err = factory.build_blocking().err().expect("corrupt blob should fail");
        assert!(matches!(err, AgentError::Toolkit(_)));
    }

    #[tokio::test]
    async fn async_build_runs_off_the_runtime_and_persists() {
        let dir = TempDir::new().unwrap();
        let factory = factory(&dir, Some(ADDR));

        let toolkit = factory.build().await.unwrap();

        assert_eq!(toolkit.wallet().address(), Some(ADDR));
        assert!(factory.store().load().unwrap().is_some());
    }

    #[test]
    fn tool_bridge_appends_web_search_last() {
        let toolkit = Toolkit::new(Arc::new(FakeWallet::funded()));
        let names: Vec<String> = toolkit.tools().iter().map(|t| t.name().to_string()).collect();

        assert_eq!(
            names,
            vec![
                "get_wallet_details",
                "get_native_balance",
                "get_erc20_balance",
                "fetch_price_feed_id",
                "fetch_price",
                "web_search",
            ]
        );
        assert_eq!(toolkit.action_tools().len(), names.len() - 1);
    }
}
