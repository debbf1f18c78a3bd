// ABOUTME: Wallet provider seam and a read-only EVM JSON-RPC implementation of it.
// ABOUTME: Restores itself from the opaque credential blob and exports the blob to persist back.

use std::fmt;

use async_trait::async_trait;
use ethers::abi::{AbiDecode, Token};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use scamper_core::CredentialBlob;

const NATIVE_SYMBOL: &str = "ETH";
const NATIVE_DECIMALS: u8 = 18;
const UNKNOWN_SYMBOL: &str = "tokens";

/// Function selector for balanceOf(address)
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Function selector for decimals()
const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Function selector for symbol()
const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// Errors produced by wallet providers.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("invalid credential blob: {0}")]
    InvalidCredentials(#[from] serde_json::Error),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("no wallet address configured; set WALLET_ADDRESS")]
    NoAddress,

    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),
}

/// Settings used to construct a wallet when the credential blob does not
/// already say otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub rpc_url: String,
    pub network_id: String,
    pub address: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia.base.org".to_string(),
            network_id: "base-sepolia".to_string(),
            address: None,
        }
    }
}

/// Typed contents of the credential blob this adapter writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCredentials {
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// An integer amount in a token's base units, with the decimals needed to
/// display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
    pub symbol: String,
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match format_units(self.raw, self.decimals) {
            Some(amount) => write!(f, "{} {}", amount, self.symbol),
            None => write!(f, "{} base units of {}", self.raw, self.symbol),
        }
    }
}

/// Snapshot of the wallet for the `get_wallet_details` action.
#[derive(Debug, Clone)]
pub struct WalletDetails {
    pub network_id: String,
    pub address: Option<String>,
    pub native_balance: Option<TokenAmount>,
}

/// The account side of the toolkit: identity, balances, and the state that
/// must survive a restart.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn network_id(&self) -> &str;

    fn address(&self) -> Option<&str>;

    async fn native_balance(&self) -> Result<TokenAmount, WalletError>;

    async fn erc20_balance(&self, token: &str) -> Result<TokenAmount, WalletError>;

    /// Serialize the current wallet state for the credential file.
    fn export(&self) -> Result<CredentialBlob, WalletError>;

    async fn details(&self) -> WalletDetails {
        let native_balance = match self.native_balance().await {
            Ok(amount) => Some(amount),
            Err(e) => {
                tracing::warn!(error = %e, "native balance unavailable");
                None
            }
        };
        WalletDetails {
            network_id: self.network_id().to_string(),
            address: self.address().map(String::from),
            native_balance,
        }
    }
}

/// Read-only wallet backed by an EVM JSON-RPC endpoint.
pub struct RpcWallet {
    client: reqwest::Client,
    rpc_url: String,
    credentials: WalletCredentials,
}

impl RpcWallet {
    /// Restore a wallet from the persisted blob, if any, falling back to the
    /// config. The blob decides the network; an address missing from the blob
    /// is taken from the config.
    pub fn restore(
        blob: Option<&CredentialBlob>,
        config: &WalletConfig,
        client: reqwest::Client,
    ) -> Result<Self, WalletError> {
        let mut credentials = match blob {
            Some(blob) => serde_json::from_str::<WalletCredentials>(blob.as_str())?,
            None => WalletCredentials {
                network_id: config.network_id.clone(),
                address: None,
            },
        };

        if credentials.network_id != config.network_id {
            tracing::warn!(
                stored = %credentials.network_id,
                configured = %config.network_id,
                "stored wallet network differs from configured network; keeping stored network"
            );
        }

        if credentials.address.is_none() {
            credentials.address = config.address.clone();
        }
        if let Some(address) = &credentials.address {
            credentials.address = Some(format!("{:?}", parse_address(address)?));
        }

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            credentials,
        })
    }

    pub fn credentials(&self) -> &WalletCredentials {
        &self.credentials
    }

    fn require_address(&self) -> Result<Address, WalletError> {
        let address = self
            .credentials
            .address
            .as_deref()
            .ok_or(WalletError::NoAddress)?;
        parse_address(address)
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WalletError::Rpc(format!("{} request failed: {}", method, e)))?
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(format!("{}: {}", method, e)))?;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(WalletError::Rpc(format!("{}: {}", method, message)));
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| WalletError::InvalidResponse(format!("{}: missing result", method)))
    }

    /// Run a read-only contract call and return the raw return data.
    async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, WalletError> {
        let call = json!({
            "to": format!("{:?}", to),
            "data": format!("0x{}", hex::encode(data)),
        });
        let result = self.rpc("eth_call", json!([call, "latest"])).await?;
        let encoded = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse("eth_call result is not a string".into()))?;

        hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| WalletError::InvalidResponse(format!("eth_call result is not hex: {}", e)))
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    fn network_id(&self) -> &str {
        &self.credentials.network_id
    }

    fn address(&self) -> Option<&str> {
        self.credentials.address.as_deref()
    }

    async fn native_balance(&self) -> Result<TokenAmount, WalletError> {
        let address = self.require_address()?;
        let result = self
            .rpc("eth_getBalance", json!([format!("{:?}", address), "latest"]))
            .await?;
        let raw: U256 = serde_json::from_value(result)
            .map_err(|e| WalletError::InvalidResponse(format!("eth_getBalance: {}", e)))?;

        Ok(TokenAmount {
            raw,
            decimals: NATIVE_DECIMALS,
            symbol: NATIVE_SYMBOL.to_string(),
        })
    }

    async fn erc20_balance(&self, token: &str) -> Result<TokenAmount, WalletError> {
        let owner = self.require_address()?;
        let token = parse_address(token)?;

        let raw = decode_balance(&self.eth_call(token, &encode_balance_of(owner)).await?)?;
        let decimals = decode_decimals(&self.eth_call(token, &DECIMALS_SELECTOR).await?)?;

        let symbol = match self.eth_call(token, &SYMBOL_SELECTOR).await {
            Ok(data) => decode_symbol(&data).unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
            Err(e) => {
                tracing::debug!(token = ?token, error = %e, "symbol() call failed");
                UNKNOWN_SYMBOL.to_string()
            }
        };

        Ok(TokenAmount {
            raw,
            decimals,
            symbol,
        })
    }

    fn export(&self) -> Result<CredentialBlob, WalletError> {
        Ok(CredentialBlob::from(serde_json::to_string(&self.credentials)?))
    }
}

/// Parse a 20-byte hex address.
pub fn parse_address(address: &str) -> Result<Address, WalletError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|_| WalletError::InvalidAddress(address.to_string()))
}

/// Encode a balanceOf(address) call
fn encode_balance_of(owner: Address) -> Vec<u8> {
    let mut data = BALANCE_OF_SELECTOR.to_vec();
    data.extend_from_slice(&ethers::abi::encode(&[Token::Address(owner)]));
    data
}

/// Decode a balance response (uint256)
fn decode_balance(data: &[u8]) -> Result<U256, WalletError> {
    U256::decode(data)
        .map_err(|e| WalletError::InvalidResponse(format!("failed to decode balance: {}", e)))
}

/// Decode a decimals response (uint8 in a 32-byte word)
fn decode_decimals(data: &[u8]) -> Result<u8, WalletError> {
    let value = U256::decode(data)
        .map_err(|e| WalletError::InvalidResponse(format!("failed to decode decimals: {}", e)))?;
    if value > U256::from(u8::MAX) {
        return Err(WalletError::InvalidResponse("decimals out of range".into()));
    }
    Ok(value.low_u32() as u8)
}

/// Decode a symbol response. Malformed or empty symbols yield `None`.
fn decode_symbol(data: &[u8]) -> Option<String> {
    let symbol = String::decode(data).ok()?;
    let symbol = symbol.trim_matches(char::from(0)).trim();
    (!symbol.is_empty()).then(|| symbol.to_string())
}

/// Render an integer amount of base units as a decimal string without
/// trailing zeros. `None` when the decimals exceed what a uint256 can scale.
pub fn format_units(raw: U256, decimals: u8) -> Option<String> {
    // 10^78 no longer fits in a uint256.
    if decimals > 77 {
        return None;
    }
    let formatted = ethers::utils::format_units(raw, u32::from(decimals)).ok()?;
    if !formatted.contains('.') {
        return Some(formatted);
    }
    Some(
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
    )
}
