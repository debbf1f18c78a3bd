// ABOUTME: Wallet action tools exposing the wallet provider's read-only operations to personas.
// ABOUTME: Each tool wraps a shared WalletProvider and renders its answer as plain text.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolError, required_str};
use crate::wallet::{WalletError, WalletProvider};

fn wallet_failure(e: WalletError) -> ToolError {
    match e {
        WalletError::InvalidAddress(addr) => {
            ToolError::InvalidArguments(format!("invalid address: {}", addr))
        }
        other => ToolError::Failed(other.to_string()),
    }
}

/// Tool: report address, network, and native balance.
pub struct GetWalletDetails {
    wallet: Arc<dyn WalletProvider>,
}

impl GetWalletDetails {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetWalletDetails {
    fn name(&self) -> &str {
        "get_wallet_details"
    }

    fn description(&self) -> &str {
        "Get the details of the agent's wallet: address, network id, and native token balance. \
         Call this before any other on-chain action to learn which network you are on."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, _args: Value) -> Result<String, ToolError> {
        let details = self.wallet.details().await;

        let address = details
            .address
            .unwrap_or_else(|| "not configured".to_string());
        let balance = details
            .native_balance
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unavailable".to_string());

        Ok(format!(
            "Wallet Details:\n- Address: {}\n- Network: {}\n- Native Balance: {}",
            address, details.network_id, balance
        ))
    }
}

/// Tool: native token balance of the agent's wallet.
pub struct GetNativeBalance {
    wallet: Arc<dyn WalletProvider>,
}

impl GetNativeBalance {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetNativeBalance {
    fn name(&self) -> &str {
        "get_native_balance"
    }

    fn description(&self) -> &str {
        "Get the native token (ETH) balance of the agent's wallet."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn call(&self, _args: Value) -> Result<String, ToolError> {
        let balance = self.wallet.native_balance().await.map_err(wallet_failure)?;
        Ok(format!("Native balance: {}", balance))
    }
}

/// Tool: ERC-20 balance of the agent's wallet for a token contract.
pub struct GetErc20Balance {
    wallet: Arc<dyn WalletProvider>,
}

impl GetErc20Balance {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl Tool for GetErc20Balance {
    fn name(&self) -> &str {
        "get_erc20_balance"
    }

    fn description(&self) -> &str {
        "Get the agent wallet's balance of an ERC-20 token, given the token's contract address. \
         Also reveals the token's decimals and symbol as reported by the contract."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_address": {
                    "type": "string",
                    "description": "The 0x-prefixed ERC-20 contract address."
                }
            },
            "required": ["contract_address"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let contract = required_str(&args, "contract_address")?;
        let balance = self
            .wallet
            .erc20_balance(contract)
            .await
            .map_err(wallet_failure)?;
        Ok(format!("Balance of {}: {}", contract.trim(), balance))
    }
}
