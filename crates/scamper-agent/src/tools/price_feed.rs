// ABOUTME: Price lookup tools backed by the Pyth Hermes HTTP API.
// ABOUTME: One tool resolves a token symbol to a USD price feed id, the other reads the latest price.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolError, required_str};

pub const DEFAULT_HERMES_URL: &str = "https://hermes.pyth.network";

/// Thin client for the Hermes endpoints the price tools need.
#[derive(Clone)]
pub struct HermesClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PriceFeed {
    id: String,
    #[serde(default)]
    attributes: FeedAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct FeedAttributes {
    #[serde(default)]
    base: String,
    #[serde(default)]
    quote_currency: String,
}

#[derive(Debug, Deserialize)]
struct PriceUpdate {
    parsed: Vec<ParsedPrice>,
}

#[derive(Debug, Deserialize)]
struct ParsedPrice {
    price: PriceComponent,
}

#[derive(Debug, Deserialize)]
struct PriceComponent {
    price: String,
    expo: i32,
}

impl HermesClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_HERMES_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ToolError> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ToolError::Failed(format!("price service request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("unexpected price service response: {}", e)))
    }

    async fn price_feed_id(&self, symbol: &str) -> Result<Option<String>, ToolError> {
        let url = format!(
            "{}/v2/price_feeds?query={}&asset_type=crypto",
            self.base_url,
            urlencoding::encode(symbol)
        );
        let feeds: Vec<PriceFeed> = self.get_json(&url).await?;
        Ok(select_usd_feed(&feeds, symbol))
    }

    async fn latest_price(&self, feed_id: &str) -> Result<String, ToolError> {
        let url = format!(
            "{}/v2/updates/price/latest?ids[]={}",
            self.base_url,
            urlencoding::encode(feed_id)
        );
        let update: PriceUpdate = self.get_json(&url).await?;
        let parsed = update
            .parsed
            .first()
            .ok_or_else(|| ToolError::Failed(format!("no price published for feed {}", feed_id)))?;
        let mantissa: i64 = parsed
            .price
            .price
            .parse()
            .map_err(|_| ToolError::Failed(format!("bad price value {}", parsed.price.price)))?;
        Ok(scale_price(mantissa, parsed.price.expo))
    }
}

/// Pick the feed quoting `symbol` in USD.
fn select_usd_feed(feeds: &[PriceFeed], symbol: &str) -> Option<String> {
    feeds
        .iter()
        .find(|f| {
            f.attributes.base.eq_ignore_ascii_case(symbol)
                && f.attributes.quote_currency.eq_ignore_ascii_case("USD")
        })
        .map(|f| f.id.clone())
}

/// Apply a Pyth exponent to an integer mantissa, e.g. (6140993501, -8) -> "61.40993501".
fn scale_price(mantissa: i64, expo: i32) -> String {
    let negative = mantissa < 0;
    let digits = mantissa.unsigned_abs().to_string();

    let body = if expo >= 0 {
        format!("{}{}", digits, "0".repeat(expo as usize))
    } else {
        let places = expo.unsigned_abs() as usize;
        let padded = format!("{:0>width$}", digits, width = places + 1);
        let (whole, fraction) = padded.split_at(padded.len() - places);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        }
    };

    if negative { format!("-{}", body) } else { body }
}

/// Tool: resolve a token symbol to its Pyth USD price feed id.
pub struct FetchPriceFeedId {
    hermes: HermesClient,
}

impl FetchPriceFeedId {
    pub fn new(hermes: HermesClient) -> Self {
        Self { hermes }
    }
}

#[async_trait]
impl Tool for FetchPriceFeedId {
    fn name(&self) -> &str {
        "fetch_price_feed_id"
    }

    fn description(&self) -> &str {
        "Look up the Pyth price feed id for a token symbol (e.g. BTC, ETH) quoted in USD. \
         Use the returned id with fetch_price."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "token_symbol": {
                    "type": "string",
                    "description": "The token symbol, e.g. BTC."
                }
            },
            "required": ["token_symbol"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let symbol = required_str(&args, "token_symbol")?.trim();
        match self.hermes.price_feed_id(symbol).await? {
            Some(id) => Ok(id),
            None => Ok(format!("No USD price feed found for {}", symbol)),
        }
    }
}

/// Tool: read the latest USD price for a Pyth price feed id.
pub struct FetchPrice {
    hermes: HermesClient,
}

impl FetchPrice {
    pub fn new(hermes: HermesClient) -> Self {
        Self { hermes }
    }
}

#[async_trait]
impl Tool for FetchPrice {
    fn name(&self) -> &str {
        "fetch_price"
    }

    fn description(&self) -> &str {
        "Fetch the latest USD price for a Pyth price feed id obtained from fetch_price_feed_id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "price_feed_id": {
                    "type": "string",
                    "description": "The hex price feed id."
                }
            },
            "required": ["price_feed_id"]
        })
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let feed_id = required_str(&args, "price_feed_id")?.trim();
        self.hermes.latest_price(feed_id).await
    }
}
