//! Native-token balance lookup over JSON-RPC.
//!
//! A [`BalanceClient`] validates the address locally, sends exactly one
//! `getBalance` request through its [`RpcTransport`] and converts the
//! returned lamports into SOL. Nothing is retried.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::address::Address;
use crate::error::{BalanceError, NetworkError};

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How final the queried state must be.
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Most recent block seen by the node, may be rolled back
    Processed,
    /// Voted on by a supermajority of the cluster
    #[default]
    Confirmed,
    /// Rooted, will not be rolled back
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint settings handed to the client by its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub endpoint: String,
    pub commitment: Commitment,
    /// Upper bound on the whole request, connect through body.
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RPC_URL.to_string(),
            commitment: Commitment::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A JSON-RPC 2.0 request body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl RpcRequest {
    pub fn get_balance(address: &Address, commitment: Commitment) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method: "getBalance",
            params: json!([address.to_base58(), { "commitment": commitment }]),
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

// Context metadata (slot) is accepted but unused
#[derive(Deserialize)]
struct BalanceResult {
    value: u64,
}

/// Sends one request and returns the raw response envelope.
pub trait RpcTransport {
    fn send(&self, request: &RpcRequest) -> Result<Value, NetworkError>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> Result<Self, NetworkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl RpcTransport for HttpTransport {
    fn send(&self, request: &RpcRequest) -> Result<Value, NetworkError> {
        debug!(endpoint = %self.endpoint, method = request.method, "sending rpc request");

        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| NetworkError::Malformed(e.to_string()))
    }
}

/// A balance, exact in lamports and approximate in SOL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceReading {
    pub address: Address,
    pub lamports: u64,
    /// For display only.
    pub sol: f64,
}

#[inline]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub struct BalanceClient<T: RpcTransport = HttpTransport> {
    transport: T,
    commitment: Commitment,
}

impl BalanceClient<HttpTransport> {
    pub fn new(config: &RpcConfig) -> Result<Self, NetworkError> {
        Ok(Self::with_transport(HttpTransport::new(config)?, config.commitment))
    }
}

impl<T: RpcTransport> BalanceClient<T> {
    pub fn with_transport(transport: T, commitment: Commitment) -> Self {
        Self {
            transport,
            commitment,
        }
    }

    pub fn get_balance(&self, address: &str) -> Result<BalanceReading, BalanceError> {
        let address: Address = address.parse()?;
        let lamports = self.fetch_lamports(&address)?;

        Ok(BalanceReading {
            address,
            lamports,
            sol: lamports_to_sol(lamports),
        })
    }

    fn fetch_lamports(&self, address: &Address) -> Result<u64, NetworkError> {
        let request = RpcRequest::get_balance(address, self.commitment);
        let envelope: RpcResponse = serde_json::from_value(self.transport.send(&request)?)
            .map_err(|e| NetworkError::Malformed(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(NetworkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = envelope
            .result
            .ok_or_else(|| NetworkError::Malformed("response has neither result nor error".into()))?;
        let balance: BalanceResult =
            serde_json::from_value(result).map_err(|e| NetworkError::Malformed(e.to_string()))?;

        debug!(%address, lamports = balance.value, commitment = %self.commitment, "balance fetched");
        Ok(balance.value)
    }
}

/// Looks up one address with a fresh HTTP client built from `config`.
///
/// The address is validated before the client is built.
pub fn get_balance(config: &RpcConfig, address: &str) -> Result<BalanceReading, BalanceError> {
    address.parse::<Address>()?;
    BalanceClient::new(config)?.get_balance(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct MockTransport {
        response: Result<Value, String>,
        calls: Cell<usize>,
        last_request: RefCell<Option<RpcRequest>>,
    }

    impl MockTransport {
        fn replying(response: Value) -> Self {
            Self {
                response: Ok(response),
                calls: Cell::new(0),
                last_request: RefCell::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: Cell::new(0),
                last_request: RefCell::new(None),
            }
        }
    }

    impl RpcTransport for MockTransport {
        fn send(&self, request: &RpcRequest) -> Result<Value, NetworkError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_request.borrow_mut() = Some(request.clone());
            self.response.clone().map_err(NetworkError::Malformed)
        }
    }

    const ADDRESS: &str = "11111111111111111111111111111111";

    #[test]
    fn test_converts_lamports_to_sol() {
        let transport = MockTransport::replying(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 42 }, "value": 2_500_000_000u64 }
        }));
        let client = BalanceClient::with_transport(transport, Commitment::Confirmed);

        let reading = client.get_balance(ADDRESS).unwrap();
        assert_eq!(reading.lamports, 2_500_000_000);
        assert_eq!(reading.sol, 2.5);
        assert_eq!(reading.address.to_string(), ADDRESS);
    }

    #[test]
    fn test_request_shape() {
        let transport = MockTransport::replying(json!({ "result": { "value": 0 } }));
        let client = BalanceClient::with_transport(transport, Commitment::Finalized);
        client.get_balance(ADDRESS).unwrap();

        let request = client.transport.last_request.borrow().clone().unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getBalance",
                "params": [ADDRESS, { "commitment": "finalized" }]
            })
        );
        assert_eq!(client.transport.calls.get(), 1);
    }

    #[test]
    fn test_invalid_address_skips_network() {
        let transport = MockTransport::replying(json!({ "result": { "value": 1 } }));
        let client = BalanceClient::with_transport(transport, Commitment::Confirmed);

        for bad in [
            "",
            "abc",
            "0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl",
            "not an address",
            " 11111111111111111111111111111111",
            "11111111111111111111111111111111\n",
        ] {
            let err = client.get_balance(bad).unwrap_err();
            assert!(matches!(err, BalanceError::InvalidAddress(_)), "{bad}: {err}");
        }
        assert_eq!(client.transport.calls.get(), 0);
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let client =
            BalanceClient::with_transport(MockTransport::failing("boom"), Commitment::Confirmed);
        let err = client.get_balance(ADDRESS).unwrap_err();
        assert!(matches!(err, BalanceError::Network(_)));
        assert_eq!(client.transport.calls.get(), 1);
    }

    #[test]
    fn test_rpc_error_object() {
        let transport = MockTransport::replying(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param" }
        }));
        let client = BalanceClient::with_transport(transport, Commitment::Confirmed);

        let err = client.get_balance(ADDRESS).unwrap_err();
        assert!(matches!(
            err,
            BalanceError::Network(NetworkError::Rpc { code: -32602, .. })
        ));
    }

    #[test]
    fn test_malformed_result() {
        for body in [
            json!({ "result": { "value": "lots" } }),
            json!({ "result": { "context": { "slot": 1 } } }),
            json!({ "result": { "value": -5 } }),
            json!({ "jsonrpc": "2.0", "id": 1 }),
            json!("ok"),
        ] {
            let client =
                BalanceClient::with_transport(MockTransport::replying(body), Commitment::Confirmed);
            let err = client.get_balance(ADDRESS).unwrap_err();
            assert!(matches!(err, BalanceError::Network(NetworkError::Malformed(_))));
        }
    }

    #[test]
    fn test_large_balance_keeps_exact_lamports() {
        let transport = MockTransport::replying(json!({ "result": { "value": u64::MAX } }));
        let client = BalanceClient::with_transport(transport, Commitment::Confirmed);

        let reading = client.get_balance(ADDRESS).unwrap();
        assert_eq!(reading.lamports, u64::MAX);
        assert!(reading.sol > 1.8e10);
    }

    #[test]
    fn test_default_config() {
        let config = RpcConfig::default();
        assert_eq!(config.endpoint, "https://api.devnet.solana.com");
        assert_eq!(config.commitment, Commitment::Confirmed);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
