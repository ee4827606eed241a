use {
    crate::error::{Error, Result},
    alloy_primitives::{Address as EvmAddress, B256, U256, hex},
    alloy_signer::SignerSync,
    reqwest::{
        Client,
        header::{HeaderMap, HeaderName, HeaderValue},
    },
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    serde_json::{Value, json},
    sha2::{Digest, Sha256},
    std::{
        fmt::{Debug, Display},
        str::FromStr,
    },
    tracing::trace,
};

/// Version byte of every mainnet TRON address
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;
pub const TRONGRID_API: &str = "https://api.trongrid.io";
pub const TRON_API_KEY_HEADER: &str = "tron-pro-api-key";

/// A TRON account or contract address: `0x41` followed by the 20 byte
/// account body shared with the EVM representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; 21]);

impl TronAddress {
    /// `T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb`, used by DLN as the TRX token
    /// sentinel
    pub const ZERO: Self = {
        let mut bytes = [0u8; 21];
        bytes[0] = TRON_ADDRESS_PREFIX;
        Self(bytes)
    };

    pub const fn from_evm(address: EvmAddress) -> Self {
        let body = address.0.0;
        let mut bytes = [0u8; 21];
        bytes[0] = TRON_ADDRESS_PREFIX;
        let mut i = 0;
        while i < 20 {
            bytes[i + 1] = body[i];
            i += 1;
        }
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 21 || bytes[0] != TRON_ADDRESS_PREFIX {
            return Err(Error::AddrError(format!(
                "TRON address must be 21 bytes starting with 0x41, got 0x{}",
                hex::encode(bytes)
            )));
        }
        let mut out = [0u8; 21];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; 21] {
        &self.0
    }

    /// The address body without the `0x41` prefix
    pub fn evm_address(&self) -> EvmAddress {
        EvmAddress::from_slice(&self.0[1..])
    }

    /// Hex form used by the full-node API when `visible` is false
    pub fn to_hex41(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for TronAddress {
    type Err = Error;

    /// Accepts base58check (`T...`), `41` prefixed hex, or a `0x` prefixed
    /// 20 byte EVM address as returned by the DLN API.
    fn from_str(s: &str) -> Result<Self> {
        if let Some(stripped) = s.strip_prefix("0x") {
            let address = stripped
                .parse::<EvmAddress>()
                .map_err(|source| Error::InvalidAddress {
                    address: s.to_string(),
                    source,
                })?;
            return Ok(Self::from_evm(address));
        }
        if s.len() == 42 && s.starts_with("41") {
            return Self::from_bytes(&hex::decode(s)?);
        }
        let bytes = bs58::decode(s)
            .with_check(Some(TRON_ADDRESS_PREFIX))
            .into_vec()
            .map_err(|e| Error::AddrError(format!("invalid TRON address {s}: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl Display for TronAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).with_check().into_string())
    }
}

impl Debug for TronAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TronAddress({self})")
    }
}

/// Remove "0x" prefix if present
pub fn clip_hex_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x").unwrap_or(hex)
}

/// Decode the hex encoded messages the TRON node uses for errors. Returns an
/// empty string when the input is missing or not hex.
pub fn hex_to_utf8(hex: Option<&str>) -> String {
    hex.and_then(|h| hex::decode(clip_hex_prefix(h)).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// `ceil(energy_used * energy_price * (100 + buffer_percent) / 100)`
pub fn calc_fee_limit(energy_used: u64, energy_price_sun: u64, buffer_percent: u64) -> u64 {
    let scaled = u128::from(energy_used)
        .saturating_mul(u128::from(energy_price_sun))
        .saturating_mul(u128::from(buffer_percent) + 100);
    u64::try_from(scaled.div_ceil(100)).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TronCallResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub code: Option<String>,
    /// Hex encoded
    #[serde(default)]
    pub message: Option<String>,
}

impl TronCallResult {
    pub fn reason(&self) -> String {
        match self.message.as_deref() {
            Some(m) => hex_to_utf8(Some(m)),
            None => self.code.clone().unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Response of `wallet/triggerconstantcontract`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerConstantResponse {
    #[serde(default)]
    pub result: TronCallResult,
    #[serde(default)]
    pub constant_result: Vec<String>,
    #[serde(default)]
    pub energy_used: Option<u64>,
    #[serde(default)]
    pub energy_penalty: Option<u64>,
}

impl TriggerConstantResponse {
    /// Energy the call would burn, or the decoded revert reason
    pub fn energy(&self) -> Result<u64> {
        if !self.result.result {
            return Err(Error::SimulationFailed {
                reason: self.result.reason(),
            });
        }
        Ok(self.energy_used.unwrap_or_default())
    }

    /// First 32 byte word of the return data
    pub fn word(&self) -> Result<U256> {
        self.energy()?;
        let data = self
            .constant_result
            .first()
            .map(|r| hex::decode(r))
            .transpose()?
            .unwrap_or_default();
        if data.len() < 32 {
            return Err(Error::TronApi(format!(
                "constant call returned {} bytes",
                data.len()
            )));
        }
        Ok(U256::from_be_slice(&data[..32]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TronTransaction {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data: Value,
    pub raw_data_hex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    #[serde(default)]
    pub visible: bool,
}

impl TronTransaction {
    /// The transaction id is `sha256(raw_data)`; refuse to sign anything whose
    /// id does not match the raw bytes we were handed.
    pub fn verified_id(&self) -> Result<B256> {
        let raw = hex::decode(&self.raw_data_hex)?;
        let computed = B256::from_slice(&Sha256::digest(&raw));
        let claimed = hex::decode(&self.tx_id)?;
        if claimed.as_slice() != computed.as_slice() {
            return Err(Error::TronApi(format!(
                "txID {} does not match raw_data_hex ({computed})",
                self.tx_id
            )));
        }
        Ok(computed)
    }

    /// Sign the transaction id with a secp256k1 key, `r || s || v` with
    /// `v = 27 + parity`
    pub fn sign<S: SignerSync + ?Sized>(&mut self, signer: &S) -> Result<()> {
        let id = self.verified_id()?;
        let signature = signer.sign_hash_sync(&id)?;
        self.signature = vec![hex::encode(signature.as_bytes())];
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerSmartContractResponse {
    #[serde(default)]
    pub result: TronCallResult,
    #[serde(default)]
    pub transaction: Option<TronTransaction>,
}

/// Response of `wallet/broadcasttransaction`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastReceipt {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `result: true` only means the node accepted the transaction, execution is
/// not checked here.
pub fn check_broadcast(receipt: &BroadcastReceipt) -> Result<String> {
    if let Some(code) = receipt.code.as_deref().filter(|c| *c != "SUCCESS") {
        return Err(Error::TransactionFailed {
            reason: format!(
                "Transaction failed with code {code}: {}",
                hex_to_utf8(receipt.message.as_deref())
            ),
        });
    }
    if !receipt.result {
        return Err(Error::TransactionFailed {
            reason: "Transaction broadcast failed (result: false)".to_string(),
        });
    }
    receipt.txid.clone().ok_or_else(|| Error::TransactionFailed {
        reason: "broadcast receipt has no txid".to_string(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainParameters {
    #[serde(rename = "chainParameter", default)]
    pub chain_parameter: Vec<ChainParameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainParameter {
    pub key: String,
    #[serde(default)]
    pub value: Option<i64>,
}

impl ChainParameters {
    /// Current energy price in sun
    pub fn energy_fee(&self) -> Result<u64> {
        self.chain_parameter
            .iter()
            .find(|p| p.key == "getEnergyFee")
            .and_then(|p| p.value)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| Error::TronApi("getEnergyFee not found in chain parameters".into()))
    }
}

/// Thin client over the TRON full-node HTTP API. Addresses are always sent in
/// hex (`visible: false`).
#[derive(Clone)]
pub struct TronClient {
    client: Client,
    url: String,
}

impl Debug for TronClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TronClient[{}]", self.url)
    }
}

impl TronClient {
    pub fn new(url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| Error::TronApi(format!("invalid api key header: {e}")))?;
            headers.insert(HeaderName::from_static(TRON_API_KEY_HEADER), value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{path}", self.url);
        trace!(url = ?url, body = %body, "TRON request");
        let response = self.client.post(&url).json(body).send().await?;
        response.error_for_status_ref()?;
        let value: Value = response.json().await?;
        trace!(response = %value);
        if let Some(err) = value.get("Error").and_then(Value::as_str) {
            return Err(Error::TronApi(err.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn chain_parameters(&self) -> Result<ChainParameters> {
        self.post("wallet/getchainparameters", &json!({})).await
    }
}
