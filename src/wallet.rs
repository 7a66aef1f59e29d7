use std::fs;
use std::path::Path;

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::RecordError;

/// Turns the 64-byte keypair (seed followed by public key) into the bytes
/// stored under `secretKey`.
pub trait SecretKeyEncoder: Send + Sync {
    fn encode(&self, keypair: &[u8; KEYPAIR_LENGTH]) -> Vec<u8>;
}

/// Stores the keypair bytes as-is. No encryption at rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainBytes;

impl SecretKeyEncoder for PlainBytes {
    fn encode(&self, keypair: &[u8; KEYPAIR_LENGTH]) -> Vec<u8> {
        keypair.to_vec()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    #[serde(rename = "publicKey")]
    pub public_key: String,  // base-58
    #[serde(rename = "secretKey")]
    pub secret_key: Vec<u8>,
}

impl Account {
    pub fn new(signing_key: &SigningKey, encoder: &dyn SecretKeyEncoder) -> Self {
        let public_key = Address::from(&signing_key.verifying_key()).to_base58();
        let keypair = signing_key.to_keypair_bytes();

        Self {
            public_key,
            secret_key: encoder.encode(&keypair),
        }
    }

    pub fn address(&self) -> Result<Address, RecordError> {
        Ok(self.public_key.parse()?)
    }

    /// Checks that `secretKey` is a well-formed keypair whose public half is
    /// `publicKey`. Only meaningful for accounts written with [`PlainBytes`].
    pub fn verify(&self) -> Result<(), RecordError> {
        let address = self.address()?;
        let bytes: &[u8; KEYPAIR_LENGTH] = self
            .secret_key
            .as_slice()
            .try_into()
            .map_err(|_| RecordError::SecretKeyLength(self.secret_key.len()))?;

        let signing_key = SigningKey::from_keypair_bytes(bytes)
            .map_err(|_| RecordError::Mismatch(self.public_key.clone()))?;
        if Address::from(&signing_key.verifying_key()) != address {
            return Err(RecordError::Mismatch(self.public_key.clone()));
        }
        Ok(())
    }
}

/// The persisted document: a JSON array of accounts in generation order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccountRecord {
    accounts: Vec<Account>,
}

impl AccountRecord {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Reads a document previously written by the generator.
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = fs::read_to_string(path).map_err(|source| RecordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Verifies every account, stopping at the first bad one.
    pub fn verify(&self) -> Result<(), RecordError> {
        self.accounts.iter().try_for_each(Account::verify)
    }
}
