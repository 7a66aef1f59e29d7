pub mod address;
pub mod balance;
pub mod cli;
pub mod error;
pub mod generator;
pub mod wallet;

pub use address::Address;
pub use balance::{get_balance, BalanceClient, BalanceReading, Commitment, RpcConfig};
pub use cli::{Args, Command};
pub use error::{AddressError, BalanceError, GenerateError, NetworkError, RecordError};
pub use generator::{generate_accounts, write_record, Generator};
pub use wallet::{Account, AccountRecord, PlainBytes, SecretKeyEncoder};
