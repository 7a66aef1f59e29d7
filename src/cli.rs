use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::balance::{Commitment, RpcConfig, DEFAULT_RPC_URL};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate key pairs and save them to a JSON file
    Generate(GenerateArgs),
    /// Look up the SOL balance of an address
    Balance(BalanceArgs),
    /// Check that every key pair in a saved accounts file is consistent
    Inspect {
        #[arg(value_name = "FILE", default_value = "accounts.json")]
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Number of accounts to generate
    #[arg(short, long, default_value_t = 10, value_parser = parse_count)]
    pub count: usize,

    /// Output file path
    #[arg(short, long, default_value = "accounts.json")]
    pub output: PathBuf,

    /// Number of parallel threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,
}

#[derive(clap::Args, Debug)]
pub struct BalanceArgs {
    /// Base-58 public key of the account
    pub address: String,

    /// JSON-RPC endpoint
    #[arg(short, long, env = "SOLANA_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub url: String,

    /// Commitment level for the query
    #[arg(short, long, env = "SOLANA_COMMITMENT", value_enum, default_value_t = Commitment::Confirmed)]
    pub commitment: Commitment,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = parse_timeout)]
    pub timeout: u64,
}

impl BalanceArgs {
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            endpoint: self.url.clone(),
            commitment: self.commitment,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn parse_count(s: &str) -> Result<usize, String> {
    let count: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a non-negative integer"))?;
    if count == 0 {
        return Err("count must be at least 1".to_string());
    }
    Ok(count)
}

fn parse_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a whole number of seconds"))?;
    if secs == 0 {
        return Err("timeout must be at least 1 second".to_string());
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let args = Args::try_parse_from(["sol-accounts", "generate"]).unwrap();
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        assert_eq!(generate.count, 10);
        assert_eq!(generate.output, PathBuf::from("accounts.json"));
        assert_eq!(generate.threads, 0);
    }

    #[test]
    fn test_rejects_non_positive_count() {
        for count in ["0", "-3", "ten", "1.5"] {
            let result =
                Args::try_parse_from(["sol-accounts", "generate", "--count", count]);
            assert!(result.is_err(), "accepted {count}");
        }
    }

    #[test]
    fn test_balance_config() {
        let args = Args::try_parse_from([
            "sol-accounts",
            "balance",
            "11111111111111111111111111111111",
            "--url",
            "http://127.0.0.1:8899",
            "--commitment",
            "finalized",
            "--timeout",
            "5",
        ])
        .unwrap();
        let Command::Balance(balance) = args.command else {
            panic!("expected balance");
        };

        let config = balance.rpc_config();
        assert_eq!(config.endpoint, "http://127.0.0.1:8899");
        assert_eq!(config.commitment, Commitment::Finalized);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = Args::try_parse_from([
            "sol-accounts",
            "balance",
            "11111111111111111111111111111111",
            "--timeout",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_balance_requires_address() {
        assert!(Args::try_parse_from(["sol-accounts", "balance"]).is_err());
    }
}
