use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use solana_account_tools::cli::{BalanceArgs, GenerateArgs};
use solana_account_tools::{AccountRecord, Args, BalanceClient, Command, Generator};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Generate(generate) => run_generate(&generate),
        Command::Balance(balance) => run_balance(&balance),
        Command::Inspect { path } => run_inspect(&path),
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let generator = Generator::new(args.threads);
    info!(
        count = args.count,
        threads = generator.thread_count(),
        output = %args.output.display(),
        "generating accounts"
    );

    let start_time = Instant::now();

    let pb = ProgressBar::new(args.count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")?
            .progress_chars("#>-"),
    );

    let progress = generator.progress();
    let done = Arc::new(AtomicBool::new(false));

    // Progress updater runs until generation returns, success or not
    let result = std::thread::scope(|scope| {
        let pb = pb.clone();
        let done_flag = done.clone();
        scope.spawn(move || {
            let mut last_count = 0;
            let mut last_time = Instant::now();

            while !done_flag.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(100));

                let current_count = progress.load(Ordering::Relaxed);
                pb.set_position(current_count as u64);

                let now = Instant::now();
                let time_diff = now.duration_since(last_time).as_secs_f64();
                if time_diff > 0.5 {
                    let rate = (current_count - last_count) as f64 / time_diff;
                    pb.set_message(format!("{:.0} accounts/sec", rate));
                    last_count = current_count;
                    last_time = now;
                }
            }
        });

        let result = generator.generate_accounts(args.count, &args.output);
        done.store(true, Ordering::Relaxed);
        result
    });

    match result {
        Ok(record) => {
            pb.set_position(record.len() as u64);
            pb.finish_with_message("Generation complete!");
            println!(
                "✅ Successfully generated and saved {} accounts to {} in {:.2}s",
                record.len(),
                args.output.display(),
                start_time.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Generation failed");
            Err(e).context("failed to save accounts")
        }
    }
}

fn run_balance(args: &BalanceArgs) -> Result<()> {
    let config = args.rpc_config();
    info!(endpoint = %config.endpoint, commitment = %config.commitment, "querying balance");

    let client = BalanceClient::new(&config).context("failed to create rpc client")?;
    let reading = client
        .get_balance(&args.address)
        .with_context(|| format!("failed to fetch balance for {}", args.address))?;

    println!(
        "✅ Finished! The balance for the wallet at address {} is {} SOL ({} lamports)!",
        reading.address, reading.sol, reading.lamports
    );
    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let record = AccountRecord::load(path)?;
    record
        .verify()
        .with_context(|| format!("{} contains an invalid key pair", path.display()))?;

    for (i, account) in record.accounts().iter().enumerate() {
        println!("{:>4}  {}", i, account.public_key);
    }
    println!("✅ {} accounts in {} verified", record.len(), path.display());
    Ok(())
}
