use clap::Parser;
use site_pulse::config::toml_config::DEFAULT_USER_AGENT;
use site_pulse::utils::{logger, validation::validate_url};
use site_pulse::{HttpProber, MonitorStatus, Prober};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "site-pulse-probe")]
#[command(about = "Check a URL once the same way the pinger does")]
struct Args {
    /// URL to check
    url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// User-Agent header sent with the request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose, Some("warn"));

    if let Err(e) = validate_url("url", &args.url) {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    let prober = HttpProber::new(Duration::from_secs(args.timeout), &args.user_agent)?;
    let status = prober.probe(&args.url).await;

    println!("{} {}", args.url, status);
    if status != MonitorStatus::Up {
        std::process::exit(1);
    }
    Ok(())
}
