use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::{error, info, warn};

use ferret::algo::parse_time_ranges;
use ferret::config::{ClassificationMode, Config};
use ferret::core::{BlockTag, TrackerError};
use ferret::ingest::EtherscanClient;
use ferret::util::display;
use ferret::util::init_tracing;
use ferret::WalletAnalyzer;

fn cli() -> Command {
    Command::new("ferret")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds wallets that traded an ERC-20 token across several time windows")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("CONTRACT_ADDRESS"),
        )
        .arg(
            Arg::new("ranges")
                .short('r')
                .long("ranges")
                .value_name("EXPR")
                .help("Time ranges, e.g. '1w to 6d/3d to 2d'"),
        )
        .arg(
            Arg::new("min-ranges")
                .short('m')
                .long("min-ranges")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("pool|logs")
                .help("Classify by pool address or by receipt swap logs"),
        )
        .arg(
            Arg::new("balances")
                .long("balances")
                .action(ArgAction::SetTrue)
                .help("Look up the current token balance of each qualifying wallet"),
        )
        .arg(
            Arg::new("balances-at")
                .long("balances-at")
                .value_name("BLOCK")
                .value_parser(value_parser!(u64))
                .help("Look up balances at this block number instead of the latest"),
        )
}

/// Block for the balance lookup, `None` when no balances were requested
fn balance_block(matches: &ArgMatches) -> Option<BlockTag> {
    match matches.get_one::<u64>("balances-at") {
        Some(&block) => Some(BlockTag::Number(block)),
        None if matches.get_flag("balances") => Some(BlockTag::Latest),
        None => None,
    }
}

/// Empty results and transient upstream failures are reported, not propagated
fn ends_cleanly(error: &TrackerError) -> bool {
    error.is_recoverable() || matches!(error, TrackerError::EmptyResult(_))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::load(matches.get_one::<String>("config").map(String::as_str))?;
    if let Some(mode) = matches.get_one::<String>("mode") {
        config.classification.mode = mode.parse::<ClassificationMode>()?;
    }
    if let Some(&min_ranges) = matches.get_one::<usize>("min-ranges") {
        config.analysis.min_ranges = min_ranges;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_tracing("logs")?;
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    info!("🦦 ferret - ERC-20 wallet correlation");

    let token = match matches.get_one::<String>("token") {
        Some(token) => token.clone(),
        None => display::prompt("Enter token contract address: ")?,
    };
    let range_input = match matches.get_one::<String>("ranges") {
        Some(ranges) => ranges.clone(),
        None => {
            display::print_format_help();
            display::prompt("\nEnter time ranges: ")?
        }
    };

    let ranges = parse_time_ranges(&range_input)?;
    display::print_ranges(&ranges);
    println!("\nFetching and analyzing transactions...");

    let explorer = EtherscanClient::new(&config)?;
    let analyzer = WalletAnalyzer::new(explorer, &config);

    let report = match analyzer.analyze(&token, &ranges, config.analysis.min_ranges).await {
        Ok(report) => report,
        Err(e) if ends_cleanly(&e) => {
            if e.is_recoverable() {
                warn!("⚠️ Analysis stopped: {}", e);
            }
            display::print_failure(&e);
            return Ok(());
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            display::print_failure(&e);
            return Err(e.into());
        }
    };

    display::print_report(&report);

    if let Some(block) = balance_block(&matches).filter(|_| report.correlation.has_active_wallets()) {
        let balances = analyzer.fetch_balances(&report, block).await;
        let decimals = report.token_decimals.unwrap_or(config.analysis.default_decimals);
        display::print_balances(&balances, decimals, block);
    }

    Ok(())
}
