use anyhow::Result;
use tracing::{info, warn};

use ferret::algo::classify_all;
use ferret::config::Config;
use ferret::core::{Address, PairInfo};
use ferret::ingest::{EtherscanClient, ExplorerApi, PoolResolver};
use ferret::util::{display, init_tracing, DexScreenerClient};

/// Factory lookup first, then the pair the price feed reported
async fn resolve_pool(
    resolver: &PoolResolver,
    explorer: &EtherscanClient,
    token: &Address,
    pair: Option<&PairInfo>,
) -> Option<Address> {
    if let Some(pool) = resolver.resolve_pool_address(explorer, token).await {
        return Some(pool);
    }
    let fallback = pair.and_then(|p| p.pair_address.parse::<Address>().ok());
    if let Some(pool) = &fallback {
        info!("Using DexScreener pair {} as pool", pool);
    }
    fallback
}

async fn scan_token(
    config: &Config,
    explorer: &EtherscanClient,
    dexscreener: &DexScreenerClient,
    resolver: &PoolResolver,
    input: &str,
) {
    let token: Address = match input.parse() {
        Ok(token) => token,
        Err(e) => {
            display::print_failure(&e);
            return;
        }
    };

    println!("\nFetching data...");
    let token_str = token.to_string();
    let (pair_result, transfers_result) = tokio::join!(
        dexscreener.fetch_pair_info(&config.chain.dexscreener_chain, &token_str),
        explorer.fetch_token_transfers(&token)
    );

    let pair = match pair_result {
        Ok(pair) => pair,
        Err(e) => {
            warn!("⚠️ Price info unavailable: {}", e);
            None
        }
    };
    if let Some(info) = &pair {
        display::print_pair_info(info);
    }

    let batch = match transfers_result {
        Ok(batch) => batch,
        Err(e) => {
            display::print_failure(&e);
            return;
        }
    };

    let pool = resolve_pool(resolver, explorer, &token, pair.as_ref()).await;
    if pool.is_none() {
        println!("\nNo liquidity pool found; showing all transfers");
    }
    display::print_transaction_table(&classify_all(&batch.transfers, pool.as_ref()));
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_tracing("logs")?;
    let config = Config::load(std::env::args().nth(1).as_deref())?;

    let explorer = EtherscanClient::new(&config)?;
    let dexscreener = DexScreenerClient::new(&config)?;
    let resolver = PoolResolver::from_chain(&config.chain);

    loop {
        let input = display::prompt("\nEnter token contract address: ")?;
        scan_token(&config, &explorer, &dexscreener, &resolver, &input).await;

        let again = display::prompt("\nWould you like to check another token? (y/n): ")?;
        if !again.eq_ignore_ascii_case("y") {
            break;
        }
    }
    Ok(())
}
