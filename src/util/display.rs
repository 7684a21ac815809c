/// Display utilities for terminal output

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use chrono::{Local, TimeZone};
use colored::Colorize;

use crate::core::{
    Address, BlockTag, ClassifiedTransaction, EmptyReason, PairInfo, TimeRange, TrackerError,
    TxType,
};
use crate::intelligence::AnalysisReport;

const TABLE_WIDTH: usize = 90;

/// Local wall-clock rendering of a Unix timestamp
pub fn format_timestamp(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Print `message` and read one trimmed line from stdin
pub fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn print_format_help() {
    println!("\n{}", "Time format options:".bold());
    println!("1. Absolute time: YYYY-MM-DD HH:MM:SS, YYYY-MM-DD HH:MM, YYYY-MM-DD, MM-DD HH:MM, HH:MM");
    println!("2. Relative time: 1d (1 day ago), 2h (2 hours ago), 30m (30 minutes ago), 1w (1 week ago)");
    println!("3. Time range: <time1> to <time2>");
    println!("4. Multiple ranges: separate with /");
    println!("\n{}", "Examples:".bold());
    println!("- 2d to 1d");
    println!("- 2025-02-28 18:30");
    println!("- 02-28 18:30 to 03-01 18:30");
    println!("- 1w to 6d/3d to 2d/1d to now");
}

pub fn print_ranges(ranges: &[TimeRange]) {
    println!("\n{}", "Analyzing transactions for these time ranges:".bold());
    for (index, range) in ranges.iter().enumerate() {
        println!(
            "Range {}: {} to {}",
            index,
            format_timestamp(range.start),
            format_timestamp(range.end)
        );
    }
}

fn colored_type(tx_type: TxType) -> colored::ColoredString {
    let label = format!("{:<10}", tx_type);
    match tx_type {
        TxType::Buy => label.green(),
        TxType::Sell => label.red(),
        TxType::Transfer => label.normal(),
    }
}

fn format_range_set(ranges: &std::collections::BTreeSet<usize>) -> String {
    let indices: Vec<String> = ranges.iter().map(|i| i.to_string()).collect();
    format!("[{}]", indices.join(", "))
}

/// Qualifying wallets with per-range detail, or the per-range diagnostic when none qualified
pub fn print_report(report: &AnalysisReport) {
    print_warnings(&report.warnings);
    if report.rejected_records > 0 {
        println!(
            "{} {} upstream records failed validation and were skipped",
            "⚠️".yellow(),
            report.rejected_records
        );
    }

    let correlation = &report.correlation;
    if !correlation.has_active_wallets() {
        println!(
            "\n{}",
            format!("No wallets found active in {} or more time ranges.", correlation.min_ranges).yellow()
        );
        println!("\n{}", "Diagnostic information:".bold());
        for diagnostic in correlation.range_diagnostics() {
            println!(
                "Range {} has {} transactions",
                diagnostic.range_index, diagnostic.transactions
            );
            if diagnostic.transactions > 0 {
                println!("Unique wallets in this range: {}", diagnostic.unique_wallets);
            }
        }
        return;
    }

    println!(
        "\n{}",
        format!("Wallets active in {} or more time ranges:", correlation.min_ranges).bold()
    );
    println!("{}", "-".repeat(80));

    for (wallet, ranges) in &correlation.active_wallets {
        println!("\n{} {}", "Wallet:".bold(), wallet.to_string().cyan());
        println!("Active in {} time ranges: {}", ranges.len(), format_range_set(ranges));
        println!("\nDetailed transactions:");
        for &range_index in ranges {
            println!("\nRange {}:", range_index);
            for tx in correlation.transactions_for(wallet, range_index) {
                println!(
                    "Time: {}, Type: {}, Amount: {:.4}",
                    format_timestamp(tx.timestamp),
                    colored_type(tx.tx_type),
                    tx.amount
                );
            }
        }
        println!("{}", "-".repeat(40));
    }
}

pub fn print_balances(balances: &BTreeMap<Address, u128>, decimals: u8, block: BlockTag) {
    if balances.is_empty() {
        return;
    }
    let heading = match block {
        BlockTag::Latest => "Current balances:".to_string(),
        BlockTag::Number(n) => format!("Balances at block {}:", n),
    };
    println!("\n{}", heading.bold());
    for (wallet, raw) in balances {
        println!(
            "   {}  {:.4}",
            wallet,
            crate::core::dex_types::utils::scale_amount(*raw, decimals)
        );
    }
}

pub fn print_warnings(warnings: &[TrackerError]) {
    for warning in warnings {
        println!("\n{} {}", "Warning:".yellow().bold(), warning);
        if let TrackerError::NoPoolResolved { .. } = warning {
            println!("This might be because:");
            println!("1. Token is not listed on Uniswap V2");
            println!("2. Token uses a different DEX");
            println!("3. Token contract address is incorrect");
            println!("Every transfer is shown as TRANSFER to its recipient.");
        }
    }
}

/// User-facing explanation for an analysis that could not produce a report
pub fn print_failure(error: &TrackerError) {
    match error {
        TrackerError::UpstreamUnavailable { .. } => {
            println!("\n{}", "Failed to fetch transactions. Possible reasons:".red());
            println!("1. Invalid contract address");
            println!("2. API rate limit exceeded");
            println!("3. Network connection issue");
            println!("\nTry again in a few minutes or check the contract address");
            println!("({})", error);
        }
        TrackerError::EmptyResult(EmptyReason::NoTransfers) => {
            println!("{}", "No transactions found for this token".yellow());
        }
        TrackerError::EmptyResult(EmptyReason::NoTransactionsInRanges) => {
            println!("\n{}", "No transactions found in the specified time ranges".yellow());
        }
        other => println!("{} {}", "Error:".red().bold(), other),
    }
}

pub fn print_pair_info(info: &PairInfo) {
    println!("\n{} {}", "Token:".bold(), info.base_token_symbol.bold());
    match info.price_usd {
        Some(price) => println!("Current Price: ${:.8}", price),
        None => println!("Current Price: n/a"),
    }
    match info.volume_24h {
        Some(volume) => println!("24h Volume: ${:.2}", volume),
        None => println!("24h Volume: n/a"),
    }
    println!("Pair Address: {} ({})", info.pair_address, info.dex_id);
}

/// One fixed-width row of the transaction history table, uncolored
pub fn format_transaction_row(tx: &ClassifiedTransaction) -> String {
    format!(
        "{:<25}{:<10}{:<20.4}{:<42}",
        format_timestamp(tx.timestamp),
        tx.tx_type,
        tx.amount,
        tx.wallet
    )
}

pub fn print_transaction_table(transactions: &[ClassifiedTransaction]) {
    if transactions.is_empty() {
        println!("No transaction history found");
        return;
    }
    println!("\n{}", "Transaction History:".bold());
    println!("{:<25}{:<10}{:<20}{:<42}", "Time", "Type", "Tokens", "Wallet Address");
    println!("{}", "-".repeat(TABLE_WIDTH));
    for tx in transactions {
        let row = format_transaction_row(tx);
        match tx.tx_type {
            TxType::Buy => println!("{}", row.green()),
            TxType::Sell => println!("{}", row.red()),
            TxType::Transfer => println!("{}", row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_transaction_row_is_fixed_width() {
        let tx = ClassifiedTransaction {
            wallet: "0x00000000000000000000000000000000000000a1".parse().unwrap(),
            tx_type: TxType::Sell,
            timestamp: 1_700_000_000,
            amount: 1234.56789,
            hash: "0x01".to_string(),
        };
        let row = format_transaction_row(&tx);
        assert_eq!(&row[25..35], "SELL      ");
        assert_eq!(&row[35..55], format!("{:<20}", "1234.5679"));
        assert!(row.ends_with("0x00000000000000000000000000000000000000a1"));
    }

    #[test]
    fn test_range_set_is_sorted_list() {
        assert_eq!(format_range_set(&BTreeSet::from([2, 0])), "[0, 2]");
        assert_eq!(format_range_set(&BTreeSet::new()), "[]");
    }

    #[test]
    fn test_timestamp_matches_local_rendering() {
        let expected = Local.timestamp_opt(0, 0).unwrap().format("%Y-%m-%d %H:%M:%S").to_string();
        assert_eq!(format_timestamp(0), expected);
    }
}
