/// Configuration loading: TOML file, environment overrides, validation

pub mod settings;

pub use settings::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_mainnet_uniswap_v2() {
        let config = Config::default();
        assert_eq!(config.chain.chain_id, 1);
        assert_eq!(
            config.chain.factory_address.to_string(),
            "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f"
        );
        assert_eq!(
            config.chain.reference_asset_address.to_string(),
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
        );
        assert_eq!(config.analysis.min_ranges, 2);
        assert_eq!(config.classification.mode, ClassificationMode::PoolAddress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[chain]
chain_id = 56
dexscreener_chain = "bsc"

[analysis]
min_ranges = 3

[classification]
mode = "receipt_logs"
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.chain.chain_id, 56);
        assert_eq!(config.chain.dexscreener_chain, "bsc");
        assert_eq!(config.analysis.min_ranges, 3);
        assert_eq!(config.analysis.default_decimals, 18);
        assert_eq!(config.upstream.page_size, 100);
        assert_eq!(config.classification.mode, ClassificationMode::ReceiptLogs);
    }

    #[test]
    fn test_bad_factory_address_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chain]\nfactory_address = \"0x123\"").unwrap();
        let result = Config::load_from_file(file.path().to_str().unwrap());
        assert!(matches!(result, Err(crate::core::TrackerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = Config::default();
        config.analysis.min_ranges = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upstream.explorer_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_from_cli_string() {
        assert_eq!("pool".parse::<ClassificationMode>().unwrap(), ClassificationMode::PoolAddress);
        assert_eq!("LOGS".parse::<ClassificationMode>().unwrap(), ClassificationMode::ReceiptLogs);
        assert!("router".parse::<ClassificationMode>().is_err());
    }
}
