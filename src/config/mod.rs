pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::toml_config::LayoutConfig;
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_file_extension, validate_path, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    const DATA_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "abp-street-check")]
    #[command(about = "Flag whether input address lines appear in the address base for their postcode")]
    pub struct CliConfig {
        /// Input addresses (Postcode, Address_Line_1..5)
        pub input_path: String,

        /// Address base extract (POSTCODE, STREET_NAME, SINGLE_LINE_ADDRESS)
        pub reference_path: String,

        #[arg(short, long = "output", default_value = "example_output_data.csv")]
        pub output_path: String,

        /// TOML file overriding column names and read/write options
        #[arg(short, long)]
        pub config: Option<String>,

        /// Write a JSON run summary to this path
        #[arg(long)]
        pub summary: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines on stderr")]
        pub log_json: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,

        #[arg(skip)]
        #[serde(default)]
        pub layout: LayoutConfig,
    }

    impl CliConfig {
        /// Loads the layout file named by `--config`, if any. `--summary` wins over `output.summary`.
        pub fn resolve(mut self) -> Result<Self> {
            if let Some(path) = &self.config {
                validate_path("config", path)?;
                tracing::debug!("Loading layout from: {}", path);
                self.layout = LayoutConfig::from_file(path)?;
            }
            if self.summary.is_none() {
                self.summary = self.layout.output.summary.clone();
            }
            Ok(self)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("input_path", &self.input_path)?;
            validate_file_extension("input_path", &self.input_path, DATA_EXTENSIONS)?;
            validate_path("reference_path", &self.reference_path)?;
            validate_file_extension("reference_path", &self.reference_path, DATA_EXTENSIONS)?;
            validate_path("output_path", &self.output_path)?;
            if let Some(summary) = &self.summary {
                validate_path("summary", summary)?;
            }
            self.layout.validate()
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn reference_path(&self) -> &str {
            &self.reference_path
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn summary_path(&self) -> Option<&str> {
            self.summary.as_deref()
        }

        fn layout(&self) -> &LayoutConfig {
            &self.layout
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::io::Write;
        use tempfile::NamedTempFile;

        #[test]
        fn test_two_positional_paths() {
            let config = CliConfig::try_parse_from(["abp-street-check", "input.csv", "abp.csv"])
                .unwrap()
                .resolve()
                .unwrap();

            assert_eq!(config.input_path, "input.csv");
            assert_eq!(config.reference_path, "abp.csv");
            assert_eq!(config.output_path, "example_output_data.csv");
            assert!(config.summary_path().is_none());
            assert_eq!(config.layout, LayoutConfig::default());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_missing_reference_path_is_rejected() {
            assert!(CliConfig::try_parse_from(["abp-street-check", "input.csv"]).is_err());
        }

        #[test]
        fn test_unsupported_extension_fails_validation() {
            let config =
                CliConfig::try_parse_from(["abp-street-check", "input.xlsx", "abp.csv"]).unwrap();
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_layout_file_and_summary_override() {
            let mut layout_file = NamedTempFile::new().unwrap();
            layout_file
                .write_all(b"[output]\nflag_column = \"Flag\"\nsummary = \"from_layout.json\"\n")
                .unwrap();
            let layout_path = layout_file.path().to_str().unwrap().to_string();

            let config = CliConfig::try_parse_from([
                "abp-street-check",
                "input.csv",
                "abp.csv",
                "--config",
                layout_path.as_str(),
            ])
            .unwrap()
            .resolve()
            .unwrap();
            assert_eq!(config.layout.output.flag_column, "Flag");
            assert_eq!(config.summary_path(), Some("from_layout.json"));

            let config = CliConfig::try_parse_from([
                "abp-street-check",
                "input.csv",
                "abp.csv",
                "--config",
                layout_path.as_str(),
                "--summary",
                "from_cli.json",
            ])
            .unwrap()
            .resolve()
            .unwrap();
            assert_eq!(config.summary_path(), Some("from_cli.json"));
        }

        #[test]
        fn test_unreadable_layout_file_exits_as_io_failure() {
            let dir = tempfile::tempdir().unwrap();
            let missing = dir.path().join("missing.toml");

            let err = CliConfig::try_parse_from([
                "abp-street-check",
                "input.csv",
                "abp.csv",
                "--config",
                missing.to_str().unwrap(),
            ])
            .unwrap()
            .resolve()
            .unwrap_err();

            assert!(matches!(err, crate::utils::error::EtlError::IoError(_)));
            assert_eq!(err.exit_code(), 2);
        }
    }
}
