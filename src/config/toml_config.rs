use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_distinct, validate_non_empty_list, validate_non_empty_string,
    validate_path, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Cell texts read as absent values unless `parsing.na_values` overrides them.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Column names and read/write options for both datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub input: InputColumns,
    pub reference: ReferenceColumns,
    pub output: OutputConfig,
    pub parsing: ParsingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputColumns {
    pub postcode: String,
    pub address_lines: Vec<String>,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            postcode: "Postcode".to_string(),
            address_lines: (1..=5).map(|i| format!("Address_Line_{}", i)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceColumns {
    pub postcode: String,
    pub street_name: String,
    pub full_address: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            postcode: "POSTCODE".to_string(),
            street_name: "STREET_NAME".to_string(),
            full_address: "SINGLE_LINE_ADDRESS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub flag_column: String,
    pub include_index: bool,
    pub summary: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            flag_column: "Street_In_Postcode".to_string(),
            include_index: false,
            summary: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub delimiter: String,
    pub na_values: Option<Vec<String>>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            na_values: None,
        }
    }
}

impl ParsingConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        validate_delimiter("parsing.delimiter", &self.delimiter)
    }

    pub fn na_set(&self) -> HashSet<String> {
        match &self.na_values {
            Some(values) => values.iter().cloned().collect(),
            None => DEFAULT_NA_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl LayoutConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ABP_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("input.postcode", &self.input.postcode)?;
        validate_non_empty_list("input.address_lines", &self.input.address_lines)?;
        for column in &self.input.address_lines {
            validate_non_empty_string("input.address_lines", column)?;
        }
        let mut input_columns = self.input.address_lines.clone();
        input_columns.push(self.input.postcode.clone());
        validate_distinct("input", &input_columns)?;

        validate_non_empty_string("reference.postcode", &self.reference.postcode)?;
        validate_non_empty_string("reference.street_name", &self.reference.street_name)?;
        validate_non_empty_string("reference.full_address", &self.reference.full_address)?;

        validate_non_empty_string("output.flag_column", &self.output.flag_column)?;
        // The flag is written over any input column of the same name
        input_columns.push(self.output.flag_column.clone());
        validate_distinct("output.flag_column", &input_columns)?;
        if let Some(summary) = &self.output.summary {
            validate_path("output.summary", summary)?;
        }

        self.parsing.delimiter_byte()?;
        Ok(())
    }
}

impl Validate for LayoutConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
