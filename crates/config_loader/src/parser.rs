//! 配置解析模块
//!
//! 支持 TOML、JSON 与 YAML 格式。解析结果先落到通用的 JSON 树上，
//! 以便在反序列化为 `PipelineConfig` 之前应用命令行覆盖项。

use contracts::{ContractError, PipelineConfig};
use serde_json::Value;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式
    Toml,
    /// JSON 格式
    Json,
    /// YAML 格式
    Yaml,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// 解析为通用配置树
pub fn parse_tree(content: &str, format: ConfigFormat) -> Result<Value, ContractError> {
    let tree: Value = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("TOML parse error: {e}"),
            source: Some(Box::new(e)),
        })?,
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            })?
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("YAML parse error: {e}"),
                source: Some(Box::new(e)),
            })?
        }
    };

    if !tree.is_object() {
        return Err(ContractError::config_parse(
            "configuration root must be a table",
        ));
    }
    Ok(tree)
}

/// 将配置树转换为强类型配置
pub fn into_config(tree: Value) -> Result<PipelineConfig, ContractError> {
    serde_json::from_value(tree).map_err(|e| ContractError::ConfigParse {
        message: format!("invalid configuration: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_tree() {
        let tree = parse_tree("[main]\nsteps = \"all\"\n", ConfigFormat::Toml).unwrap();
        assert_eq!(tree["main"]["steps"], "all");
    }

    #[test]
    fn test_parse_yaml_tree() {
        let content = "main:\n  steps: download,basic_cleaning\netl:\n  min_price: 10\n";
        let tree = parse_tree(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(tree["main"]["steps"], "download,basic_cleaning");
        assert_eq!(tree["etl"]["min_price"], 10);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_tree("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_root_must_be_table() {
        let err = parse_tree("[1, 2]", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("must be a table"), "got: {err}");
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let tree = serde_json::json!({ "main": { "project_name": "p" } });
        let err = into_config(tree).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing field"), "got: {err}");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("JSON"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }
}
