//! 命令行覆盖项
//!
//! 形如 `etl.min_price=20` 的覆盖项替换已有键；`+main.artifact_namespace=team/p`
//! 形式用于新增键。值优先按 JSON 解析，失败时视为普通字符串。

use std::str::FromStr;

use contracts::ContractError;
use serde_json::{Map, Value};

/// A single `key=value` override
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    /// Dotted path split into segments
    pub path: Vec<String>,
    pub value: Value,
    /// `+key=value`: the key must not exist yet
    pub append: bool,
}

impl FromStr for Override {
    type Err = ContractError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            ContractError::config_parse(format!("override '{raw}' is not of the form key=value"))
        })?;

        let (append, key) = match key.trim().strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, key.trim()),
        };

        let path: Vec<String> = key.split('.').map(|s| s.trim().to_string()).collect();
        if path.iter().any(String::is_empty) {
            return Err(ContractError::config_parse(format!(
                "override '{raw}' has an empty key segment"
            )));
        }

        Ok(Self {
            path,
            value: parse_value(value),
            append,
        })
    }
}

impl Override {
    pub fn key(&self) -> String {
        self.path.join(".")
    }

    /// Apply to a configuration tree
    pub fn apply(&self, tree: &mut Value) -> Result<(), ContractError> {
        let key = self.key();
        let Some((leaf, parents)) = self.path.split_last() else {
            return Err(ContractError::config_parse("empty override key"));
        };

        let mut node = tree;
        for segment in parents {
            let table = as_table(node, &key)?;
            if !table.contains_key(segment) {
                if !self.append {
                    return Err(missing_key(&key));
                }
                table.insert(segment.clone(), Value::Object(Map::new()));
            }
            node = table
                .get_mut(segment)
                .ok_or_else(|| missing_key(&key))?;
        }

        let table = as_table(node, &key)?;
        match (self.append, table.contains_key(leaf)) {
            (false, false) => return Err(missing_key(&key)),
            (true, true) => {
                return Err(ContractError::config_parse(format!(
                    "cannot append '{key}': key already exists, drop the '+' to override it"
                )))
            }
            _ => {}
        }
        table.insert(leaf.clone(), self.value.clone());
        Ok(())
    }
}

/// Parse and apply a list of raw overrides in order
pub fn apply_all<S: AsRef<str>>(tree: &mut Value, overrides: &[S]) -> Result<(), ContractError> {
    for raw in overrides {
        let parsed: Override = raw.as_ref().parse()?;
        parsed.apply(tree)?;
        tracing::debug!(key = %parsed.key(), value = %parsed.value, "Applied config override");
    }
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn as_table<'a>(node: &'a mut Value, key: &str) -> Result<&'a mut Map<String, Value>, ContractError> {
    node.as_object_mut().ok_or_else(|| {
        ContractError::config_parse(format!("cannot override '{key}': parent is not a table"))
    })
}

fn missing_key(key: &str) -> ContractError {
    ContractError::config_parse(format!(
        "cannot override '{key}': key not found, use '+{key}=...' to add it"
    ))
}
