//! Step selection
//!
//! 将 `main.steps` 指令解析为按规范顺序排列的阶段列表。

use contracts::{ContractError, Stage, ALL_STEPS};

/// Parse a step-selection directive into the active stage list.
///
/// `"all"` selects [`Stage::DEFAULT`]. Otherwise the directive is a comma-separated
/// list of stage tokens; surrounding whitespace and empty items are ignored.
/// The result always follows canonical order, whatever order the tokens were
/// written in, and never contains duplicates.
///
/// # Errors
/// `UnknownStage` for the first token that names no stage.
pub fn select(directive: &str) -> Result<Vec<Stage>, ContractError> {
    let directive = directive.trim();
    if directive == ALL_STEPS {
        return Ok(Stage::DEFAULT.to_vec());
    }

    let mut requested = Vec::new();
    for token in directive.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        requested.push(token.parse::<Stage>()?);
    }

    // 过滤规范列表，保证顺序与去重
    Ok(Stage::CANONICAL
        .into_iter()
        .filter(|stage| requested.contains(stage))
        .collect())
}
