#![deny(missing_docs)]

//! # Patch Recipes
//!
//! A recipe describes one anchor/insertion pair: what to insert, where, and which
//! return statement to rewrite so the inserted function gets called. Recipes are
//! plain data (YAML or JSON on disk) and are compiled once per run.

use crate::error::{AppError, AppResult};
use crate::patcher::anchor::{Anchor, AnchorTier};
use crate::patcher::call_site::CallEdit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One anchor strategy as written in a recipe file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorTierSpec {
    /// Regex whose first match start is the insertion point.
    Pattern {
        /// Regex source. Add `(?s)` to match across lines.
        regex: String,
    },
    /// Literal definition plus the decorator line above it.
    DecoratedDefinition {
        /// Definition keyword sequence.
        definition: String,
        /// Decorator prefix.
        decorator: String,
    },
}

/// Identifies the function whose body receives the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFunction {
    /// Definition keyword sequence, e.g. `async def model_info_v1(`.
    pub definition: String,
    /// Keyword sequences that open the next top-level definition.
    #[serde(default = "default_siblings")]
    pub siblings: Vec<String>,
}

fn default_siblings() -> Vec<String> {
    vec![
        "\nasync def ".to_string(),
        "\ndef ".to_string(),
        "\nclass ".to_string(),
    ]
}

/// Serializable description of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Human-readable name.
    pub name: String,
    /// Presence anywhere in the buffer means the definition is in place.
    pub definition_marker: String,
    /// The function definition to insert.
    pub insertion_block: String,
    /// Anchor tiers, narrowest first.
    pub anchor: Vec<AnchorTierSpec>,
    /// Function whose return gets rewritten.
    pub target_function: TargetFunction,
    /// Regex for the return statement inside the target function.
    pub return_pattern: String,
    /// Presence inside the target function means the call is in place.
    pub call_marker: String,
    /// Replacement for the matched return statement.
    pub replacement: String,
    /// Fragments used to diagnose a return in an unexpected shape.
    #[serde(default)]
    pub loose_return_hints: Vec<String>,
}

/// A validated recipe with compiled patterns.
#[derive(Debug, Clone)]
pub struct CompiledRecipe {
    /// Recipe name.
    pub name: String,
    /// See [`Recipe::definition_marker`].
    pub definition_marker: String,
    /// See [`Recipe::insertion_block`].
    pub insertion_block: String,
    /// Compiled anchor tiers.
    pub anchor: Anchor,
    /// See [`Recipe::target_function`].
    pub target_function: TargetFunction,
    /// Compiled call-site edit.
    pub call_edit: CallEdit,
}

const FILTER_FUNCTION: &str = r#"def _filter_gemini_duplicates(all_models: List[dict]) -> List[dict]:
    """
    Filter out duplicate Gemini models that have:
    - deployment_id: null
    - db_model: null
    - Model names: gemini-pro-2.5, gemini-flash-2.5

    These are automatically created duplicates that interfere with load balancing.
    """
    models_to_filter = ["gemini-pro-2.5", "gemini-flash-2.5"]
    filtered_models = []
    filtered_count = 0

    for model in all_models:
        model_name = model.get("model_name", "")
        deployment_id = model.get("deployment_id")
        db_model = model.get("db_model")

        if (
            model_name in models_to_filter
            and deployment_id is None
            and db_model is None
        ):
            filtered_count += 1
            continue

        filtered_models.append(model)

    if filtered_count > 0:
        verbose_proxy_logger.info(
            f"Filtered {filtered_count} duplicate Gemini models from /model/info"
        )

    return filtered_models
"#;

const FILTER_CALL: &str = "all_models = _filter_gemini_duplicates(all_models)";

impl Recipe {
    /// Built-in recipe: drop duplicate Gemini entries from the `/model/info` handler.
    pub fn model_info_filter() -> Self {
        Self {
            name: "model-info-gemini-filter".to_string(),
            definition_marker: "def _filter_gemini_duplicates(".to_string(),
            insertion_block: FILTER_FUNCTION.to_string(),
            anchor: vec![
                AnchorTierSpec::Pattern {
                    regex: r#"(?s)@router\.get\(\s*"/model/info".*?\)\s*async def model_info_v1\("#
                        .to_string(),
                },
                AnchorTierSpec::DecoratedDefinition {
                    definition: "async def model_info_v1(".to_string(),
                    decorator: "@router.get".to_string(),
                },
            ],
            target_function: TargetFunction {
                definition: "async def model_info_v1(".to_string(),
                siblings: default_siblings(),
            },
            return_pattern: r#"return\s+\{\s*"data"\s*:\s*all_models\s*\}"#.to_string(),
            call_marker: FILTER_CALL.to_string(),
            replacement: format!(
                "# Filter out duplicate Gemini models\n{}\n\nreturn {{\"data\": all_models}}",
                FILTER_CALL
            ),
            loose_return_hints: vec![
                "return {".to_string(),
                "\"data\"".to_string(),
                "all_models".to_string(),
            ],
        }
    }

    /// Parses a recipe from YAML (JSON documents are accepted too).
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content).map_err(|e| AppError::Recipe(format!("Invalid recipe: {}", e)))
    }

    /// Reads and parses a recipe file.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Recipe(format!("Failed to read recipe {:?}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    /// Serializes the recipe as YAML.
    pub fn to_yaml(&self) -> AppResult<String> {
        serde_yaml::to_string(self).map_err(|e| AppError::Recipe(e.to_string()))
    }

    /// Serializes the recipe as pretty JSON.
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AppError::Recipe(e.to_string()))
    }

    /// Validates the recipe and compiles its patterns.
    ///
    /// Rejects recipes that could not converge: the insertion block must carry
    /// the definition marker, and the replacement must carry the call marker
    /// and still match the return pattern.
    pub fn compile(&self) -> AppResult<CompiledRecipe> {
        require(&self.definition_marker, "definition_marker")?;
        require(&self.call_marker, "call_marker")?;
        require(&self.target_function.definition, "target_function.definition")?;

        if self.anchor.is_empty() {
            return Err(AppError::Recipe("anchor needs at least one tier".into()));
        }
        if !self.insertion_block.contains(&self.definition_marker) {
            return Err(AppError::Recipe(
                "insertion_block must contain definition_marker".into(),
            ));
        }
        // Replacement lines after the first get re-indented, so a multi-line
        // marker would not survive verbatim.
        if self.call_marker.contains('\n') {
            return Err(AppError::Recipe("call_marker must be a single line".into()));
        }
        if !self.replacement.contains(&self.call_marker) {
            return Err(AppError::Recipe("replacement must contain call_marker".into()));
        }

        let return_pattern = Regex::new(&self.return_pattern)?;
        if !return_pattern.is_match(&self.replacement) {
            return Err(AppError::Recipe(
                "replacement must still match return_pattern".into(),
            ));
        }

        let tiers = self
            .anchor
            .iter()
            .map(|spec| -> AppResult<AnchorTier> {
                Ok(match spec {
                    AnchorTierSpec::Pattern { regex } => AnchorTier::Pattern(Regex::new(regex)?),
                    AnchorTierSpec::DecoratedDefinition {
                        definition,
                        decorator,
                    } => {
                        require(definition, "anchor.definition")?;
                        require(decorator, "anchor.decorator")?;
                        AnchorTier::DecoratedDefinition {
                            definition: definition.clone(),
                            decorator: decorator.clone(),
                        }
                    }
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CompiledRecipe {
            name: self.name.clone(),
            definition_marker: self.definition_marker.clone(),
            insertion_block: self.insertion_block.clone(),
            anchor: Anchor::new(tiers),
            target_function: self.target_function.clone(),
            call_edit: CallEdit {
                return_pattern,
                call_marker: self.call_marker.clone(),
                replacement: self.replacement.clone(),
                loose_hints: self.loose_return_hints.clone(),
            },
        })
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::model_info_filter()
    }
}

fn require(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Recipe(format!("'{}' must not be empty", field)));
    }
    Ok(())
}
