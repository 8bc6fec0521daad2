use crate::artifact::Artifact;
use crate::error::{AppError, AppResult};
use crate::patcher::call_site::apply_call_edit;
use crate::patcher::insertion::insert_definition;
use crate::patcher::report::{PatchReport, PatchStatus, StageOutcome};
use crate::patcher::span::resolve_span;
use crate::recipe::CompiledRecipe;
use std::path::Path;

/// Switches supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// When false the run does nothing and reports [`PatchStatus::Disabled`].
    pub enabled: bool,
    /// Compute the report without persisting.
    pub dry_run: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: false,
        }
    }
}

/// Runs the in-memory pipeline: guard, anchor, insertion, span, call edit.
///
/// Fails hard only when the anchor cannot be found. A missing target function
/// fails the call stage alone; the inserted definition is kept.
pub fn apply_recipe(buffer: &str, recipe: &CompiledRecipe) -> AppResult<(String, PatchReport)> {
    // 1. Definition
    let (current, definition, hit) = insert_definition(
        buffer,
        &recipe.definition_marker,
        &recipe.anchor,
        &recipe.insertion_block,
    )?;

    // 2. Call site, scoped to the target body of the updated buffer
    let (current, call) = match resolve_span(
        &current,
        &recipe.target_function.definition,
        &recipe.target_function.siblings,
    ) {
        Ok(span) => apply_call_edit(&current, span, &recipe.call_edit),
        Err(e @ AppError::TargetFunctionNotFound(_)) => {
            tracing::warn!(error = %e, "call injection skipped");
            (current, StageOutcome::Failed(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    let changed = current != buffer;
    let status = PatchReport::aggregate(&definition, &call, changed);

    Ok((
        current,
        PatchReport {
            path: None,
            definition,
            anchor_tier: hit.map(|h| h.tier_name),
            call,
            changed,
            written: false,
            status,
        },
    ))
}

/// Loads the artifact, applies the recipe and writes the result back.
///
/// The file is written once, at the end, and only if the buffer changed. An
/// error return means nothing was written.
pub fn run(path: &Path, recipe: &CompiledRecipe, options: PatchOptions) -> AppResult<PatchReport> {
    if !options.enabled {
        tracing::info!(recipe = %recipe.name, "patch disabled, nothing to do");
        return Ok(PatchReport::disabled(Some(path.to_path_buf())));
    }

    let artifact = Artifact::load(path)?;
    let (patched, mut report) = apply_recipe(artifact.content(), recipe)?;
    report.path = Some(artifact.path().to_path_buf());

    if report.changed && !options.dry_run {
        artifact.persist(&patched)?;
        report.written = true;
    }

    match &report.status {
        PatchStatus::Failed { kind, message } => {
            tracing::error!(kind = %kind, message = %message, "patch failed")
        }
        status => tracing::info!(status = %status, written = report.written, "patch finished"),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Recipe;
    use pretty_assertions::assert_eq;

    const PROXY: &str = r#"from typing import List


@router.get("/health")
def health():
    return {"status": "ok"}


@router.get(
    "/model/info",
    tags=["model management"],
)
async def model_info_v1(
    request: Request,
):
    all_models = await get_models()
    return {"data": all_models}


def model_group_info():
    return {"data": all_models}
"#;

    fn recipe() -> CompiledRecipe {
        Recipe::model_info_filter().compile().unwrap()
    }

    #[test]
    fn test_apply_recipe_full_flow() {
        let (out, report) = apply_recipe(PROXY, &recipe()).unwrap();

        assert_eq!(report.definition, StageOutcome::Applied);
        assert_eq!(report.anchor_tier, Some("pattern"));
        assert_eq!(report.call, StageOutcome::Applied);
        assert_eq!(report.status, PatchStatus::Applied);

        let def_pos = out.find("def _filter_gemini_duplicates(").unwrap();
        let route_pos = out.find("@router.get(\n    \"/model/info\"").unwrap();
        assert!(def_pos < route_pos);
        assert!(out.contains("    return filtered_models\n\n\n@router.get(\n    \"/model/info\""));
        assert!(out.contains(
            "    all_models = await get_models()\n    # Filter out duplicate Gemini models\n    all_models = _filter_gemini_duplicates(all_models)\n\n    return {\"data\": all_models}\n"
        ));
        // The sibling with the same return shape is untouched.
        assert!(out.ends_with("def model_group_info():\n    return {\"data\": all_models}\n"));
    }

    #[test]
    fn test_apply_recipe_is_idempotent() {
        let (once, _) = apply_recipe(PROXY, &recipe()).unwrap();
        let (twice, report) = apply_recipe(&once, &recipe()).unwrap();
        assert_eq!(twice, once);
        assert_eq!(report.definition, StageOutcome::AlreadyPresent);
        assert_eq!(report.call, StageOutcome::AlreadyPresent);
        assert_eq!(report.status, PatchStatus::AlreadyApplied);
        assert!(!report.changed);
    }

    #[test]
    fn test_partial_buffer_converges() {
        // Call present, definition missing.
        let (full, _) = apply_recipe(PROXY, &recipe()).unwrap();
        let start = full.find("def _filter_gemini_duplicates(").unwrap();
        let end = full.find("@router.get(\n    \"/model/info\"").unwrap();
        let mut partial = full.clone();
        partial.replace_range(start..end, "");

        let (healed, report) = apply_recipe(&partial, &recipe()).unwrap();
        assert_eq!(report.definition, StageOutcome::Applied);
        assert_eq!(report.call, StageOutcome::AlreadyPresent);
        assert_eq!(healed, full);
    }

    #[test]
    fn test_definition_present_call_absent_converges() {
        let (full, _) = apply_recipe(PROXY, &recipe()).unwrap();
        let partial = full.replace(
            "    # Filter out duplicate Gemini models\n    all_models = _filter_gemini_duplicates(all_models)\n\n    return",
            "    return",
        );
        assert_ne!(partial, full);

        let (healed, report) = apply_recipe(&partial, &recipe()).unwrap();
        assert_eq!(report.definition, StageOutcome::AlreadyPresent);
        assert_eq!(report.call, StageOutcome::Applied);
        assert_eq!(report.status, PatchStatus::Applied);
        assert_eq!(healed, full);
    }

    #[test]
    fn test_following_class_method_is_out_of_reach() {
        let buf = r#"@router.get("/model/info")
async def model_info_v1():
    return JSONResponse(all_models)


class Other:
    def f(self):
        return {"data": all_models}
"#;
        let (out, report) = apply_recipe(buf, &recipe()).unwrap();
        assert_eq!(
            report.call,
            StageOutcome::ReturnPatternNotFound { loose_match: false }
        );
        assert!(out.ends_with("class Other:\n    def f(self):\n        return {\"data\": all_models}\n"));
        assert!(!out.contains("all_models = _filter_gemini_duplicates(all_models)"));
    }

    #[test]
    fn test_stacked_decorators_stay_together() {
        let buf = r#"import os


@router.get(
    "/v1/model/info",
)
@router.get("/model/info")
async def model_info_v1():
    return {"data": all_models}
"#;
        let (out, report) = apply_recipe(buf, &recipe()).unwrap();
        assert_eq!(report.status, PatchStatus::Applied);
        let def_pos = out.find("def _filter_gemini_duplicates(").unwrap();
        let v1_pos = out.find("\"/v1/model/info\"").unwrap();
        assert!(def_pos < v1_pos);
        assert!(out.contains(
            "@router.get(\n    \"/v1/model/info\",\n)\n@router.get(\"/model/info\")\nasync def model_info_v1():"
        ));
    }

    #[test]
    fn test_missing_return_is_partial() {
        let buf = PROXY.replace(
            "    return {\"data\": all_models}\n\n\ndef model_group_info",
            "    return JSONResponse(all_models)\n\n\ndef model_group_info",
        );
        let (out, report) = apply_recipe(&buf, &recipe()).unwrap();
        assert_eq!(report.definition, StageOutcome::Applied);
        assert_eq!(
            report.call,
            StageOutcome::ReturnPatternNotFound { loose_match: false }
        );
        assert_eq!(report.status, PatchStatus::Partial);
        assert!(report.changed);
        assert!(out.ends_with("def model_group_info():\n    return {\"data\": all_models}\n"));
    }

    #[test]
    fn test_anchor_failure_is_fatal() {
        let err = apply_recipe("def unrelated():\n    pass\n", &recipe()).unwrap_err();
        assert!(matches!(err, AppError::AnchorNotFound { .. }));
    }

    #[test]
    fn test_missing_target_with_definition_present() {
        let buf = "def _filter_gemini_duplicates(all_models):\n    return all_models\n";
        let (out, report) = apply_recipe(buf, &recipe()).unwrap();
        assert_eq!(out, buf);
        assert!(matches!(report.call, StageOutcome::Failed(_)));
        assert!(matches!(
            report.status,
            PatchStatus::Failed { ref kind, .. } if kind == "TargetFunctionNotFound"
        ));
    }
}
