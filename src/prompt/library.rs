//! Built-in prompt templates.
//!
//! Every model-assisted generator and the `tune` operation render one of these
//! through `PromptManager`. A config file can replace any of them under
//! `prompts:`; replacements are checked for syntax at load time.

/// Prompt for the CI workflow (`ci_config`).
pub const CI_WORKFLOW: &str = "\
You are configuring continuous integration for the {language} project \"{project_name}\".
Project description: {description}

Write a GitHub Actions workflow that runs on pushes and pull requests and has one job
per quality gate:
- build: {build_command}
- lint: {lint_command}
- format: {format_check_command}
- test (only if tests are enabled; tests_enabled = {tests_enabled}): {test_command}

Enabled features: {features}

Repository context:
{repository_context}

Respond with the workflow file only.";

/// Prompt for the quality metrics configuration (`metrics_config`).
pub const METRICS_CONFIG: &str = "\
You are defining quality metrics for the {language} project \"{project_name}\".
Project description: {description}

Produce a JSON object with these top-level keys:
- \"project\": the project name
- \"thresholds\": numeric thresholds (test coverage percentage, maximum lint warnings,
  maximum cyclomatic complexity per function)
- \"commands\": the commands that produce each measurement, using {test_command}
  and {lint_command} where relevant

Repository context:
{repository_context}

Respond with the JSON document only.";

/// Prompt for the pre-commit hook script (`pre_commit_hook`).
pub const PRE_COMMIT_HOOK: &str = "\
Write a git pre-commit hook for the {language} project \"{project_name}\".

The hook must run, in order, stopping at the first failure:
1. {format_check_command}
2. {lint_command}

Print a one-line message before each step. Do not run the full test suite.

Respond with the script only.";

/// Prompt for the narrative quality guide (`quality_guide`).
pub const QUALITY_GUIDE: &str = "\
Write a short quality guide for contributors to the {language} project \"{project_name}\".
Project description: {description}

Explain how to build ({build_command}), lint ({lint_command}), check formatting
({format_check_command}) and test ({test_command}) locally, and what the automated
checks enforce. Enabled features: {features}

Artifacts already generated for this project:
{upstream_artifacts}

Repository context:
{repository_context}";

/// Prompt for adapting existing content to a new context (`tune`).
pub const TUNE: &str = "\
Adapt the following content to this target context: {target_context}

Keep the structure and intent of the original. Change only what the target context
requires. Respond with the adapted content only, without commentary.

Content:
{content}";

/// Appended to a prompt when a previous response failed format validation.
pub const VALIDATION_FEEDBACK: &str = "\
A previous response to this request was rejected: {validation_feedback}
Correct the problem in your new response.";

/// Names and bodies of every built-in prompt template.
pub const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("ci_workflow", CI_WORKFLOW),
    ("metrics_config", METRICS_CONFIG),
    ("pre_commit_hook", PRE_COMMIT_HOOK),
    ("quality_guide", QUALITY_GUIDE),
    ("tune", TUNE),
    ("validation_feedback", VALIDATION_FEEDBACK),
];
