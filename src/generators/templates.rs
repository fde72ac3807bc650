//! Static file templates for template-based generators.
//!
//! Rendered with the same `{variable}` engine as prompts, so shell
//! parameter expansions are written `${{NAME}}`. Scripts only reference the
//! shell-quoted `{project_name_sh}`, never the raw project name.

pub const BUILD_SCRIPT: &str = r#"#!/usr/bin/env bash
# Build {project_name_sh}.
set -euo pipefail

cd "$(dirname "${{BASH_SOURCE[0]}}")/.."

echo "==> building" {project_name_sh} "({language})"
{build_command}
"#;

pub const LINT_SCRIPT: &str = r#"#!/usr/bin/env bash
# Lint and format checks for {project_name_sh}.
set -euo pipefail

cd "$(dirname "${{BASH_SOURCE[0]}}")/.."

echo "==> checking formatting"
{format_check_command}

echo "==> linting"
{lint_command}
"#;

pub const TEST_SCRIPT: &str = r#"#!/usr/bin/env bash
# Run the test suite of {project_name_sh}.
set -euo pipefail

cd "$(dirname "${{BASH_SOURCE[0]}}")/.."

echo "==> testing" {project_name_sh}
{test_command} "$@"
"#;

pub const CONTRIBUTING: &str = r#"# Contributing to {project_name}

{description}

## Workflow

1. Open an issue describing the change before starting large work.
2. Create a topic branch from `{default_branch}`.
3. Keep commits focused; describe what changed and why in the message.
4. Run the local checks before opening a pull request:

```sh
{local_checks}
```

5. Open a pull request against `{default_branch}`. Automated checks must pass
   before review.

## Code style

Formatting and lint rules are enforced by `scripts/lint.sh`. Do not disable a
lint without explaining why in the pull request.
"#;

pub const SECURITY: &str = r#"# Security Policy

## Reporting a vulnerability

Please do not report security vulnerabilities in {project_name} through public
issues. Contact {security_contact} instead, with:

- a description of the problem and its impact
- steps to reproduce
- affected versions, if known

You will receive an acknowledgement within five working days.

## Supported versions

Only the latest release of {project_name} receives security fixes.
"#;
