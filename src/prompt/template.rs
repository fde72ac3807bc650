//! Placeholder engine for prompt and file templates.
//!
//! Performs `{variable}` substitution and nothing else. There are no
//! conditionals, loops, filters or expressions, so every rendered prompt can
//! be audited by reading the template next to its context map.
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of variable `name`
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`
//!
//! # Error Handling
//!
//! Rendering is all-or-nothing: an undefined variable fails the whole render
//! instead of substituting an empty string, and the caller never sees a
//! partially substituted result.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Error type for template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template is empty or contains only whitespace.
    EmptyTemplate,
    /// A named template was requested that is not registered.
    UnknownTemplate {
        /// The requested template name.
        name: String,
    },
    /// A variable was referenced but not provided.
    UndefinedVariable {
        /// The name of the undefined variable.
        name: String,
        /// The byte offset in the template where the variable was found.
        position: usize,
    },
    /// A `{` was found without a matching `}`.
    UnmatchedBrace {
        /// The position of the unmatched `{`.
        position: usize,
    },
    /// An empty variable name was found (e.g., `{}`).
    EmptyVariableName {
        /// The position of the empty variable.
        position: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::EmptyTemplate => write!(f, "template is empty"),
            TemplateError::UnknownTemplate { name } => {
                write!(f, "no prompt template named '{}'", name)
            }
            TemplateError::UndefinedVariable { name, position } => {
                write!(
                    f,
                    "undefined variable '{}' at position {} in template",
                    name, position
                )
            }
            TemplateError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {} in template", position)
            }
            TemplateError::EmptyVariableName { position } => {
                write!(
                    f,
                    "empty variable name '{{}}' at position {} in template",
                    position
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// A lexical piece of a template.
#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(char),
    Variable { name: &'a str, position: usize },
}

/// Split a template into literal characters and variable references.
fn tokenize(template: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    tokens.push(Token::Literal('{'));
                    continue;
                }

                let name_start = pos + 1;
                let mut name_end = None;
                for (inner_pos, inner) in chars.by_ref() {
                    if inner == '}' {
                        name_end = Some(inner_pos);
                        break;
                    }
                }

                let Some(name_end) = name_end else {
                    return Err(TemplateError::UnmatchedBrace { position: pos });
                };

                let name = template[name_start..name_end].trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyVariableName { position: pos });
                }

                tokens.push(Token::Variable {
                    name,
                    position: pos,
                });
            }
            '}' => {
                // `}}` is an escape; a lone `}` is a regular character.
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                }
                tokens.push(Token::Literal('}'));
            }
            _ => tokens.push(Token::Literal(ch)),
        }
    }

    Ok(tokens)
}

/// Render a template string by substituting variables.
///
/// # Arguments
///
/// * `template` - The template string containing `{variable}` placeholders
/// * `variables` - A map of variable names to their values
///
/// # Returns
///
/// * `Ok(String)` - The rendered string with all variables substituted
/// * `Err(TemplateError)` - If the template is empty, a variable is undefined,
///   or the syntax is invalid
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    if template.trim().is_empty() {
        return Err(TemplateError::EmptyTemplate);
    }

    let tokens = tokenize(template)?;

    // Resolve everything before building output so a failure never leaks
    // a half-rendered prompt.
    let mut result = String::with_capacity(template.len());
    for token in tokens {
        match token {
            Token::Literal(ch) => result.push(ch),
            Token::Variable { name, position } => match variables.get(name) {
                Some(value) => result.push_str(value),
                None => {
                    return Err(TemplateError::UndefinedVariable {
                        name: name.to_string(),
                        position,
                    });
                }
            },
        }
    }

    Ok(result)
}

/// List the distinct variable names a template references, sorted.
pub fn placeholders(template: &str) -> Result<BTreeSet<String>, TemplateError> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|token| match token {
            Token::Variable { name, .. } => Some(name.to_string()),
            Token::Literal(_) => None,
        })
        .collect())
}

/// Helper to create a variables map from a list of key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
