//! Method-body inspection
//!
//! A lightweight static check over a source artifact: locate a named
//! method's definition, take its brace-delimited body and confirm that a set
//! of call tokens appears in it. Textual only; there is no parsing.

use std::path::Path;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of inspecting one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum Inspection {
    /// Every required token is called in the body
    Passed,
    /// The body exists but these tokens are never called
    MissingTokens(Vec<String>),
    /// No definition of the method was found
    DefinitionNotFound,
    /// The artifact could not be read
    ArtifactUnreadable(String),
}

impl Inspection {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl std::fmt::Display for Inspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => f.write_str("all required calls present"),
            Self::MissingTokens(tokens) => write!(f, "missing calls: {}", tokens.join(", ")),
            Self::DefinitionNotFound => f.write_str("method definition not found"),
            Self::ArtifactUnreadable(reason) => write!(f, "artifact unreadable: {reason}"),
        }
    }
}

/// Checks method bodies for required call tokens.
#[derive(Debug, Clone)]
pub struct Inspector {
    tokens: Vec<String>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(["execute"])
    }
}

impl Inspector {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Inspect `method` in the file at `path`.
    #[must_use]
    pub fn inspect_file(&self, path: &Path, method: &str) -> Inspection {
        match std::fs::read_to_string(path) {
            Ok(source) => self.inspect_source(&source, method),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read artifact");
                Inspection::ArtifactUnreadable(format!("{}: {e}", path.display()))
            }
        }
    }

    /// Inspect `method` in already loaded source text.
    #[must_use]
    pub fn inspect_source(&self, source: &str, method: &str) -> Inspection {
        let Some(body) = extract_body(source, method) else {
            tracing::warn!(method, "no definition found");
            return Inspection::DefinitionNotFound;
        };

        let missing: Vec<String> = self
            .tokens
            .iter()
            .filter(|token| !calls(body, token))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Inspection::Passed;
        }
        for token in &missing {
            tracing::warn!(method, token = %token, "required call not found in body");
        }
        Inspection::MissingTokens(missing)
    }
}

/// True only when every token is called in the body of `method`.
#[must_use]
pub fn check_implementation(path: &Path, method: &str, tokens: &[&str]) -> bool {
    Inspector::new(tokens.iter().copied())
        .inspect_file(path, method)
        .passed()
}

/// Body of the first definition of `method`, without the outer braces.
///
/// A definition is the name, a parenthesized parameter list and an opening
/// brace with no `;` or `{` in between, where the name is introduced by a
/// declaration (`fn`, a return type or modifier, or the start of a
/// statement). Call sites such as `self.name(..)` or `if (name()) {` are
/// skipped. The body runs to the matching closing brace, or to the end of
/// the text if it is never closed.
#[must_use]
pub fn extract_body<'s>(source: &'s str, method: &str) -> Option<&'s str> {
    let pattern = format!(r"\b{}\s*\([^)]*\)[^{{;]*\{{", regex::escape(method));
    let definition = Regex::new(&pattern).ok()?;

    let mut from = 0;
    let open = loop {
        let candidate = definition.find_at(source, from)?;
        if is_declared(&source[..candidate.start()]) {
            break candidate;
        }
        // Step past the name's first char so a later definition inside the
        // rejected match is still found.
        from = candidate.start() + source[candidate.start()..].chars().next()?.len_utf8();
    };
    let rest = &source[open.end()..];

    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..i]);
                }
            }
            _ => {}
        }
    }
    Some(rest)
}

/// Words that put a following `name(..)` in expression position.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "if", "else", "while", "for", "match", "in", "new", "await", "throw", "yield", "case",
];

/// Whether the text before a candidate name makes it a declaration.
fn is_declared(prefix: &str) -> bool {
    let prefix = prefix.trim_end();
    if prefix.ends_with("=>") || prefix.ends_with("->") {
        return false;
    }
    match prefix.chars().next_back() {
        None | Some('{' | '}' | ';' | '>' | ']' | '*') => true,
        Some(c) if c.is_alphanumeric() || c == '_' => {
            let word_start = prefix
                .char_indices()
                .rev()
                .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
                .map_or(0, |(i, c)| i + c.len_utf8());
            !EXPRESSION_KEYWORDS.contains(&&prefix[word_start..])
        }
        Some(_) => false,
    }
}

fn calls(body: &str, token: &str) -> bool {
    let pattern = format!(r"\b{}\s*\(", regex::escape(token));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(body))
}
