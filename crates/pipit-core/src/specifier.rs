//! Package argument parsing and installer specifier rendering

use crate::types::{Specifier, ANY};
use crate::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

fn vcs_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Greedy locator, so the last `#egg=` wins
    PATTERN.get_or_init(|| Regex::new(r"^(.+)#egg=([\w-]+)$").expect("valid VCS pattern"))
}

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([\w-]+)(.*)$").expect("valid index pattern"))
}

/// Parse one command-line token into a [`Specifier`].
///
/// Two shapes are recognized, in order:
///
/// 1. `<locator>#egg=<name>`: the locator becomes the constraint
/// 2. `<name><rest>`: leading `=` characters are stripped from `rest`
///
/// # Errors
/// Returns [`Error::MalformedSpecifier`] if neither shape matches.
pub fn parse(token: &str) -> Result<Specifier> {
    if let Some(caps) = vcs_pattern().captures(token) {
        return Ok(Specifier::new(&caps[2], &caps[1]));
    }

    if let Some(caps) = index_pattern().captures(token) {
        let constraint = caps[2].trim_start_matches('=');
        return Ok(Specifier::new(&caps[1], constraint));
    }

    Err(Error::MalformedSpecifier(token.to_string()))
}

/// Render a name and constraint as the installer expects it.
///
/// - [`ANY`] renders as the bare name
/// - a digit-led constraint is an exact pin: `name==1.2`
/// - a letter-led constraint is a VCS locator: `locator#egg=name`
/// - anything else is an operator clause appended to the name
///
/// # Errors
/// Returns [`Error::Unknown`] for an empty constraint; callers reading from
/// the manifest report it as [`Error::ManifestMalformed`].
pub fn render(name: &str, constraint: &str) -> Result<String> {
    if constraint == ANY {
        return Ok(name.to_string());
    }

    let first = constraint
        .chars()
        .next()
        .ok_or_else(|| Error::unknown(format!("empty version constraint for '{name}'")))?;

    let rendered = if first.is_ascii_digit() {
        format!("{name}=={constraint}")
    } else if first.is_alphabetic() {
        format!("{constraint}#egg={name}")
    } else {
        format!("{name}{constraint}")
    };
    Ok(rendered)
}

/// Package arguments of one invocation, parsed once up front.
///
/// Parsing happens before any side effect so a bad argument can never leave
/// the environment or the manifest half-updated.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    /// Tokens exactly as given, forwarded to the installer
    pub raw: Vec<String>,
    /// Parsed specifiers, in argument order
    pub specifiers: Vec<Specifier>,
}

impl ParsedArgs {
    /// Parse every token.
    ///
    /// Duplicate names are kept in order; when the specifiers are applied to
    /// the manifest the last occurrence wins.
    ///
    /// # Errors
    /// Fails on the first token that does not parse.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let raw: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let specifiers = raw.iter().map(|t| parse(t)).collect::<Result<Vec<_>>>()?;
        Ok(Self { raw, specifiers })
    }

    /// Whether no packages were named
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Parsed names, in argument order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specifiers.iter().map(|s| s.name.as_str())
    }
}
