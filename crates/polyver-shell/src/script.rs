use std::fmt::Write as _;
use std::path::PathBuf;

use polyver_backend::{LanguageConfig, VersionRecord};

const PATH_SUFFIX: &str = "/bin:$PATH";

/// Backslash-escape the characters that keep a meaning inside double quotes,
/// so the install path is exported verbatim and never expanded.
#[must_use]
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Script body activating `record`.
///
/// With a home variable:
///
/// ```text
/// export JAVA_HOME="/path/to/jdk"
/// export PATH="$JAVA_HOME/bin:$PATH"
/// ```
///
/// Without one, a single `export PATH="/path/to/node/bin:$PATH"` line. The
/// install path is escaped with [`escape_double_quoted`].
#[must_use]
pub fn render_script(language: &LanguageConfig, record: &VersionRecord) -> String {
    let install_path = escape_double_quoted(&record.install_path.to_string_lossy());
    let mut script = String::new();

    if let Some(var) = language.env_var() {
        let _ = writeln!(script, "export {var}=\"{install_path}\"");
        let _ = writeln!(script, "export PATH=\"${var}/bin:$PATH\"");
    } else {
        let _ = writeln!(script, "export PATH=\"{install_path}{PATH_SUFFIX}\"");
    }

    script
}

/// Install path recorded in a previously generated script.
///
/// Looks for `export <VAR>=` (double-quoted, single-quoted or bare) when the
/// language has a home variable, then for a literal `export PATH="<path>/bin:$PATH"`.
/// Values that expand a variable or a command are not install paths.
#[must_use]
pub fn parse_active_path(content: &str, language: &LanguageConfig) -> Option<PathBuf> {
    if let Some(var) = language.env_var()
        && let Some(path) = content
            .lines()
            .find_map(|line| export_value(line, var))
            .and_then(decode_word)
    {
        return Some(PathBuf::from(path));
    }

    content
        .lines()
        .filter_map(|line| export_value(line, "PATH"))
        .find_map(literal_path_prefix)
        .map(PathBuf::from)
}

/// The raw right-hand side of `export <name>=<value>`.
fn export_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let assignment = line.trim().strip_prefix("export")?;
    if !assignment.starts_with(char::is_whitespace) {
        return None;
    }
    let value = assignment
        .trim_start()
        .strip_prefix(name)?
        .strip_prefix('=')?
        .trim();
    (!value.is_empty()).then_some(value)
}

/// `<path>` from a `<path>/bin:$PATH` value, keeping the value's quoting.
fn literal_path_prefix(value: &str) -> Option<String> {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            let prefix = inner.strip_suffix(PATH_SUFFIX)?;
            return decode_word(&format!("{quote}{prefix}{quote}"));
        }
    }
    decode_word(value.strip_suffix(PATH_SUFFIX)?)
}

/// The literal text of one shell word. `None` for anything that would expand
/// (`$`, backticks) or is not a single well-formed word.
fn decode_word(word: &str) -> Option<String> {
    let decoded = if let Some(inner) = word
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        decode_double_quoted(inner)?
    } else if let Some(inner) = word
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        if inner.contains('\'') {
            return None;
        }
        inner.to_string()
    } else {
        if word.contains(|ch: char| {
            ch.is_whitespace() || matches!(ch, '"' | '\'' | '$' | '`' | '\\' | ';' | '&' | '|')
        }) {
            return None;
        }
        word.to_string()
    };

    (!decoded.is_empty()).then_some(decoded)
}

fn decode_double_quoted(inner: &str) -> Option<String> {
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let next = chars.next()?;
                if !matches!(next, '\\' | '"' | '$' | '`') {
                    decoded.push('\\');
                }
                decoded.push(next);
            }
            '"' | '$' | '`' => return None,
            other => decoded.push(other),
        }
    }
    Some(decoded)
}
