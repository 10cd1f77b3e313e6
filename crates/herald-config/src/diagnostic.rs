// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config errors as miette diagnostics, phrased in terms of `herald.toml`.
//!
//! Herald's file nests one table per channel under `[cascade]` and
//! `[providers]`, plus an `[[identities]]` array. Diagnostics name the full
//! key path (`cascade.voice_call.max_attempts`, `identities[1].channel`),
//! report a misspelled channel table as an unknown channel rather than an
//! unknown key, and point at the offending line when the source is known.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use herald_core::Channel;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Sections keyed by channel name.
const CHANNEL_TABLES: &[&str] = &["cascade", "providers"];

/// A problem with Herald's configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(herald::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path of the table holding the key.
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A `[cascade.*]` or `[providers.*]` table, or an identity's `channel`,
    /// names something that is not a channel.
    #[error("`{name}` is not a channel (in {section})")]
    #[diagnostic(
        code(herald::config::unknown_channel),
        help("{}", unknown_channel_help(section, suggestion.as_deref()))
    )]
    UnknownChannel {
        section: String,
        name: String,
        suggestion: Option<String>,
        #[label("unknown channel")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(herald::config::invalid_type), help("{}", type_help(key, expected)))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing key `{key}` in {section}")]
    #[diagnostic(code(herald::config::missing_key), help("{}", missing_key_help(section, key)))]
    MissingKey { section: String, key: String },

    /// A value that parsed but breaks a rule the processor relies on.
    #[error("`{key}` {message}")]
    #[diagnostic(code(herald::config::validation))]
    Validation {
        key: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(herald::config::other))]
    Other(String),
}

impl ConfigError {
    /// A validation failure on `key`, with a hint at its env override when
    /// one exists.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        let key = key.into();
        let help = env_override(&key).map(|var| format!("set it in herald.toml or with {var}"));
        Self::Validation {
            key,
            message: message.into(),
            help,
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid}"),
        None => format!("valid keys: {valid}"),
    }
}

fn unknown_channel_help(section: &str, suggestion: Option<&str>) -> String {
    let channels = channel_names().join(", ");
    let hint = match suggestion {
        Some(s) => format!("did you mean `{s}`? "),
        None => String::new(),
    };
    if section.starts_with("identities") {
        format!("{hint}`channel` must be one of: {channels}")
    } else {
        format!("{hint}[{section}.<channel>] tables exist for: {channels}")
    }
}

fn type_help(key: &str, expected: &str) -> String {
    if key.ends_with("retry_delays_secs") {
        "a list of waits in seconds, e.g. `retry_delays_secs = [300, 900, 1800]`".to_string()
    } else if key.ends_with("_secs") {
        "a whole number of seconds".to_string()
    } else {
        format!("expected {expected}")
    }
}

fn missing_key_help(section: &str, key: &str) -> String {
    if section.starts_with("identities") {
        "every [[identities]] entry needs owner_id, channel and sender_id".to_string()
    } else {
        format!("add `{key} = <value>` under [{section}]")
    }
}

/// `HERALD_*` variable that overrides `key`, if the loader maps one.
///
/// Identities come from files only.
pub fn env_override(key: &str) -> Option<String> {
    if key.starts_with("identities") || key.contains('[') {
        return None;
    }
    Some(format!("HERALD_{}", key.replace('.', "_").to_uppercase()))
}

fn channel_names() -> Vec<String> {
    Channel::ALL.iter().map(ToString::to_string).collect()
}

/// Render a figment path, showing array positions as `[n]`.
///
/// `["identities", "1", "channel"]` becomes `identities[1].channel`; an empty
/// path is the top level of the file.
pub fn display_path(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if segment.parse::<usize>().is_ok() {
            out.push_str(&format!("[{segment}]"));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        "the top level".to_string()
    } else {
        out
    }
}

/// Convert a `figment::Error` (which may hold several) into diagnostics.
///
/// `sources` pairs each TOML file's display path with its contents, for
/// source spans.
pub fn from_figment(err: figment::Error, sources: &[(String, String)]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, sources))
        .collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let path = &error.path;
    let source = source_for(error, sources);

    match &error.kind {
        Kind::UnknownField(field, _) if is_channel_table(path) => {
            let section = display_path(path);
            let (span, src) = locate(source, |content| {
                find_table_name(content, &format!("{section}.{field}"), field)
            });
            ConfigError::UnknownChannel {
                suggestion: suggest_key(field, &channel_names()),
                section,
                name: field.clone(),
                span,
                src,
            }
        }
        Kind::UnknownField(field, expected) => {
            let valid_keys: Vec<String> = expected.iter().map(ToString::to_string).collect();
            let (span, src) = locate(source, |content| find_key_offset(content, path, field));
            ConfigError::UnknownKey {
                section: display_path(path),
                key: field.clone(),
                suggestion: suggest_key(field, &valid_keys),
                valid_keys,
                span,
                src,
            }
        }
        Kind::UnknownVariant(value, expected) if names_channels(expected) => {
            let (span, src) = locate(source, |content| find_quoted_value(content, value));
            ConfigError::UnknownChannel {
                section: display_path(path),
                name: value.clone(),
                suggestion: suggest_key(value, &channel_names()),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            section: display_path(path),
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => {
            let (span, src) = match path.split_last() {
                Some((field, section)) => {
                    locate(source, |content| find_key_offset(content, section, field))
                }
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: display_path(path),
                found: actual.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

fn is_channel_table(path: &[String]) -> bool {
    path.len() == 1 && CHANNEL_TABLES.contains(&path[0].as_str())
}

fn names_channels(expected: &[&str]) -> bool {
    channel_names()
        .iter()
        .all(|name| expected.iter().any(|e| e == name))
}

/// The TOML file an error came from. Inline sources have no file path, so a
/// lone source is used as is.
fn source_for<'a>(
    error: &figment::Error,
    sources: &'a [(String, String)],
) -> Option<&'a (String, String)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    match file {
        Some(path) => sources.iter().find(|(p, _)| *p == path),
        None if sources.len() == 1 => sources.first(),
        None => None,
    }
}

fn locate(
    source: Option<&(String, String)>,
    find: impl FnOnce(&str) -> Option<(usize, usize)>,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((path, content)) = source else {
        return (None, None);
    };
    match find(content) {
        Some((offset, len)) => (
            Some(SourceSpan::new(offset.into(), len)),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of the header opening the table at `path`.
///
/// Array positions select the n-th `[[name]]` block, so
/// `["identities", "1"]` finds the second `[[identities]]`.
fn find_table_start(content: &str, path: &[String]) -> Option<usize> {
    if path.is_empty() {
        return Some(0);
    }
    let (header, nth) = match path.split_last() {
        Some((last, parent)) if last.parse::<usize>().is_ok() => {
            (format!("[[{}]]", parent.join(".")), last.parse::<usize>().ok()?)
        }
        _ => (format!("[{}]", path.join(".")), 0),
    };
    let mut seen = 0;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim() == header {
            if seen == nth {
                return Some(offset + line.len());
            }
            seen += 1;
        }
        offset += line.len();
    }
    None
}

/// Offset and length of `field` as a key in the table at `path`.
///
/// The search stops at the next table header, so a key of the same name in
/// a later table is not reported.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<(usize, usize)> {
    let start = find_table_start(content, path)?;
    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            break;
        }
        if let Some(rest) = trimmed.strip_prefix(field) {
            if rest.trim_start().starts_with('=') {
                return Some((offset + line.len() - trimmed.len(), field.len()));
            }
        }
        offset += line.len();
    }
    None
}

/// Offset of `name` inside the `[table]` header, e.g. `sms` in `[cascade.sms]`.
fn find_table_name(content: &str, table: &str, name: &str) -> Option<(usize, usize)> {
    let header = format!("[{table}]");
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.trim_end() == header {
            let header_start = offset + line.len() - trimmed.len();
            return Some((header_start + header.len() - 1 - name.len(), name.len()));
        }
        offset += line.len();
    }
    None
}

fn find_quoted_value(content: &str, value: &str) -> Option<(usize, usize)> {
    content
        .find(&format!("\"{value}\""))
        .map(|pos| (pos + 1, value.len()))
}

/// Closest valid key above the similarity threshold.
pub fn suggest_key(unknown: &str, valid: &[String]) -> Option<String> {
    valid
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.clone())
}

/// Print every error to stderr, one rendered report each.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    let noun = if errors.len() == 1 { "problem" } else { "problems" };
    eprintln!("herald: {} configuration {noun}", errors.len());
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error as &dyn Diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn path(list: &[&str]) -> Vec<String> {
        keys(list)
    }

    #[test]
    fn suggests_policy_key_for_typo() {
        let valid = keys(&["max_attempts", "escalation_delay_secs", "retry_delays_secs"]);
        assert_eq!(suggest_key("max_atempts", &valid).as_deref(), Some("max_attempts"));
        assert_eq!(suggest_key("zzzzzz", &valid), None);
    }

    #[test]
    fn suggests_channel_name() {
        assert_eq!(
            suggest_key("voice", &channel_names()).as_deref(),
            Some("voice_call")
        );
    }

    #[test]
    fn paths_show_array_positions() {
        assert_eq!(display_path(&path(&["identities", "1", "channel"])), "identities[1].channel");
        assert_eq!(display_path(&path(&["cascade", "voice_call"])), "cascade.voice_call");
        assert_eq!(display_path(&[]), "the top level");
    }

    #[test]
    fn env_override_names_match_loader() {
        assert_eq!(
            env_override("processor.batch_size").as_deref(),
            Some("HERALD_PROCESSOR_BATCH_SIZE")
        );
        assert_eq!(
            env_override("cascade.voice_call.max_attempts").as_deref(),
            Some("HERALD_CASCADE_VOICE_CALL_MAX_ATTEMPTS")
        );
        assert_eq!(env_override("identities[0].sender_id"), None);
    }

    #[test]
    fn key_found_in_its_own_channel_table() {
        let content = "[cascade.rich_message]\nmax_atempts = 3\n\n[cascade.voice_call]\nmax_atempts = 2\n";
        let (o, len) = find_key_offset(content, &path(&["cascade", "voice_call"]), "max_atempts")
            .expect("key should be found");
        assert_eq!(&content[o..o + len], "max_atempts");
        assert!(o > content.find("[cascade.voice_call]").unwrap());
    }

    #[test]
    fn key_search_stops_at_next_table() {
        let content = "[processor]\nbatch_size = 1\n[storage]\nwal_mode = true\n";
        assert_eq!(find_key_offset(content, &path(&["processor"]), "wal_mode"), None);
    }

    #[test]
    fn key_found_in_nth_identity() {
        let content = "[[identities]]\nowner_id = \"a\"\n\n[[identities]]\nowner_id = \"b\"\nsendr_id = \"+1\"\n";
        let (o, _) = find_key_offset(content, &path(&["identities", "1"]), "sendr_id").unwrap();
        assert_eq!(&content[o..o + 8], "sendr_id");
        assert_eq!(find_key_offset(content, &path(&["identities", "0"]), "sendr_id"), None);
    }

    #[test]
    fn channel_name_located_in_table_header() {
        let content = "[processor]\nbatch_size = 1\n\n[cascade.sms]\nmax_attempts = 1\n";
        let (o, len) = find_table_name(content, "cascade.sms", "sms").unwrap();
        assert_eq!(&content[o..o + len], "sms");
    }

    #[test]
    fn validation_help_points_at_env_var() {
        let err = ConfigError::invalid("processor.concurrency", "must be at least 1");
        assert_eq!(err.to_string(), "`processor.concurrency` must be at least 1");
        let help = Diagnostic::help(&err).map(|h| h.to_string());
        assert_eq!(
            help.as_deref(),
            Some("set it in herald.toml or with HERALD_PROCESSOR_CONCURRENCY")
        );
    }

    #[test]
    fn missing_identity_key_lists_required_fields() {
        let help = missing_key_help("identities[0]", "sender_id");
        assert!(help.contains("[[identities]]"));
        assert_eq!(
            missing_key_help("server", "port"),
            "add `port = <value>` under [server]"
        );
    }
}
