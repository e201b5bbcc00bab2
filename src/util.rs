use std::sync::LazyLock;
use regex::Regex;

static TOOL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+@-]*$").expect("tool name pattern is valid")
});

/// Normalizes a single tool name.
///
/// The name is trimmed. Empty names yield `None`. Names that look like
/// accidental flag fragments (`-p`, `--force`) or that contain path
/// separators or whitespace are rejected with a warning, since they would
/// never map to a single file in the bin directory.
pub fn tool_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        return None;
    }
    if !TOOL_NAME.is_match(name) {
        log::warn!("Ignoring invalid tool name '{}'", name);
        return None;
    }
    Some(name.to_string())
}

/// Splits command-line arguments into tool names.
///
/// Every argument may itself be a comma separated list, so
/// `["kubectl,helm", "k9s"]` yields `kubectl`, `helm`, `k9s`.
/// Invalid names are dropped and repeated names keep their first position.
pub fn parse_tool_names<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for arg in args {
        for part in arg.as_ref().split(',') {
            if let Some(name) = tool_name(part) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}
