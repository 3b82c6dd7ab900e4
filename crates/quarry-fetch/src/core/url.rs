/// Prepends a proxy prefix to `url`. The prefix is used verbatim.
pub fn apply_prefix(prefix: Option<&str>, url: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}{url}"),
        _ => url.to_string(),
    }
}
