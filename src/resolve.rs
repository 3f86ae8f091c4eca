use std::env;
use std::path::PathBuf;

/// Expand environment references in a configured path and trim whitespace.
///
/// Supports `%VAR%`, `$VAR`, `${VAR}` and a leading `~`. References to
/// variables that are not set are left in place unchanged, so a path written
/// for another machine degrades to "not found" instead of silently pointing
/// somewhere else.
pub fn expand_env(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let expanded = expand_percent_vars(trimmed);
    let expanded = expand_dollar_vars(&expanded);
    expand_home(&expanded)
}

/// Expand a raw configured path and test it against the filesystem.
///
/// Returns the expanded path only if it denotes an existing directory.
/// Empty or whitespace-only input never resolves.
pub fn resolve_dir(raw: &str) -> Option<PathBuf> {
    let expanded = expand_env(raw);
    if expanded.is_empty() {
        return None;
    }

    let path = PathBuf::from(expanded);
    if path.is_dir() {
        Some(path)
    } else {
        None
    }
}

/// First resolving path: primary first, then alternates in list order.
pub fn resolve_with_alternates(primary: &str, alternates: &[String]) -> Option<PathBuf> {
    resolve_dir(primary).or_else(|| alternates.iter().find_map(|alt| resolve_dir(alt)))
}

fn expand_percent_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match env::var(name) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn expand_dollar_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    let name = &braced[..end];
                    match env::var(name) {
                        Ok(value) => out.push_str(&value),
                        Err(_) => {
                            out.push_str("${");
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &braced[end + 1..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
            continue;
        }

        let name_len = after
            .char_indices()
            .take_while(|(_, ch)| ch.is_ascii_alphanumeric() || *ch == '_')
            .map(|(i, ch)| i + ch.len_utf8())
            .last()
            .unwrap_or(0);

        if name_len == 0 {
            out.push('$');
            rest = after;
        } else {
            let name = &after[..name_len];
            match env::var(name) {
                Ok(value) => out.push_str(&value),
                Err(_) => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }
    }

    out.push_str(rest);
    out
}

fn expand_home(input: &str) -> String {
    if input != "~" && !input.starts_with("~/") && !input.starts_with("~\\") {
        return input.to_string();
    }

    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE"));
    match home {
        Ok(home) if !home.is_empty() => format!("{home}{}", &input[1..]),
        _ => input.to_string(),
    }
}
