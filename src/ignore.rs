//! Ignore rules shared by the local scan and the live watcher.

/// Default patterns for files that never take part in sync.
pub fn default_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/.DS_Store".to_string(),
        "**/*.swp".to_string(),
        "**/*.swx".to_string(),
        "**/*.tmp".to_string(),
        "**/*~".to_string(),
        "**/codesync.toml".to_string(),
    ]
}

/// Glob-style path filter (`**` for any directory depth, `*` within a name).
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.replace('\\', "/"))
                .collect(),
        }
    }

    /// Match a relative, `/`-separated path.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let path = format!("/{}", rel_path.replace('\\', "/"));
        self.patterns
            .iter()
            .any(|pattern| matches_pattern(&path, pattern))
    }
}

fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(rest) = pattern.strip_prefix("**") {
        // `**/.git/**` → any path containing `/.git/`
        if let Some(middle) = rest.strip_suffix("**") {
            return path.contains(middle) || path.ends_with(middle.trim_end_matches('/'));
        }
        // `**/*.swp` → last segment matches `*.swp`
        if let Some(name_pattern) = rest.strip_prefix('/') {
            let name = path.rsplit('/').next().unwrap_or_default();
            return matches_name(name, name_pattern);
        }
        return path.ends_with(rest);
    }
    let path = path.trim_start_matches('/');
    path == pattern || path.starts_with(&format!("{}/", pattern.trim_end_matches('/')))
}

/// Single-segment match with at most one `*`.
fn matches_name(name: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => name == pattern,
    }
}
