//! Page name → local file name normalization.

const JS_EXT: &str = ".js";

/// Map a remote page name to a flat, filesystem-safe file name.
///
/// - every `..` is removed (never escape the target directory)
/// - a trailing `.` becomes `.js`
/// - `/` and whitespace become `_` (nested page names stay a single file)
/// - `.js` is appended when no extension is left
pub fn normalize(page_name: &str) -> String {
    let mut name = page_name.replace("..", "");

    if name.ends_with('.') {
        name.pop();
        name.push_str(JS_EXT);
    }

    let mut name: String = name
        .chars()
        .map(|c| if c == '/' || c.is_whitespace() { '_' } else { c })
        .collect();

    if !has_extension(&name) {
        name.push_str(JS_EXT);
    }
    name
}

/// A leading dot marks a hidden file, not an extension.
fn has_extension(name: &str) -> bool {
    matches!(name.rfind('.'), Some(idx) if idx > 0)
}

/// Page id for a remote node: its raw name up to the first `.`.
pub fn page_id_from_raw_name(raw_name: &str) -> String {
    raw_name.split('.').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_dot_becomes_js() {
        assert_eq!(normalize("Home Page."), "Home_Page.js");
        assert_eq!(normalize("index."), "index.js");
    }

    #[test]
    fn test_ellipsis_removed() {
        assert_eq!(normalize("Loading..."), "Loading.js");
        assert_eq!(normalize("../../etc/passwd"), "__etc_passwd.js");
        assert_eq!(normalize("a..b"), "ab.js");
    }

    #[test]
    fn test_slashes_flattened() {
        assert_eq!(normalize("blog/post"), "blog_post.js");
        assert_eq!(normalize("blog/post.css"), "blog_post.css");
    }

    #[test]
    fn test_existing_extension_kept() {
        assert_eq!(normalize("styles.css"), "styles.css");
        assert_eq!(normalize("vendors.js"), "vendors.js");
    }

    #[test]
    fn test_hidden_name_gets_extension() {
        assert_eq!(normalize(".env"), ".env.js");
        assert_eq!(normalize("plain"), "plain.js");
    }

    #[test]
    fn test_page_id_from_raw_name() {
        assert_eq!(page_id_from_raw_name("page123.js"), "page123");
        assert_eq!(page_id_from_raw_name("page123"), "page123");
        assert_eq!(page_id_from_raw_name("a.b.c"), "a");
        assert_eq!(page_id_from_raw_name(""), "");
    }

    proptest! {
        #[test]
        fn prop_never_contains_double_dot(name in ".{0,40}") {
            prop_assert!(!normalize(&name).contains(".."));
        }

        #[test]
        fn prop_never_contains_separator(name in ".{0,40}") {
            prop_assert!(!normalize(&name).contains('/'));
        }

        #[test]
        fn prop_bare_trailing_dot_ends_in_js(stem in "[a-zA-Z0-9 _-]{1,20}") {
            let name = format!("{}.", stem);
            prop_assert!(normalize(&name).ends_with(".js"));
        }

        #[test]
        fn prop_idempotent_on_clean_names(stem in "[a-zA-Z0-9_-]{1,20}", ext in "[a-z]{1,4}") {
            let name = format!("{}.{}", stem, ext);
            let once = normalize(&name);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn prop_deterministic(name in ".{0,40}") {
            prop_assert_eq!(normalize(&name), normalize(&name));
        }
    }
}
