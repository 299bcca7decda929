/// Turn a title into a URL-safe slug.
///
/// Lowercases, drops everything but ASCII alphanumerics, `_` and `-`, collapses
/// whitespace and hyphen runs into one `-` and trims leading/trailing `-`/`_`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
