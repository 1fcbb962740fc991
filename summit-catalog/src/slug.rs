/// Turns a display name into a URL slug: lower-case ASCII letters, digits and
/// single dashes, e.g. `"Gunung Rinjani"` -> `"gunung-rinjani"`.
///
/// Characters outside `[a-z0-9_\s-]` are dropped (not replaced), runs of
/// whitespace and dashes collapse to one dash, and leading/trailing dashes and
/// underscores are trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_names() {
        assert_eq!(slugify("Gunung Rinjani"), "gunung-rinjani");
        assert_eq!(slugify("Jalur Senaru"), "jalur-senaru");
        assert_eq!(slugify("Paket Hemat 2H1M"), "paket-hemat-2h1m");
        assert_eq!(slugify("  Sembalun -- Via  Danau! "), "sembalun-via-danau");
        assert_eq!(slugify("Semeru (3676 mdpl)"), "semeru-3676-mdpl");
    }
}
