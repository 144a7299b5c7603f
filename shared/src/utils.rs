use ulid::Ulid;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn generate_ulid() -> String {
    Ulid::new().to_string()
}

/// Strips diacritics by NFD-decomposing and dropping combining marks
/// ("Introdução" becomes "Introducao").
pub fn fold_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Lowercase URL-safe slug: diacritics folded, whitespace/separator runs
/// collapsed to single hyphens, everything else dropped.
pub fn slugify(input: &str) -> String {
    let folded = fold_diacritics(input).to_lowercase();
    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;

    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid_format() {
        let ulid = generate_ulid();
        assert_eq!(ulid.len(), 26);
        assert_ne!(ulid, generate_ulid());
    }

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("Introdução à Programação"), "Introducao a Programacao");
        assert_eq!(fold_diacritics("café"), "cafe");
        assert_eq!(fold_diacritics("plain"), "plain");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Datavis Studio II"), "datavis-studio-ii");
    }

    #[test]
    fn test_slugify_accents_and_runs() {
        assert_eq!(slugify("Introdução à Programação"), "introducao-a-programacao");
        assert_eq!(slugify("  Design   de Software  "), "design-de-software");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("C/C++ (avançado)!"), "cc-avancado");
    }
}
