use phf::phf_map;
use unicode_normalization::UnicodeNormalization;

pub const MAX_SLUG_LENGTH: usize = 255;
const EMPTY_SLUG: &str = "untitled";

static ND_CHARMAP: phf::Map<char, &'static str> = phf_map! {
    'Æ' => "AE",
    'æ' => "ae",
    'Ð' => "D",
    'ð' => "d",
    'Ø' => "O",
    'ø' => "o",
    'Þ' => "Th",
    'þ' => "th",
    'ß' => "ss",
    'Đ' => "D",
    'đ' => "d",
    'Ħ' => "H",
    'ħ' => "h",
    'ı' => "i",
    'ĸ' => "k",
    'Ł' => "L",
    'ł' => "l",
    'Ŋ' => "N",
    'ŋ' => "n",
    'Œ' => "Oe",
    'œ' => "oe",
    'Ŧ' => "T",
    'ŧ' => "t",
};

/// Folds text to ASCII, combining marks are dropped, other non-ASCII letters become separators
fn remove_diacritics(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.nfkd() {
        if let Some(mapped) = ND_CHARMAP.get(&c) {
            result.push_str(mapped);
        } else if c.is_ascii() {
            result.push(c);
        } else if c.is_alphabetic() {
            result.push(' ');
        }
    }

    result
}

/// URL friendly identifier derived from title: `Žluťoučký kůň!` -> `zlutoucky-kun`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in remove_diacritics(title).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Variant of slug used when base slug is already taken
pub fn numbered_slug(base: &str, n: u32) -> String {
    let suffix = format!("-{n}");
    let mut slug = base.to_string();
    if slug.len() + suffix.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH - suffix.len());
    }
    slug.push_str(&suffix);
    slug
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn test_remove_diacritics() {
        assert_eq!(remove_diacritics("Æ"), "AE");
        assert_eq!(remove_diacritics("Œuf"), "Oeuf");
        assert_eq!(remove_diacritics("crème brûlée"), "creme brulee");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pierogi ruskie"), "pierogi-ruskie");
        assert_eq!(slugify("  Žluťoučký kůň!  "), "zlutoucky-kun");
        assert_eq!(slugify("Crème Brûlée -- 2nd try"), "creme-brulee-2nd-try");
        assert_eq!(slugify("Gdańsk Łódź"), "gdansk-lodz");
        assert_eq!(slugify("???"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn test_long_slug() {
        let title = "a ".repeat(300);
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));

        let numbered = numbered_slug(&slug, 12);
        assert!(numbered.len() <= MAX_SLUG_LENGTH);
        assert!(numbered.ends_with("-12"));
    }

    #[quickcheck]
    fn test_slug_is_url_safe(title: String) -> bool {
        let slug = slugify(&title);
        !slug.is_empty()
            && slug.len() <= MAX_SLUG_LENGTH
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
            && slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}
