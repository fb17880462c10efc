//! Slug derivation and collision disambiguation.
//!
//! A store's slug is `slugify(name)`. Before persisting, the write path counts
//! existing slugs in the same family (`base`, `base-1`, `base-7`, ...) and, if
//! there are any, appends `-{count + 1}`. Counting is best-effort: two writers
//! racing on the same name can end up with the same slug.

use regex::{Regex, RegexBuilder};

/// Used when a name contains nothing that survives slugification.
pub const FALLBACK_SLUG: &str = "store";

fn fold_char(c: char, out: &mut String) {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ą' => "a",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        '&' => "-and-",
        c if c.is_ascii_alphanumeric() => {
            out.push(c);
            return;
        }
        _ => "-",
    };
    out.push_str(folded);
}

/// Turns a display name into a lower-case, ASCII, dash-separated identifier.
pub fn slugify(name: &str) -> String {
    let mut raw = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        fold_char(c, &mut raw);
    }

    let slug = raw
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The case-insensitive pattern matching `base` and its numbered variants.
///
/// The same pattern is handed to PostgreSQL's `~*` operator, so it sticks to
/// syntax both engines agree on.
pub fn family_pattern(base: &str) -> String {
    format!("^({})((-[0-9]*$)?)$", regex::escape(base))
}

/// Compiled matcher for a slug family, for adapters that filter in memory.
#[derive(Debug, Clone)]
pub struct SlugFamily {
    re: Regex,
}

impl SlugFamily {
    pub fn new(base: &str) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(&family_pattern(base))
            .case_insensitive(true)
            .build()?;
        Ok(Self { re })
    }

    pub fn matches(&self, slug: &str) -> bool {
        self.re.is_match(slug)
    }
}

/// Picks the final slug given how many existing slugs are in `base`'s family.
pub fn disambiguate(base: &str, existing_matches: usize) -> String {
    if existing_matches == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, existing_matches + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_names() {
        assert_eq!(slugify("Wacky Coffee"), "wacky-coffee");
        assert_eq!(slugify("  Joe's   Diner!! "), "joe-s-diner");
        assert_eq!(slugify("Café Olé"), "cafe-ole");
        assert_eq!(slugify("Fish & Chips"), "fish-and-chips");
        assert_eq!(slugify("Straße 42"), "strasse-42");
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
    }

    #[test]
    fn family_matches_base_and_numbered_variants_only() {
        let family = SlugFamily::new("wacky-coffee").unwrap();
        assert!(family.matches("wacky-coffee"));
        assert!(family.matches("wacky-coffee-2"));
        assert!(family.matches("Wacky-Coffee-13"));
        assert!(family.matches("wacky-coffee-"));
        assert!(!family.matches("wacky-coffee-bar"));
        assert!(!family.matches("the-wacky-coffee"));
        assert!(!family.matches("wacky-coffee-2a"));
    }

    #[test]
    fn disambiguate_counts_every_match() {
        assert_eq!(disambiguate("wacky-coffee", 0), "wacky-coffee");
        assert_eq!(disambiguate("wacky-coffee", 1), "wacky-coffee-2");
        // base, -2 and a leftover -5 all count: the next one is -4.
        assert_eq!(disambiguate("wacky-coffee", 3), "wacky-coffee-4");
    }
}
