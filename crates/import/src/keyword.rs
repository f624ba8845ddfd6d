use regex::Regex;

/// Boundary-aware, case-insensitive matcher for a set of keywords.
///
/// A keyword only matches as a distinct token: the character on either side of
/// the hit must be absent or non-alphanumeric (ASCII), so `DU` matches
/// `"DU POSTPAID"` but not `"DUBAI MALL"`. Keywords are escaped, so `E&` or
/// `C.O.D` are taken literally. Multi-word keywords (`UNION COOP`) match the
/// exact phrase.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    regex: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let regex = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r"(?i)(?:^|[^a-z0-9])(?:{alternation})(?:[^a-z0-9]|$)"
            ))?)
        };

        Ok(Self { keywords, regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// One-off check of a single keyword against `text`.
pub fn matches(text: &str, keyword: &str) -> bool {
    KeywordMatcher::new([keyword]).is_ok_and(|m| m.is_match(text))
}
