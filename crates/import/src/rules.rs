use insight_core::{Money, RawTransactionRecord, TransactionType};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::keyword::KeywordMatcher;

/// One row of the tag table: any keyword hit assigns `tag`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

impl TagRule {
    pub fn new(tag: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// A fixed-amount charge under a bank code that is attributed to `tag` at most
/// once per statement. The same code is used for unrelated transfers, so only
/// the first matching withdrawal is trusted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringChargeRule {
    pub token: String,
    pub amount: Money,
    pub tag: String,
}

impl Default for RecurringChargeRule {
    fn default() -> Self {
        Self {
            token: "UAESWCH".to_string(),
            amount: Money::from_cents(100_000),
            tag: "cleaner".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleTable {
    rules: Vec<TagRule>,
    #[serde(default)]
    recurring: Option<RecurringChargeRule>,
}

struct CompiledRule {
    rule: TagRule,
    matcher: KeywordMatcher,
}

/// Code-level second classification pass. Rules are evaluated in table order
/// and the first hit wins; with no hit the provider's suggestion stands.
pub struct TagClassifier {
    rules: Vec<CompiledRule>,
    recurring: RecurringChargeRule,
    recurring_matcher: KeywordMatcher,
}

impl TagClassifier {
    pub fn new(rules: Vec<TagRule>, recurring: RecurringChargeRule) -> Result<Self, ImportError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let matcher = KeywordMatcher::new(&rule.keywords).map_err(|source| ImportError::Keyword {
                    tag: rule.tag.clone(),
                    source,
                })?;
                Ok(CompiledRule { rule, matcher })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;
        let recurring_matcher = KeywordMatcher::new([&recurring.token]).map_err(|source| ImportError::Keyword {
            tag: recurring.tag.clone(),
            source,
        })?;
        Ok(Self {
            rules,
            recurring,
            recurring_matcher,
        })
    }

    /// Parses a replacement table:
    ///
    /// ```toml
    /// [[rules]]
    /// tag = "food"
    /// keywords = ["TALABAT", "COFFEE"]
    ///
    /// [recurring]
    /// token = "UAESWCH"
    /// amount = 1000
    /// tag = "cleaner"
    /// ```
    pub fn from_toml(toml_content: &str) -> Result<Self, ImportError> {
        let table: RuleTable = toml::from_str(toml_content)?;
        Self::new(table.rules, table.recurring.unwrap_or_default())
    }

    pub fn find_matching_rule(&self, detail: &str) -> Option<&TagRule> {
        self.rules
            .iter()
            .find(|cr| cr.matcher.is_match(detail))
            .map(|cr| &cr.rule)
    }

    /// Stateless classification: table rules, then the provider's tag, then
    /// the detail itself.
    pub fn classify(&self, detail: &str, provider_tag: &str) -> String {
        match self.find_matching_rule(detail) {
            Some(rule) => rule.tag.clone(),
            None => fallback_tag(detail, provider_tag),
        }
    }

    pub fn recurring_charge(&self) -> &RecurringChargeRule {
        &self.recurring
    }

    /// Whether `record` has the exact shape of the recurring charge.
    pub fn is_recurring_charge(&self, record: &RawTransactionRecord) -> bool {
        record.kind == TransactionType::Withdrawal
            && record.amount == self.recurring.amount
            && self.recurring_matcher.is_match(&record.detail)
    }

    pub fn rules(&self) -> impl Iterator<Item = &TagRule> {
        self.rules.iter().map(|cr| &cr.rule)
    }
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TagClassifier {
    pub fn builtin() -> Self {
        let rules = builtin_rules()
            .into_iter()
            .map(|rule| {
                let matcher = KeywordMatcher::new(&rule.keywords).expect("built-in keywords are escaped");
                CompiledRule { rule, matcher }
            })
            .collect();
        let recurring = RecurringChargeRule::default();
        let recurring_matcher = KeywordMatcher::new([&recurring.token]).expect("built-in token is escaped");
        Self {
            rules,
            recurring,
            recurring_matcher,
        }
    }
}

/// The provider's tag when it offered one, else the raw detail.
pub fn fallback_tag(detail: &str, provider_tag: &str) -> String {
    if provider_tag.trim().is_empty() {
        detail.to_string()
    } else {
        provider_tag.to_string()
    }
}

/// Built-in rule table, highest precedence first. Food is checked before
/// grocery because several vendors (QCLUB, VIVA, CATERING) sell both.
pub fn builtin_rules() -> Vec<TagRule> {
    vec![
        TagRule::new(
            "food",
            &[
                "TALABAT", "DELIVEROO", "QCLUB", "VIVA", "CATERING", "CATERI", "COFFEE", "COFFE", "TEA",
                "SWEETS", "CHOCOLATE", "EATER", "AFRICAN AND EASTERN", "DELI", "FNB", "REST", "RESTO",
                "RESTAURAN", "RESTAURANT",
            ],
        ),
        TagRule::new(
            "amenities",
            &[
                "DEWA", "DUBAI ELECTRICITY", "WATER", "AUTHORITY", "EMPOWER", "DISTRICT COOLING", "ETISALAT",
                "E&", "DU", "GAS", "DUBAI GAS", "EMIRATES GAS", "SMART DUBAI", "SMARTDXB",
                "DUBAI MUNICIPALITY", "HOUSING FEE",
            ],
        ),
        TagRule::new(
            "grocery",
            &[
                "FRESHLANIDA", "CARREFOUR", "SPINNEYS", "SPINNEY", "WAITROSE", "UNION COOP", "LULU",
                "GRANDIOSE", "NESTO", "CHOITHRAM", "CHOITHRAMS", "AL MAYA", "WEST ZONE", "DAY TO DAY",
                "NOON MINUTES", "INSTASHOP", "QCLUB", "VIVA", "MINIMART", "HYPERMARKET", "HYPERMART",
                "SUPERMARKET", "SUPERMA", "MARKET", "CATERING", "GROCERY",
            ],
        ),
        TagRule::new("rent", &["RENT"]),
        TagRule::new("cleaner", &["JUSTLIFE"]),
        TagRule::new("taxi", &["TAXI", "CAREEM"]),
    ]
}
