//! Structured search filters derived from natural-language queries
//!
//! Every key is optional: an absent key leaves that dimension unconstrained.
//! List-valued keys are duplicate-free sets.

mod merge;
pub mod vocabulary;

pub use merge::merge;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Ordered, duplicate-free set of normalized (trimmed, lowercase) values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; blank values are ignored
    pub fn insert(&mut self, value: impl AsRef<str>) -> bool {
        let value = normalize(value.as_ref());
        if value.is_empty() {
            return false;
        }
        self.0.insert(value)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(&normalize(value))
    }

    pub fn union(&self, other: &TagSet) -> TagSet {
        TagSet(self.0.union(&other.0).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// LLM output sometimes carries a bare string where a list is expected
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl From<OneOrMany> for TagSet {
    fn from(value: OneOrMany) -> Self {
        value.into_vec().into_iter().collect()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn first_of_one_or_many<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.into_vec()
            .iter()
            .map(|s| normalize(s))
            .find(|s| !s.is_empty())
    }))
}

fn normalized_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| normalize(&s)).filter(|s| !s.is_empty()))
}

/// Numbers arrive as `30`, `30.0` or `"30"` depending on the model
fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Whole non-negative number, or absent when the value does not parse
fn lenient_whole<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_of)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .and_then(|n| T::try_from(n as u64).ok()))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_of))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match normalize(&s).as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Search constraints for one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Maximum total time in minutes
    #[serde(
        deserialize_with = "lenient_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_time: Option<u32>,
    /// Minimum total time in minutes
    #[serde(
        deserialize_with = "lenient_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_time: Option<u32>,
    #[serde(
        deserialize_with = "first_of_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub difficulty: Option<String>,
    /// How many recipes the user asked for
    #[serde(
        deserialize_with = "lenient_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_limit: Option<usize>,
    /// Lowest acceptable average rating (0-5)
    #[serde(
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_rating: Option<f64>,
    #[serde(
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub high_protein: Option<bool>,
    #[serde(
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub low_fat: Option<bool>,
    #[serde(
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub low_carb: Option<bool>,
    #[serde(
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub low_calorie: Option<bool>,
    #[serde(
        deserialize_with = "normalized_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub main_protein: Option<String>,
    /// Title keywords, matched as a name pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub dietary_tags: TagSet,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub cuisine: TagSet,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub ingredients: TagSet,
    #[serde(skip_serializing_if = "TagSet::is_empty")]
    pub exclude_tags: TagSet,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no key constrains the search
    pub fn is_empty(&self) -> bool {
        *self == Filters::default()
    }

    /// Exclude competing proteins when a main protein is requested and the
    /// extractor did not already exclude a protein
    pub fn apply_protein_exclusions(&mut self) {
        let Some(protein) = self.main_protein.as_deref() else {
            return;
        };
        if vocabulary::PROTEINS
            .iter()
            .any(|p| self.exclude_tags.contains(p))
        {
            return;
        }
        for other in vocabulary::COMPETING_PROTEINS {
            let same_family = matches!((protein, *other), ("seafood", "fish"));
            if *other != protein && !same_family {
                self.exclude_tags.insert(other);
            }
        }
    }

    /// Name pattern handed to the retriever
    pub fn name_pattern(&self) -> Option<&str> {
        self.recipe_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Compact JSON form for logs
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        let lists = [
            ("tags", &self.tags),
            ("dietary", &self.dietary_tags),
            ("cuisine", &self.cuisine),
            ("ingredients", &self.ingredients),
            ("excluding", &self.exclude_tags),
        ];
        for (label, set) in lists {
            if !set.is_empty() {
                parts.push(format!("{}: {}", label, set.to_vec().join(", ")));
            }
        }

        if let Some(protein) = &self.main_protein {
            parts.push(format!("protein: {}", protein));
        }
        if let Some(name) = &self.recipe_name {
            parts.push(format!("name: {}", name));
        }
        if let Some(max) = self.max_time {
            parts.push(format!("under {} min", max));
        }
        if let Some(min) = self.min_time {
            parts.push(format!("over {} min", min));
        }
        if let Some(difficulty) = &self.difficulty {
            parts.push(format!("difficulty: {}", difficulty));
        }
        if let Some(rating) = self.min_rating {
            parts.push(format!("rating >= {:.1}", rating));
        }

        let flags = [
            ("high protein", self.high_protein),
            ("low fat", self.low_fat),
            ("low carb", self.low_carb),
            ("low calorie", self.low_calorie),
        ];
        for (label, flag) in flags {
            if flag == Some(true) {
                parts.push(label.to_string());
            }
        }

        if parts.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", parts.join("; "))
        }
    }
}
