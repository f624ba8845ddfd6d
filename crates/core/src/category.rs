use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed spending categories that summaries and comparisons report on.
/// Any withdrawal whose tag is not one of these counts as untagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Therapy,
    Grocery,
    Taxi,
    Gas,
    Laundry,
    Amenities,
    Subscription,
    Massage,
    Temu,
    Food,
    Amazon,
    Cleaner,
    Transfers,
    Vet,
    Hospital,
    Rent,
}

impl Category {
    /// Display order for summaries and comparison rows.
    pub const ALL: [Category; 16] = [
        Category::Therapy,
        Category::Grocery,
        Category::Taxi,
        Category::Gas,
        Category::Laundry,
        Category::Amenities,
        Category::Subscription,
        Category::Massage,
        Category::Temu,
        Category::Food,
        Category::Amazon,
        Category::Cleaner,
        Category::Transfers,
        Category::Vet,
        Category::Hospital,
        Category::Rent,
    ];

    /// Categories folded into the "Home & Living" composite total.
    pub const HOME_AND_LIVING: [Category; 4] = [
        Category::Laundry,
        Category::Amenities,
        Category::Grocery,
        Category::Cleaner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Therapy => "therapy",
            Category::Grocery => "grocery",
            Category::Taxi => "taxi",
            Category::Gas => "gas",
            Category::Laundry => "laundry",
            Category::Amenities => "amenities",
            Category::Subscription => "subscription",
            Category::Massage => "massage",
            Category::Temu => "temu",
            Category::Food => "food",
            Category::Amazon => "amazon",
            Category::Cleaner => "cleaner",
            Category::Transfers => "transfers",
            Category::Vet => "vet",
            Category::Hospital => "hospital",
            Category::Rent => "rent",
        }
    }

    /// Case-insensitive lookup of a transaction tag. Free-text tags (the
    /// unclassified detail) return `None`.
    pub fn from_tag(tag: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(tag))
    }

    pub fn is_home_and_living(self) -> bool {
        Category::HOME_AND_LIVING.contains(&self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_tag(s).ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}
