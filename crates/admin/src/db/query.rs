//! Filters for bulk reads.

use chrono::NaiveDate;
use kennel_core::DogId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// A bulk read: which dog, which dates, how many. Rows come back in the
/// table's default order.
///
/// The date range applies to the table's own date column (e.g.
/// `purchase_date` for purchases) and both ends are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub dog_id: Option<DogId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn for_dog(mut self, dog_id: DogId) -> Self {
        self.dog_id = Some(dog_id);
        self
    }

    #[must_use]
    pub const fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query pairs.
    ///
    /// `dog_filter` renders the dog condition for the table and `date_column`
    /// names the date range column; either may yield nothing for tables
    /// without one.
    /// `order` is the table's sort column and direction.
    pub(crate) fn to_pairs(
        &self,
        dog_filter: impl Fn(DogId) -> Option<(String, String)>,
        date_column: Option<&str>,
        (column, direction): (&str, Direction),
    ) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];

        if let Some(pair) = self.dog_id.and_then(dog_filter) {
            pairs.push(pair);
        }
        if let Some(column) = date_column {
            if let Some(from) = self.from {
                pairs.push((column.to_string(), format!("gte.{from}")));
            }
            if let Some(to) = self.to {
                pairs.push((column.to_string(), format!("lte.{to}")));
            }
        }

        pairs.push(("order".to_string(), format!("{column}.{}", direction.as_str())));

        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}
