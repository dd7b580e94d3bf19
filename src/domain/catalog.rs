//! Catalog entities and the sort policy for paginated listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    /// Price in minor currency units, never negative.
    pub price: i64,
    /// Denormalized like counter; mutated only through the like write path.
    pub like_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// Sort keys accepted by the product listing.
///
/// Each key carries a deterministic tie-break on the product id so that
/// page boundaries stay stable while rows are inserted concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    Latest,
    PriceAsc,
    LikesDesc,
}

impl ProductSort {
    /// Parse the `sort` query value. Absent means `latest`.
    pub fn parse(value: Option<&str>) -> Result<Self, DomainError> {
        match value {
            None => Ok(Self::Latest),
            Some("latest") => Ok(Self::Latest),
            Some("price_asc") => Ok(Self::PriceAsc),
            Some("likes_desc") => Ok(Self::LikesDesc),
            Some(other) => Err(DomainError::UnsupportedSort(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::PriceAsc => "price_asc",
            Self::LikesDesc => "likes_desc",
        }
    }

    /// Total order over products for this sort key.
    ///
    /// Latest: created_at desc, id desc. PriceAsc: price asc, id asc.
    /// LikesDesc: like_count desc, id desc.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Latest => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
            Self::PriceAsc => a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)),
            Self::LikesDesc => b
                .like_count
                .cmp(&a.like_count)
                .then_with(|| b.id.cmp(&a.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn product(id: i64, price: i64, like_count: i64, created_at: OffsetDateTime) -> Product {
        Product {
            id,
            brand_id: 1,
            name: format!("product-{id}"),
            price,
            like_count,
            created_at,
        }
    }

    #[test]
    fn parse_accepts_known_keys_and_defaults_to_latest() {
        assert_eq!(ProductSort::parse(None).unwrap(), ProductSort::Latest);
        assert_eq!(
            ProductSort::parse(Some("latest")).unwrap(),
            ProductSort::Latest
        );
        assert_eq!(
            ProductSort::parse(Some("price_asc")).unwrap(),
            ProductSort::PriceAsc
        );
        assert_eq!(
            ProductSort::parse(Some("likes_desc")).unwrap(),
            ProductSort::LikesDesc
        );
        assert!(matches!(
            ProductSort::parse(Some("popularity")),
            Err(DomainError::UnsupportedSort(_))
        ));
    }

    #[test]
    fn latest_breaks_created_at_ties_by_descending_id() {
        let ts = datetime!(2026-01-10 12:00 UTC);
        let older = product(7, 100, 0, ts - time::Duration::hours(1));
        let a = product(3, 100, 0, ts);
        let b = product(9, 100, 0, ts);

        let mut items = vec![older.clone(), a.clone(), b.clone()];
        items.sort_by(|x, y| ProductSort::Latest.compare(x, y));
        assert_eq!(
            items.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![9, 3, 7]
        );
    }

    #[test]
    fn price_asc_breaks_price_ties_by_ascending_id() {
        let ts = datetime!(2026-01-10 12:00 UTC);
        let mut items = vec![
            product(5, 300, 0, ts),
            product(2, 100, 0, ts),
            product(8, 100, 0, ts),
        ];
        items.sort_by(|x, y| ProductSort::PriceAsc.compare(x, y));
        assert_eq!(
            items.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![2, 8, 5]
        );
    }

    #[test]
    fn likes_desc_breaks_count_ties_by_descending_id() {
        let ts = datetime!(2026-01-10 12:00 UTC);
        let mut items = vec![
            product(4, 100, 10, ts),
            product(6, 100, 10, ts),
            product(1, 100, 25, ts),
        ];
        items.sort_by(|x, y| ProductSort::LikesDesc.compare(x, y));
        assert_eq!(
            items.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 6, 4]
        );
    }
}
