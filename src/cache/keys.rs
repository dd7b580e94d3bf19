//! Cache key canonicalization.
//!
//! Keys are pure functions of the request parameters; two requests that
//! mean the same thing must always land on the same key.

use crate::domain::catalog::ProductSort;

pub const PRODUCT_LIST_PREFIX: &str = "product:list:";
pub const PRODUCT_DETAIL_PREFIX: &str = "product:detail:";
pub const LIKE_COUNT_PREFIX: &str = "product:likecount:";

/// Fingerprint of a (sort, filter, page, size) listing request.
pub fn product_list(brand_id: Option<i64>, sort: ProductSort, page: u32, size: u32) -> String {
    let brand = match brand_id {
        Some(id) => format!("brandId={id}"),
        None => "brandId=all".to_string(),
    };
    format!(
        "{PRODUCT_LIST_PREFIX}{brand}&sort={}&page={page}&size={size}",
        sort.as_str()
    )
}

pub fn product_detail(product_id: i64) -> String {
    format!("{PRODUCT_DETAIL_PREFIX}{product_id}")
}

pub fn like_count(product_id: i64) -> String {
    format!("{LIKE_COUNT_PREFIX}{product_id}")
}
