//! Normalization of raw search responses into products.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::result::Product;

/// Converts one raw page response into products.
///
/// Never fails: a response without the expected shape yields no products,
/// entries without a product record are skipped, and fields of the wrong
/// type fall back to their defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageScanner;

impl PageScanner {
    pub fn new() -> Self {
        Self
    }

    /// Extracts products from `raw`, preserving their order.
    pub fn scan(&self, raw: &Value) -> Vec<Product> {
        let Some(items) = raw.get("data").and_then(Value::as_array) else {
            debug!("Response has no data array");
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| match RawItem::deserialize(item) {
                Ok(RawItem {
                    card: Some(RawCard { product: Some(product) }),
                }) => product.into_product(),
                Ok(_) => None,
                Err(e) => {
                    debug!("Skipping malformed entry {}: {}", position, e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct RawItem {
    card: Option<RawCard>,
}

#[derive(Deserialize)]
struct RawCard {
    product: Option<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProduct {
    #[serde(deserialize_with = "lenient_string")]
    nv_mid: String,
    #[serde(deserialize_with = "lenient_string")]
    product_name: String,
    #[serde(deserialize_with = "lenient_number")]
    discounted_sale_price: f64,
    #[serde(deserialize_with = "lenient_number")]
    sale_price: f64,
    #[serde(deserialize_with = "lenient_nested")]
    images: Option<Vec<RawImage>>,
    #[serde(deserialize_with = "lenient_string")]
    mall_name: String,
    #[serde(deserialize_with = "lenient_number")]
    average_review_score: f64,
    #[serde(deserialize_with = "lenient_number")]
    total_review_count: f64,
    #[serde(deserialize_with = "lenient_nested")]
    product_url: Option<RawProductUrl>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawImage {
    #[serde(deserialize_with = "lenient_string")]
    image_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProductUrl {
    #[serde(deserialize_with = "lenient_string")]
    pc_url: String,
    #[serde(deserialize_with = "lenient_string")]
    mobile_url: String,
}

impl RawProduct {
    fn into_product(self) -> Option<Product> {
        let id = self.nv_mid.trim().to_string();
        let title = self.product_name.trim().to_string();
        if id.is_empty() || title.is_empty() {
            return None;
        }

        // A zero discounted price means "no discount" upstream.
        let price = if self.discounted_sale_price > 0.0 {
            self.discounted_sale_price
        } else {
            self.sale_price
        };

        let image_url = self
            .images
            .and_then(|images| images.into_iter().next())
            .map(|image| image.image_url)
            .unwrap_or_default();

        let product_url = self
            .product_url
            .map(|url| if url.pc_url.is_empty() { url.mobile_url } else { url.pc_url })
            .unwrap_or_default();

        Some(Product {
            id,
            title,
            price: if price.is_finite() { price } else { 0.0 },
            image_url,
            shop_name: self.mall_name,
            rating: self.average_review_score.max(0.0),
            review_count: to_count(self.total_review_count),
            product_url,
        })
    }
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Accepts a string or a number; anything else becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Accepts a nested record of the expected shape; anything else becomes `None`.
fn lenient_nested<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| T::deserialize(value).ok()))
}

/// Accepts a number or a numeric string; anything else becomes zero.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(product: Value) -> Value {
        json!({ "card": { "product": product } })
    }

    #[test]
    fn test_scan_full_mapping() {
        let raw = json!({
            "data": [item(json!({
                "nvMid": "82736451",
                "productName": "무선 키보드",
                "discountedSalePrice": 25900,
                "salePrice": 32000,
                "images": [{ "imageUrl": "https://img.example/a.jpg" }, { "imageUrl": "https://img.example/b.jpg" }],
                "mallName": "키보드샵",
                "averageReviewScore": 4.8,
                "totalReviewCount": 1532,
                "productUrl": { "pcUrl": "https://smartstore.example/p/1", "mobileUrl": "https://m.smartstore.example/p/1" }
            }))]
        });

        let products = PageScanner::new().scan(&raw);
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.id, "82736451");
        assert_eq!(p.title, "무선 키보드");
        assert_eq!(p.price, 25900.0);
        assert_eq!(p.image_url, "https://img.example/a.jpg");
        assert_eq!(p.shop_name, "키보드샵");
        assert_eq!(p.rating, 4.8);
        assert_eq!(p.review_count, 1532);
        assert_eq!(p.product_url, "https://smartstore.example/p/1");
    }

    #[test]
    fn test_scan_price_falls_back_to_sale_price() {
        let raw = json!({ "data": [item(json!({ "nvMid": "1", "productName": "a", "salePrice": 32000 }))] });
        assert_eq!(PageScanner.scan(&raw)[0].price, 32000.0);
    }

    #[test]
    fn test_scan_zero_discount_without_sale_price() {
        let raw = json!({ "data": [item(json!({ "nvMid": "1", "productName": "a", "discountedSalePrice": 0 }))] });
        let products = PageScanner.scan(&raw);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, 0.0);
    }

    #[test]
    fn test_scan_defaults_for_missing_fields() {
        let raw = json!({ "data": [item(json!({ "nvMid": 12345, "productName": "a" }))] });
        let p = &PageScanner.scan(&raw)[0];
        assert_eq!(p.id, "12345");
        assert_eq!(p.price, 0.0);
        assert_eq!(p.image_url, "");
        assert_eq!(p.shop_name, "");
        assert_eq!(p.rating, 0.0);
        assert_eq!(p.review_count, 0);
        assert_eq!(p.product_url, "");
    }

    #[test]
    fn test_scan_mobile_url_fallback() {
        let raw = json!({ "data": [item(json!({
            "nvMid": "1",
            "productName": "a",
            "productUrl": { "mobileUrl": "https://m.example/1" }
        }))] });
        assert_eq!(PageScanner.scan(&raw)[0].product_url, "https://m.example/1");
    }

    #[test]
    fn test_scan_drops_missing_id_or_title() {
        let raw = json!({ "data": [
            item(json!({ "nvMid": "1", "productName": "first" })),
            item(json!({ "nvMid": "2" })),
            item(json!({ "productName": "no id" })),
            item(json!({ "nvMid": "", "productName": "empty id" })),
            item(json!({ "nvMid": "5", "productName": "fifth" })),
        ]});
        let ids: Vec<_> = PageScanner.scan(&raw).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_scan_skips_entries_without_product() {
        let raw = json!({ "data": [
            { "card": { "ad": {} } },
            { "other": true },
            "not an object",
            null,
            item(json!({ "nvMid": "9", "productName": "kept" })),
        ]});
        let products = PageScanner.scan(&raw);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "9");
    }

    #[test]
    fn test_scan_keeps_entries_with_mistyped_optional_fields() {
        let raw = json!({ "data": [
            item(json!({ "nvMid": "1", "productName": "bad images", "images": "oops" })),
            item(json!({ "nvMid": "2", "productName": "string url", "productUrl": "https://example/2" })),
            item(json!({ "nvMid": "3", "productName": "bad image entry", "images": [42], "mallName": ["x"] })),
            item(json!({ "nvMid": "4", "productName": "good", "salePrice": "1500" })),
        ]});
        let products = PageScanner.scan(&raw);
        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(products[0].image_url, "");
        assert_eq!(products[1].product_url, "");
        assert_eq!(products[2].image_url, "");
        assert_eq!(products[2].shop_name, "");
        assert_eq!(products[3].price, 1500.0);
    }

    #[test]
    fn test_scan_keeps_fractional_prices() {
        let raw = json!({ "data": [
            item(json!({ "nvMid": "1", "productName": "a", "salePrice": 12.99 })),
            item(json!({ "nvMid": "2", "productName": "b", "discountedSalePrice": "7.5", "salePrice": 9 })),
            item(json!({ "nvMid": "3", "productName": "c", "salePrice": "inf" })),
        ]});
        let prices: Vec<f64> = PageScanner.scan(&raw).into_iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![12.99, 7.5, 0.0]);
    }

    #[test]
    fn test_scan_unexpected_shapes() {
        assert!(PageScanner.scan(&json!(null)).is_empty());
        assert!(PageScanner.scan(&json!([])).is_empty());
        assert!(PageScanner.scan(&json!({ "cards": [] })).is_empty());
        assert!(PageScanner.scan(&json!({ "data": { "not": "array" } })).is_empty());
        assert!(PageScanner.scan(&json!({ "data": [] })).is_empty());
    }
}
