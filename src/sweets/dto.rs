use serde::Deserialize;

use super::repo_types::{NewSweet, SweetFilter, SweetPatch};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSweetRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
}

impl From<CreateSweetRequest> for NewSweet {
    fn from(r: CreateSweetRequest) -> Self {
        Self {
            name: r.name,
            category: r.category,
            price: r.price,
            quantity: r.quantity,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateSweetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
}

impl From<UpdateSweetRequest> for SweetPatch {
    fn from(r: UpdateSweetRequest) -> Self {
        Self {
            name: r.name,
            category: r.category,
            price: r.price,
            quantity: r.quantity,
        }
    }
}

/// Raw `/sweets/search` query string; every value arrives as text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn present(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn price_bound(field: &str, v: Option<String>) -> AppResult<Option<f64>> {
    present(v)
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| AppError::validation(format!("{field} must be a number")))
        })
        .transpose()
}

impl TryFrom<SearchQuery> for SweetFilter {
    type Error = AppError;

    fn try_from(q: SearchQuery) -> AppResult<Self> {
        Ok(Self {
            name: present(q.name),
            category: present(q.category),
            min_price: price_bound("minPrice", q.min_price)?,
            max_price: price_bound("maxPrice", q.max_price)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: [Option<&str>; 4]) -> SearchQuery {
        let [name, category, min, max] = pairs.map(|p| p.map(String::from));
        SearchQuery {
            name,
            category,
            min_price: min,
            max_price: max,
        }
    }

    #[test]
    fn search_query_parses_numbers() {
        let filter =
            SweetFilter::try_from(query([Some("Chocolate"), Some("Chocolate"), Some("1"), Some("10")]))
                .unwrap();
        assert_eq!(
            filter,
            SweetFilter {
                name: Some("Chocolate".into()),
                category: Some("Chocolate".into()),
                min_price: Some(1.0),
                max_price: Some(10.0),
            }
        );
    }

    #[test]
    fn empty_values_count_as_absent() {
        let filter = SweetFilter::try_from(query([Some(""), None, Some(""), None])).unwrap();
        assert_eq!(filter, SweetFilter::default());
    }

    #[test]
    fn unparseable_price_is_rejected() {
        let err = SweetFilter::try_from(query([None, None, Some("cheap"), None])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(SweetFilter::try_from(query([None, None, None, Some("NaN")])).is_err());
    }

    #[test]
    fn unknown_body_fields_are_rejected() {
        let res = serde_json::from_str::<CreateSweetRequest>(
            r#"{"name":"a","category":"b","price":1,"quantity":1,"owner":"me"}"#,
        );
        assert!(res.is_err());
        let res = serde_json::from_str::<UpdateSweetRequest>(r#"{"quantity":2.5}"#);
        assert!(res.is_err());
    }
}
