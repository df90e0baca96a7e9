//! Translates generic URL query parameters into filter / sort / projection /
//! pagination directives over the tours collection.
//!
//! Parsing and SQL generation are split so the directive set itself can be
//! inspected and tested without a database. All column names come from the
//! whitelists below; user input only ever reaches the query as bound values.

use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use crate::tours::repo_types::Tour;

/// Keys consumed by sort/projection/pagination, stripped before filtering.
const RESERVED_KEYS: &[&str] = &["page", "sort", "limit", "fields"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Text,
}

const FILTERABLE: &[(&str, ColumnKind)] = &[
    ("name", ColumnKind::Text),
    ("duration", ColumnKind::Numeric),
    ("max_group_size", ColumnKind::Numeric),
    ("difficulty", ColumnKind::Text),
    ("price", ColumnKind::Numeric),
    ("ratings_average", ColumnKind::Numeric),
    ("ratings_quantity", ColumnKind::Numeric),
];

const SORTABLE: &[&str] = &[
    "name",
    "duration",
    "max_group_size",
    "difficulty",
    "price",
    "ratings_average",
    "ratings_quantity",
    "created_at",
];

/// Columns a `fields=` projection may include. `row_version` is internal and
/// deliberately absent.
const PROJECTABLE: &[&str] = &[
    "id",
    "name",
    "duration",
    "max_group_size",
    "difficulty",
    "price",
    "ratings_average",
    "ratings_quantity",
    "summary",
    "description",
    "created_at",
];

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: CmpOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub dir: SortDir,
}

#[derive(Debug, Clone)]
pub struct QueryFeatures {
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    /// `None` means the default projection (all public columns).
    pub fields: Option<Vec<&'static str>>,
    pub limit: i64,
    pub offset: i64,
}

impl QueryFeatures {
    pub fn parse(params: &HashMap<String, String>) -> Self {
        let (limit, offset) = Self::parse_pagination(params);
        Self {
            filters: Self::parse_filters(params),
            sort: Self::parse_sort(params),
            fields: Self::parse_fields(params),
            limit,
            offset,
        }
    }

    /// Equality filters plus `field[gte|gt|lte|lt]=value` comparisons.
    /// Unknown columns, unknown operators, and unparsable numbers are
    /// dropped, never passed through.
    fn parse_filters(params: &HashMap<String, String>) -> Vec<Filter> {
        let mut filters = Vec::new();
        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some((field, op)) = split_filter_key(key) else {
                debug!(%key, "dropping filter with unknown operator");
                continue;
            };
            let Some(&(column, kind)) = FILTERABLE.iter().find(|(c, _)| *c == field) else {
                debug!(%key, "dropping filter on unknown column");
                continue;
            };
            let value = match kind {
                ColumnKind::Numeric => match value.parse::<f64>() {
                    Ok(n) => FilterValue::Number(n),
                    Err(_) => {
                        debug!(%key, %value, "dropping non-numeric filter value");
                        continue;
                    }
                },
                ColumnKind::Text => FilterValue::Text(value.clone()),
            };
            filters.push(Filter { column, op, value });
        }
        // Map iteration order is arbitrary; keep the generated SQL stable.
        filters.sort_by_key(|f| f.column);
        filters
    }

    /// Comma-separated sort list, `-` prefix for descending. Defaults to
    /// newest-first.
    fn parse_sort(params: &HashMap<String, String>) -> Vec<SortKey> {
        let keys: Vec<SortKey> = params
            .get("sort")
            .map(|list| {
                list.split(',')
                    .filter_map(|token| {
                        let token = token.trim();
                        let (name, dir) = match token.strip_prefix('-') {
                            Some(rest) => (rest, SortDir::Desc),
                            None => (token, SortDir::Asc),
                        };
                        SORTABLE
                            .iter()
                            .copied()
                            .find(|c| *c == name)
                            .map(|column| SortKey { column, dir })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if keys.is_empty() {
            vec![SortKey {
                column: "created_at",
                dir: SortDir::Desc,
            }]
        } else {
            keys
        }
    }

    /// Comma-separated inclusion projection. Falls back to the default
    /// projection when nothing requested survives the whitelist.
    fn parse_fields(params: &HashMap<String, String>) -> Option<Vec<&'static str>> {
        let fields: Vec<&'static str> = params
            .get("fields")?
            .split(',')
            .filter_map(|token| {
                let token = token.trim();
                PROJECTABLE.iter().find(|c| **c == token).copied()
            })
            .collect();
        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }

    fn parse_pagination(params: &HashMap<String, String>) -> (i64, i64) {
        let page = params
            .get("page")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = params
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        (limit, (page - 1) * limit)
    }

    /// Append WHERE / ORDER BY / LIMIT / OFFSET onto the base query. Filter
    /// values are bound, not interpolated.
    pub fn apply<'a>(&self, qb: &mut QueryBuilder<'a, Postgres>) {
        for (i, filter) in self.filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(filter.column);
            qb.push(" ");
            qb.push(filter.op.sql());
            qb.push(" ");
            match &filter.value {
                FilterValue::Number(n) => qb.push_bind(*n),
                FilterValue::Text(t) => qb.push_bind(t.clone()),
            };
        }

        qb.push(" ORDER BY ");
        for (i, key) in self.sort.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(key.column);
            qb.push(match key.dir {
                SortDir::Asc => " ASC",
                SortDir::Desc => " DESC",
            });
        }

        qb.push(" LIMIT ");
        qb.push_bind(self.limit);
        qb.push(" OFFSET ");
        qb.push_bind(self.offset);
    }

    /// Apply the inclusion projection to a fetched row.
    pub fn project(&self, tour: &Tour) -> Result<serde_json::Value, serde_json::Error> {
        let mut value = serde_json::to_value(tour)?;
        if let (Some(fields), serde_json::Value::Object(map)) = (&self.fields, &mut value) {
            map.retain(|key, _| fields.iter().any(|f| *f == key));
        }
        Ok(value)
    }
}

fn split_filter_key(key: &str) -> Option<(&str, CmpOp)> {
    match key.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
        Some((field, op)) => {
            let op = match op {
                "gt" => CmpOp::Gt,
                "gte" => CmpOp::Gte,
                "lt" => CmpOp::Lt,
                "lte" => CmpOp::Lte,
                _ => return None,
            };
            Some((field, op))
        }
        None => Some((key, CmpOp::Eq)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_tour() -> Tour {
        Tour {
            id: Uuid::new_v4(),
            name: "The Sea Explorer".into(),
            duration: 7,
            max_group_size: 15,
            difficulty: "medium".into(),
            price: 497.0,
            ratings_average: 4.8,
            ratings_quantity: 23,
            summary: "Exploring the jaw-dropping US east coast by foot and by boat".into(),
            description: Some("long description".into()),
            created_at: OffsetDateTime::now_utc(),
            row_version: 0,
        }
    }

    #[test]
    fn full_directive_set_from_mixed_params() {
        let features = QueryFeatures::parse(&params(&[
            ("price[gte]", "500"),
            ("sort", "-price,name"),
            ("page", "2"),
            ("limit", "5"),
            ("fields", "name,price"),
        ]));

        assert_eq!(
            features.filters,
            vec![Filter {
                column: "price",
                op: CmpOp::Gte,
                value: FilterValue::Number(500.0),
            }]
        );
        assert_eq!(
            features.sort,
            vec![
                SortKey { column: "price", dir: SortDir::Desc },
                SortKey { column: "name", dir: SortDir::Asc },
            ]
        );
        assert_eq!(features.fields, Some(vec!["name", "price"]));
        assert_eq!(features.limit, 5);
        assert_eq!(features.offset, 5);
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        let features = QueryFeatures::parse(&HashMap::new());
        assert!(features.filters.is_empty());
        assert_eq!(
            features.sort,
            vec![SortKey { column: "created_at", dir: SortDir::Desc }]
        );
        assert_eq!(features.fields, None);
        assert_eq!(features.limit, DEFAULT_LIMIT);
        assert_eq!(features.offset, 0);
    }

    #[test]
    fn equality_and_comparison_filters_coexist() {
        let features = QueryFeatures::parse(&params(&[
            ("difficulty", "easy"),
            ("duration[lt]", "10"),
        ]));
        assert_eq!(
            features.filters,
            vec![
                Filter {
                    column: "difficulty",
                    op: CmpOp::Eq,
                    value: FilterValue::Text("easy".into()),
                },
                Filter {
                    column: "duration",
                    op: CmpOp::Lt,
                    value: FilterValue::Number(10.0),
                },
            ]
        );
    }

    #[test]
    fn unknown_columns_operators_and_bad_numbers_are_dropped() {
        let features = QueryFeatures::parse(&params(&[
            ("secret_column", "1"),
            ("price[gtex]", "500"),
            ("price[gte]", "not-a-number"),
            ("sort", "secret_column,-price"),
            ("fields", "secret_column"),
        ]));
        assert!(features.filters.is_empty());
        assert_eq!(
            features.sort,
            vec![SortKey { column: "price", dir: SortDir::Desc }]
        );
        // Nothing requested survived the whitelist: default projection.
        assert_eq!(features.fields, None);
    }

    #[test]
    fn pagination_is_clamped() {
        let features = QueryFeatures::parse(&params(&[("page", "0"), ("limit", "999999")]));
        assert_eq!(features.limit, MAX_LIMIT);
        assert_eq!(features.offset, 0);

        let features = QueryFeatures::parse(&params(&[("page", "-3"), ("limit", "-1")]));
        assert_eq!(features.limit, 1);
        assert_eq!(features.offset, 0);
    }

    #[test]
    fn apply_renders_the_expected_sql() {
        let features = QueryFeatures::parse(&params(&[
            ("price[gte]", "500"),
            ("sort", "-price,name"),
            ("page", "2"),
            ("limit", "5"),
        ]));
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tours");
        features.apply(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("WHERE price >= $1"), "sql: {sql}");
        assert!(sql.contains("ORDER BY price DESC, name ASC"), "sql: {sql}");
        assert!(sql.contains("LIMIT $2 OFFSET $3"), "sql: {sql}");
    }

    #[test]
    fn projection_keeps_only_requested_fields() {
        let features = QueryFeatures::parse(&params(&[("fields", "name,price")]));
        let json = features.project(&sample_tour()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("name"));
        assert!(obj.contains_key("price"));
    }

    #[test]
    fn default_projection_has_public_fields_only() {
        let features = QueryFeatures::parse(&HashMap::new());
        let json = features.project(&sample_tour()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("summary"));
        assert!(obj.contains_key("created_at"));
        assert!(!obj.contains_key("row_version"));
    }
}
