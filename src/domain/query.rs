//! Query directive set for tour listings.
//!
//! [`TourQuery`] holds the filter, sort, projection and pagination directives
//! a list request asks for. [`TourQuery::from_params`] translates raw
//! query-string pairs such as `price[gte]=500&sort=-price,name&page=2` into
//! that set, applying the steps in a fixed order: filter, sort, field
//! limiting, pagination. Every field and operator goes through an allow-list,
//! so nothing from the query string reaches the database verbatim.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::types::parse_timestamp;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, DEFAULT_PAGE, MAX_ITEMS_PER_PAGE, Pagination};

/// Page size used by the "top 5 cheap" alias.
pub const TOP_CHEAP_LIMIT: usize = 5;

/// Errors produced while translating query parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {0} cannot be used to filter or sort")]
    UnsupportedField(String),

    #[error("unsupported operator {operator:?} for field {field}")]
    UnsupportedOperator { field: String, operator: String },

    #[error("malformed filter key: {0}")]
    MalformedKey(String),

    #[error("invalid value {value:?} for field {field}")]
    InvalidValue { field: String, value: String },

    #[error("fields cannot mix inclusion and exclusion")]
    MixedProjection,

    #[error("page must be a positive integer (got {0:?})")]
    InvalidPage(String),

    #[error("limit must be a positive integer (got {0:?})")]
    InvalidLimit(String),

    #[error("limit must not exceed {max} (got {value})")]
    LimitTooLarge { value: usize, max: usize },
}

/// Storage type of a tour field, used to parse filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    Text,
    Timestamp,
    TimestampList,
}

/// Tour attributes addressable from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TourField {
    Id,
    Name,
    Slug,
    Duration,
    MaxGroupSize,
    Difficulty,
    RatingsAverage,
    RatingsQuantity,
    Price,
    PriceDiscount,
    Summary,
    Description,
    ImageCover,
    CreatedAt,
    StartDates,
    Version,
}

impl TourField {
    pub const ALL: [TourField; 16] = [
        TourField::Id,
        TourField::Name,
        TourField::Slug,
        TourField::Duration,
        TourField::MaxGroupSize,
        TourField::Difficulty,
        TourField::RatingsAverage,
        TourField::RatingsQuantity,
        TourField::Price,
        TourField::PriceDiscount,
        TourField::Summary,
        TourField::Description,
        TourField::ImageCover,
        TourField::CreatedAt,
        TourField::StartDates,
        TourField::Version,
    ];

    /// JSON key of the field in API payloads.
    pub const fn key(self) -> &'static str {
        match self {
            TourField::Id => "id",
            TourField::Name => "name",
            TourField::Slug => "slug",
            TourField::Duration => "duration",
            TourField::MaxGroupSize => "maxGroupSize",
            TourField::Difficulty => "difficulty",
            TourField::RatingsAverage => "ratingsAverage",
            TourField::RatingsQuantity => "ratingsQuantity",
            TourField::Price => "price",
            TourField::PriceDiscount => "priceDiscount",
            TourField::Summary => "summary",
            TourField::Description => "description",
            TourField::ImageCover => "imageCover",
            TourField::CreatedAt => "createdAt",
            TourField::StartDates => "startDates",
            TourField::Version => "version",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            TourField::Id
            | TourField::Duration
            | TourField::MaxGroupSize
            | TourField::RatingsQuantity
            | TourField::Version => FieldKind::Integer,
            TourField::RatingsAverage | TourField::Price | TourField::PriceDiscount => {
                FieldKind::Number
            }
            TourField::Name
            | TourField::Slug
            | TourField::Difficulty
            | TourField::Summary
            | TourField::Description
            | TourField::ImageCover => FieldKind::Text,
            TourField::CreatedAt => FieldKind::Timestamp,
            TourField::StartDates => FieldKind::TimestampList,
        }
    }

    /// Scalar fields can be filtered and sorted on; lists cannot.
    pub const fn is_scalar(self) -> bool {
        !matches!(self.kind(), FieldKind::TimestampList)
    }

    fn parse(key: &str) -> Result<Self, QueryError> {
        Self::from_key(key).ok_or_else(|| QueryError::UnknownField(key.to_string()))
    }

    fn parse_scalar(key: &str) -> Result<Self, QueryError> {
        let field = Self::parse(key)?;
        if field.is_scalar() {
            Ok(field)
        } else {
            Err(QueryError::UnsupportedField(key.to_string()))
        }
    }
}

/// Comparison operators allowed in `field[op]=value` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn from_operator(operator: &str) -> Option<Self> {
        match operator {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }
}

/// Filter operand converted to the field's storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Integer(i32),
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl FilterValue {
    fn parse(field: TourField, raw: &str) -> Result<Self, QueryError> {
        let invalid = || QueryError::InvalidValue {
            field: field.key().to_string(),
            value: raw.to_string(),
        };
        let trimmed = raw.trim();
        match field.kind() {
            FieldKind::Integer => trimmed.parse().map(FilterValue::Integer).map_err(|_| invalid()),
            FieldKind::Number => trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(FilterValue::Number)
                .ok_or_else(invalid),
            FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Timestamp => parse_timestamp(trimmed)
                .map(FilterValue::Timestamp)
                .ok_or_else(invalid),
            FieldKind::TimestampList => Err(QueryError::UnsupportedField(field.key().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: TourField,
    pub comparison: Comparison,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: TourField,
    pub direction: SortDirection,
}

impl SortKey {
    pub const fn asc(field: TourField) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    pub const fn desc(field: TourField) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }
}

/// Ordering used when a request does not ask for one: newest first.
pub const DEFAULT_SORT: SortKey = SortKey::desc(TourField::CreatedAt);

/// Which fields of each tour end up in the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Everything except the internal revision counter.
    #[default]
    Default,
    /// Only the listed fields (the id is always kept).
    Include(Vec<TourField>),
    /// Everything except the listed fields.
    Exclude(Vec<TourField>),
}

impl Projection {
    pub fn keeps(&self, field: TourField) -> bool {
        match self {
            Projection::Default => field != TourField::Version,
            Projection::Include(fields) => field == TourField::Id || fields.contains(&field),
            Projection::Exclude(fields) => !fields.contains(&field),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourQuery {
    /// Conjunction of field comparisons.
    pub filters: Vec<FieldFilter>,
    /// Requested ordering; empty means [`DEFAULT_SORT`].
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub pagination: Pagination,
}

impl TourQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates raw query-string pairs into a directive set.
    ///
    /// Control keys (`page`, `sort`, `limit`, `fields`) keep their last
    /// occurrence; every other pair becomes a filter.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = None;
        let mut sort = None;
        let mut limit = None;
        let mut fields = None;
        let mut filters = Vec::new();

        for (key, value) in params {
            let value = value.as_ref().to_string();
            match key.as_ref() {
                "page" => page = Some(value),
                "sort" => sort = Some(value),
                "limit" => limit = Some(value),
                "fields" => fields = Some(value),
                other => filters.push(parse_filter(other, &value)?),
            }
        }

        let mut query = filters.into_iter().fold(Self::new(), |query, filter| {
            query.filter(filter.field, filter.comparison, filter.value)
        });
        if let Some(sort) = sort {
            query = parse_sort(&sort)?.into_iter().fold(query, Self::sort_by);
        }
        if let Some(fields) = fields {
            query = query.projection(parse_projection(&fields)?);
        }
        let pagination = parse_pagination(page.as_deref(), limit.as_deref())?;

        Ok(query.paginate(pagination.page, pagination.per_page))
    }

    pub fn filter(mut self, field: TourField, comparison: Comparison, value: FilterValue) -> Self {
        self.filters.push(FieldFilter {
            field,
            comparison,
            value,
        });
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    /// The ordering to apply, falling back to [`DEFAULT_SORT`].
    pub fn sort_keys(&self) -> Vec<SortKey> {
        if self.sort.is_empty() {
            vec![DEFAULT_SORT]
        } else {
            self.sort.clone()
        }
    }

    /// Rewrites the directives into the "top 5 cheap" listing: best rated
    /// first, cheaper first on ties, with a compact projection. Filters and
    /// the requested page are kept.
    pub fn top_cheap(self) -> Self {
        let page = self.pagination.page;
        Self {
            sort: Vec::new(),
            ..self
        }
        .sort_by(SortKey::desc(TourField::RatingsAverage))
        .sort_by(SortKey::asc(TourField::Price))
        .projection(Projection::Include(vec![
            TourField::Name,
            TourField::Price,
            TourField::RatingsAverage,
            TourField::Summary,
            TourField::Difficulty,
        ]))
        .paginate(page, TOP_CHEAP_LIMIT)
    }
}

/// Splits `price[gte]` into its field and comparison.
fn parse_filter(key: &str, value: &str) -> Result<FieldFilter, QueryError> {
    let (field_key, comparison) = match key.split_once('[') {
        None => (key, Comparison::Eq),
        Some((field_key, rest)) => {
            let operator = rest
                .strip_suffix(']')
                .filter(|operator| !field_key.is_empty() && !operator.contains(['[', ']']))
                .ok_or_else(|| QueryError::MalformedKey(key.to_string()))?;
            let comparison = Comparison::from_operator(operator).ok_or_else(|| {
                QueryError::UnsupportedOperator {
                    field: field_key.to_string(),
                    operator: operator.to_string(),
                }
            })?;
            (field_key, comparison)
        }
    };

    if field_key.is_empty() {
        return Err(QueryError::MalformedKey(key.to_string()));
    }

    let field = TourField::parse_scalar(field_key)?;
    let value = FilterValue::parse(field, value)?;

    Ok(FieldFilter {
        field,
        comparison,
        value,
    })
}

fn parse_sort(raw: &str) -> Result<Vec<SortKey>, QueryError> {
    split_list(raw)
        .map(|item| match item.strip_prefix('-') {
            Some(key) => TourField::parse_scalar(key).map(SortKey::desc),
            None => TourField::parse_scalar(item).map(SortKey::asc),
        })
        .collect()
}

fn parse_projection(raw: &str) -> Result<Projection, QueryError> {
    let mut included = Vec::new();
    let mut excluded = Vec::new();

    for item in split_list(raw) {
        match item.strip_prefix('-') {
            Some(key) => excluded.push(TourField::parse(key)?),
            None => included.push(TourField::parse(item)?),
        }
    }

    match (included.is_empty(), excluded.is_empty()) {
        (true, true) => Ok(Projection::Default),
        (false, true) => Ok(Projection::Include(included)),
        (true, false) => Ok(Projection::Exclude(excluded)),
        (false, false) => Err(QueryError::MixedProjection),
    }
}

fn parse_pagination(page: Option<&str>, limit: Option<&str>) -> Result<Pagination, QueryError> {
    let page = match page {
        Some(raw) => parse_positive(raw).ok_or_else(|| QueryError::InvalidPage(raw.to_string()))?,
        None => DEFAULT_PAGE,
    };
    let per_page = match limit {
        Some(raw) => parse_positive(raw).ok_or_else(|| QueryError::InvalidLimit(raw.to_string()))?,
        None => DEFAULT_ITEMS_PER_PAGE,
    };
    if per_page > MAX_ITEMS_PER_PAGE {
        return Err(QueryError::LimitTooLarge {
            value: per_page,
            max: MAX_ITEMS_PER_PAGE,
        });
    }
    Ok(Pagination::new(page, per_page))
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value > 0)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> Result<TourQuery, QueryError> {
        TourQuery::from_params(pairs.iter().copied())
    }

    #[test]
    fn empty_params_use_defaults() {
        let query = parse(&[]).unwrap();
        assert!(query.filters.is_empty());
        assert_eq!(query.sort_keys(), vec![DEFAULT_SORT]);
        assert_eq!(query.projection, Projection::Default);
        assert_eq!(query.pagination, Pagination::new(1, 100));
    }

    #[test]
    fn bracketed_operators_become_comparisons() {
        let query = parse(&[("price[gte]", "500"), ("price[lte]", "1000")]).unwrap();
        assert_eq!(
            query.filters,
            vec![
                FieldFilter {
                    field: TourField::Price,
                    comparison: Comparison::Gte,
                    value: FilterValue::Number(500.0),
                },
                FieldFilter {
                    field: TourField::Price,
                    comparison: Comparison::Lte,
                    value: FilterValue::Number(1000.0),
                },
            ]
        );
    }

    #[test]
    fn plain_keys_filter_by_equality() {
        let query = parse(&[("difficulty", "easy"), ("duration", "5")]).unwrap();
        assert_eq!(query.filters[0].comparison, Comparison::Eq);
        assert_eq!(query.filters[0].value, FilterValue::Text("easy".to_string()));
        assert_eq!(query.filters[1].value, FilterValue::Integer(5));
    }

    #[test]
    fn timestamps_accept_dates_and_datetimes() {
        let query = parse(&[
            ("createdAt[gte]", "2021-01-01"),
            ("createdAt[lt]", "2021-06-01T12:30:00"),
        ])
        .unwrap();
        assert!(matches!(query.filters[0].value, FilterValue::Timestamp(_)));
        assert!(matches!(query.filters[1].value, FilterValue::Timestamp(_)));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        assert_eq!(
            parse(&[("price[ne]", "5")]),
            Err(QueryError::UnsupportedOperator {
                field: "price".to_string(),
                operator: "ne".to_string(),
            })
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for key in ["price[gte", "[gte]", "price[gte]x", "price[[gte]]"] {
            assert!(
                matches!(parse(&[(key, "5")]), Err(QueryError::MalformedKey(_))),
                "{key} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_and_list_fields_cannot_filter() {
        assert_eq!(
            parse(&[("colour", "red")]),
            Err(QueryError::UnknownField("colour".to_string()))
        );
        assert_eq!(
            parse(&[("startDates[gte]", "2021-01-01")]),
            Err(QueryError::UnsupportedField("startDates".to_string()))
        );
    }

    #[test]
    fn values_must_match_field_type() {
        assert!(matches!(
            parse(&[("price[gte]", "cheap")]),
            Err(QueryError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(&[("duration", "1.5")]),
            Err(QueryError::InvalidValue { .. })
        ));
    }

    #[test]
    fn sort_splits_on_commas_with_descending_prefix() {
        let query = parse(&[("sort", "-price, name,")]).unwrap();
        assert_eq!(
            query.sort_keys(),
            vec![SortKey::desc(TourField::Price), SortKey::asc(TourField::Name)]
        );
        assert!(parse(&[("sort", "-startDates")]).is_err());
    }

    #[test]
    fn last_control_value_wins() {
        let query = parse(&[("sort", "price"), ("sort", "name")]).unwrap();
        assert_eq!(query.sort, vec![SortKey::asc(TourField::Name)]);
    }

    #[test]
    fn fields_select_inclusion_or_exclusion() {
        let included = parse(&[("fields", "name,price")]).unwrap();
        assert_eq!(
            included.projection,
            Projection::Include(vec![TourField::Name, TourField::Price])
        );
        assert!(included.projection.keeps(TourField::Id));
        assert!(!included.projection.keeps(TourField::Summary));

        let excluded = parse(&[("fields", "-summary,-description")]).unwrap();
        assert!(!excluded.projection.keeps(TourField::Summary));
        assert!(excluded.projection.keeps(TourField::Version));

        assert_eq!(
            parse(&[("fields", "name,-summary")]),
            Err(QueryError::MixedProjection)
        );
    }

    #[test]
    fn default_projection_hides_version() {
        assert!(!Projection::Default.keeps(TourField::Version));
        assert!(Projection::Default.keeps(TourField::StartDates));
    }

    #[test]
    fn pagination_is_validated_and_capped() {
        let query = parse(&[("page", "2"), ("limit", "3")]).unwrap();
        assert_eq!(query.pagination.offset(), 3);

        assert_eq!(
            parse(&[("page", "0")]),
            Err(QueryError::InvalidPage("0".to_string()))
        );
        assert_eq!(
            parse(&[("limit", "-1")]),
            Err(QueryError::InvalidLimit("-1".to_string()))
        );
        assert_eq!(
            parse(&[("limit", "501")]),
            Err(QueryError::LimitTooLarge {
                value: 501,
                max: MAX_ITEMS_PER_PAGE
            })
        );
    }

    #[test]
    fn top_cheap_matches_explicit_parameters() {
        let explicit = parse(&[
            ("limit", "5"),
            ("sort", "-ratingsAverage,price"),
            ("fields", "name,price,ratingsAverage,summary,difficulty"),
        ])
        .unwrap();
        let aliased = TourQuery::new().top_cheap();
        assert_eq!(aliased, explicit);
    }

    #[test]
    fn top_cheap_keeps_filters_and_page() {
        let query = parse(&[("difficulty", "easy"), ("page", "2"), ("limit", "50")])
            .unwrap()
            .top_cheap();
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.pagination, Pagination::new(2, TOP_CHEAP_LIMIT));
    }

    #[test]
    fn top_cheap_replaces_requested_sort_and_fields() {
        let query = parse(&[("sort", "name"), ("fields", "-summary")])
            .unwrap()
            .top_cheap();
        assert_eq!(
            query.sort,
            vec![
                SortKey::desc(TourField::RatingsAverage),
                SortKey::asc(TourField::Price)
            ]
        );
        assert!(query.projection.keeps(TourField::Summary));
        assert!(!query.projection.keeps(TourField::Description));
    }

    #[test]
    fn builders_compose_like_parsed_params() {
        let built = TourQuery::new()
            .filter(TourField::Price, Comparison::Lt, FilterValue::Number(1000.0))
            .sort_by(SortKey::desc(TourField::Price))
            .sort_by(SortKey::asc(TourField::Name))
            .projection(Projection::Exclude(vec![TourField::Description]))
            .paginate(3, 10);
        let parsed = parse(&[
            ("price[lt]", "1000"),
            ("sort", "-price,name"),
            ("fields", "-description"),
            ("page", "3"),
            ("limit", "10"),
        ])
        .unwrap();
        assert_eq!(built, parsed);
    }
}
