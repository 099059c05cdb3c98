use serde_json::Value;

/// Number of documents returned by a search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Largest page a search returns; larger limits are clamped.
pub const MAX_SEARCH_LIMIT: usize = 1000;

/// Deepest result reachable through `offset + limit` (RediSearch's default
/// `MAXSEARCHRESULTS`).
pub const MAX_SEARCH_WINDOW: usize = 10_000;

/// How an indexed field is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact-value matching (ids, statuses).
    Tag,
    /// Numeric range matching (prices, quantities).
    Numeric,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Tag => "TAG",
            FieldKind::Numeric => "NUMERIC",
        }
    }
}

/// A document field exposed to search under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    /// JSONPath of the field inside the document (e.g. `$.customerId`).
    pub path: String,

    /// Name used in search filters.
    pub alias: String,

    pub kind: FieldKind,
}

impl IndexField {
    /// Looks the field up in a JSON document.
    ///
    /// Supports dotted paths rooted at `$` (`$.a.b`).
    pub fn extract<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let path = self.path.strip_prefix('$').unwrap_or(&self.path);
        let pointer = path.replace('.', "/");
        document.pointer(&pointer)
    }
}

/// Secondary index over cached documents whose keys share a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub prefix: String,
    pub fields: Vec<IndexField>,
}

impl IndexDefinition {
    /// Creates an index with no fields.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a tag field.
    pub fn tag(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.fields.push(IndexField {
            path: path.into(),
            alias: alias.into(),
            kind: FieldKind::Tag,
        });
        self
    }

    /// Adds a numeric field.
    pub fn numeric(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.fields.push(IndexField {
            path: path.into(),
            alias: alias.into(),
            kind: FieldKind::Numeric,
        });
        self
    }

    /// Returns the field registered under `alias`.
    pub fn field(&self, alias: &str) -> Option<&IndexField> {
        self.fields.iter().find(|f| f.alias == alias)
    }
}

/// A single search condition on an indexed field alias.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    /// Field equals the value.
    Tag { field: String, value: String },

    /// Field lies within the inclusive bounds; `None` is unbounded.
    Range {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl SearchFilter {
    fn field(&self) -> &str {
        match self {
            SearchFilter::Tag { field, .. } | SearchFilter::Range { field, .. } => field,
        }
    }

    fn matches_value(&self, value: &Value) -> bool {
        match self {
            SearchFilter::Tag { value: wanted, .. } => match value {
                Value::String(s) => s == wanted,
                Value::Number(n) => n.to_string() == *wanted,
                Value::Bool(b) => b.to_string() == *wanted,
                _ => false,
            },
            SearchFilter::Range { min, max, .. } => match value.as_f64() {
                Some(v) => min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m),
                None => false,
            },
        }
    }
}

/// Builder for cache search queries.
///
/// All filters must match (logical AND). An empty query matches every
/// document in the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub filters: Vec<SearchFilter>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,

    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl SearchQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    pub fn tag(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(SearchFilter::Tag {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Requires `field` to lie within `[min, max]`.
    pub fn range(mut self, field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        self.filters.push(SearchFilter::Range {
            field: field.into(),
            min,
            max,
        });
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many documents before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .min(MAX_SEARCH_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Evaluates the query against a document using the index's field paths.
    ///
    /// Filters on aliases the index does not declare never match.
    pub fn matches(&self, index: &IndexDefinition, document: &Value) -> bool {
        self.filters.iter().all(|filter| {
            index
                .field(filter.field())
                .and_then(|field| field.extract(document))
                .is_some_and(|value| filter.matches_value(value))
        })
    }

    /// Renders the query in RediSearch syntax.
    pub fn to_redis_query(&self) -> String {
        if self.filters.is_empty() {
            return "*".to_string();
        }

        self.filters
            .iter()
            .map(|filter| match filter {
                SearchFilter::Tag { field, value } => {
                    format!("@{field}:{{{}}}", escape_tag(value))
                }
                SearchFilter::Range { field, min, max } => {
                    let min = min.map_or("-inf".to_string(), |m| m.to_string());
                    let max = max.map_or("+inf".to_string(), |m| m.to_string());
                    format!("@{field}:[{min} {max}]")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// RediSearch treats punctuation and whitespace in tag values as separators.
fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if !c.is_alphanumeric() && c != '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
