//! Structured query options.
//!
//! [`QueryOptions`] is the typed form of the `$`-prefixed system query options
//! a client sends (`$top`, `$skip`, `$count`, `$select`, `$expand`,
//! `$orderby`, `$filter`, `$resultFormat`). Parsing is shallow: values are
//! typed and comma lists are split, but `$filter` is kept as an opaque string
//! for the storage engine to interpret.
//!
//! The original `(key, value)` pairs are retained in request order so that a
//! continuation link can reproduce every option the client sent.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kinds of system query option a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOptionKind {
    /// `$filter`
    Filter,
    /// `$expand`
    Expand,
    /// `$select`
    Select,
    /// `$orderby`
    OrderBy,
    /// `$top`
    Top,
    /// `$skip`
    Skip,
    /// `$count`
    Count,
    /// `$resultFormat`
    ResultFormat,
}

impl QueryOptionKind {
    /// All option kinds.
    pub const ALL: [QueryOptionKind; 8] = [
        QueryOptionKind::Filter,
        QueryOptionKind::Expand,
        QueryOptionKind::Select,
        QueryOptionKind::OrderBy,
        QueryOptionKind::Top,
        QueryOptionKind::Skip,
        QueryOptionKind::Count,
        QueryOptionKind::ResultFormat,
    ];

    /// Returns the query string key, including the `$` prefix.
    pub fn key(&self) -> &'static str {
        match self {
            QueryOptionKind::Filter => "$filter",
            QueryOptionKind::Expand => "$expand",
            QueryOptionKind::Select => "$select",
            QueryOptionKind::OrderBy => "$orderby",
            QueryOptionKind::Top => "$top",
            QueryOptionKind::Skip => "$skip",
            QueryOptionKind::Count => "$count",
            QueryOptionKind::ResultFormat => "$resultFormat",
        }
    }

    /// Looks up an option kind by its query string key, ignoring case.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for QueryOptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Sort direction for `$orderby`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending (the default).
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// One `$orderby` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The property to sort on.
    pub property: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Alternative collection encodings selected with `$resultFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    /// Observations grouped per Datastream as component rows.
    DataArray,
}

/// Errors produced while typing raw query options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryOptionError {
    /// A `$` option that is not part of the vocabulary.
    #[error("unknown query option '{0}'")]
    UnknownOption(String),

    /// The same option was given more than once.
    #[error("query option '{0}' given more than once")]
    Duplicate(QueryOptionKind),

    /// The value could not be typed.
    #[error("invalid value '{value}' for {kind}: {reason}")]
    InvalidValue {
        /// The option.
        kind: QueryOptionKind,
        /// The offending raw value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// The structured option set of a read request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `$top`: maximum number of items to return.
    pub top: Option<u32>,
    /// `$skip`: number of items to skip.
    pub skip: Option<u32>,
    /// `$count`: whether to report the total count.
    pub count: Option<bool>,
    /// `$select`: properties to project.
    pub select: Option<Vec<String>>,
    /// `$expand`: navigation properties to inline.
    pub expand: Option<Vec<String>>,
    /// `$orderby`: sort terms.
    pub order_by: Option<Vec<OrderBy>>,
    /// `$filter`: the raw filter expression.
    pub filter: Option<String>,
    /// `$resultFormat`.
    pub result_format: Option<ResultFormat>,

    pairs: Vec<(String, String)>,
}

impl QueryOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (percent-encoded) query string.
    pub fn parse(query: &str) -> Result<Self, QueryOptionError> {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Builds an option set from decoded `(key, value)` pairs.
    ///
    /// Keys without a leading `$` are not system query options and are
    /// ignored here, though they are still kept for continuation links.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, QueryOptionError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut options = QueryOptions::default();
        let mut seen = Vec::new();

        for (key, value) in pairs {
            if key.starts_with('$') {
                let kind = QueryOptionKind::from_key(&key)
                    .ok_or_else(|| QueryOptionError::UnknownOption(key.clone()))?;
                if seen.contains(&kind) {
                    return Err(QueryOptionError::Duplicate(kind));
                }
                seen.push(kind);
                options.apply(kind, &value)?;
            }
            options.pairs.push((key, value));
        }

        Ok(options)
    }

    fn apply(&mut self, kind: QueryOptionKind, value: &str) -> Result<(), QueryOptionError> {
        let invalid = |reason| QueryOptionError::InvalidValue {
            kind,
            value: value.to_string(),
            reason,
        };

        match kind {
            QueryOptionKind::Top | QueryOptionKind::Skip => {
                let n: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("expected a non-negative integer"))?;
                if kind == QueryOptionKind::Top {
                    self.top = Some(n);
                } else {
                    self.skip = Some(n);
                }
            }
            QueryOptionKind::Count => {
                self.count = Some(match value.trim().to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid("expected true or false")),
                });
            }
            QueryOptionKind::Select => {
                let select = split_list(value).ok_or_else(|| invalid("expected a property list"))?;
                self.select = Some(select);
            }
            QueryOptionKind::Expand => {
                let expand =
                    split_list(value).ok_or_else(|| invalid("expected a navigation list"))?;
                self.expand = Some(expand);
            }
            QueryOptionKind::OrderBy => {
                let terms = split_list(value).ok_or_else(|| invalid("expected a property list"))?;
                let order_by = terms
                    .into_iter()
                    .map(|term| parse_order_term(&term))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid("expected '<property> [asc|desc]'"))?;
                self.order_by = Some(order_by);
            }
            QueryOptionKind::Filter => {
                if value.trim().is_empty() {
                    return Err(invalid("expected an expression"));
                }
                self.filter = Some(value.to_string());
            }
            QueryOptionKind::ResultFormat => {
                if !value.trim().eq_ignore_ascii_case("dataArray") {
                    return Err(invalid("expected dataArray"));
                }
                self.result_format = Some(ResultFormat::DataArray);
            }
        }

        Ok(())
    }

    /// Returns the option kinds present, in request order.
    pub fn requested(&self) -> Vec<QueryOptionKind> {
        let mut kinds = Vec::new();
        for (key, _) in &self.pairs {
            if let Some(kind) = QueryOptionKind::from_key(key)
                && !kinds.contains(&kind)
            {
                kinds.push(kind);
            }
        }
        kinds
    }

    /// Returns true if the request carried the given option.
    pub fn contains(&self, kind: QueryOptionKind) -> bool {
        self.requested().contains(&kind)
    }

    /// Returns the original decoded pairs, in request order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns the pairs with `$skip` set to `skip`.
    ///
    /// An existing `$skip` keeps its position; otherwise one is appended.
    pub fn pairs_with_skip(&self, skip: u32) -> Vec<(String, String)> {
        let skip_key = QueryOptionKind::Skip.key();
        let mut replaced = false;
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case(skip_key) {
                    replaced = true;
                    (key.clone(), skip.to_string())
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();
        if !replaced {
            pairs.push((skip_key.to_string(), skip.to_string()));
        }
        pairs
    }

    /// Sets `$top`, recording it as if the client had sent it.
    pub fn with_top(mut self, top: u32) -> Self {
        let top_key = QueryOptionKind::Top.key();
        match self
            .pairs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(top_key))
        {
            Some(pair) => pair.1 = top.to_string(),
            None => self.pairs.push((top_key.to_string(), top.to_string())),
        }
        self.top = Some(top);
        self
    }

    /// `$skip`, defaulting to zero.
    pub fn skip_or_zero(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    /// Whether the total count should be reported. Defaults to true.
    pub fn include_count(&self) -> bool {
        self.count.unwrap_or(true)
    }
}

fn split_list(value: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(|item| item.trim().to_string())
        .collect();
    if items.iter().any(String::is_empty) {
        None
    } else {
        Some(items)
    }
}

fn parse_order_term(term: &str) -> Option<OrderBy> {
    let mut parts = term.split_whitespace();
    let property = parts.next()?.to_string();
    let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(OrderBy {
        property,
        direction,
    })
}
