//! Resource kinds and identifier resolution.
//!
//! # Design
//! Every resource exposes up to three identifying fields: the server-assigned
//! primary id, a caller-supplied external id, and a natural key. Lookups pick
//! exactly one of them in that order; the primary id goes in the path, the
//! others go in the query string. Empty strings count as absent.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// Filter and lookup parameters sent as the query string.
pub type Parameters = BTreeMap<String, String>;

/// A kind of remotely managed record living under a fixed endpoint.
pub trait Resource: Serialize + DeserializeOwned + Send + 'static {
    /// Path segment under the base URL, e.g. `users`.
    const ENDPOINT: &'static str;
    /// Query key for the external id, e.g. `user_id`.
    const EXTERNAL_ID_KEY: &'static str;
    /// Query key for the natural key, e.g. `email`.
    const NATURAL_KEY: &'static str;

    /// Wrapper returned by list requests.
    type List: DeserializeOwned + Send + 'static;

    fn id(&self) -> Option<&str>;
    fn external_id(&self) -> Option<&str>;
    fn natural_key(&self) -> Option<&str>;
}

/// How a single record is addressed by view and delete.
#[derive(Debug)]
pub enum Lookup<'a, R> {
    Id(&'a str),
    Record(&'a R),
    Parameters(&'a Parameters),
}

/// The identifying field chosen for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    Id(&'a str),
    ExternalId(&'a str),
    NaturalKey(&'a str),
}

impl<'a> Identifier<'a> {
    /// Pick the highest-precedence identifier present on `record`.
    pub fn resolve<R: Resource>(record: &'a R) -> Option<Self> {
        if let Some(id) = record.id() {
            return Some(Identifier::Id(id));
        }
        if let Some(external_id) = record.external_id() {
            return Some(Identifier::ExternalId(external_id));
        }
        record.natural_key().map(Identifier::NaturalKey)
    }
}

/// Where a resolved lookup puts its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Path(String),
    Query(Vec<(String, String)>),
}

impl<'a, R: Resource> Lookup<'a, R> {
    pub(crate) fn target(&self) -> Result<Target, ApiError> {
        match self {
            Lookup::Id(id) => Ok(Target::Path(path_id(id)?.to_string())),
            Lookup::Record(record) => match Identifier::resolve(*record) {
                Some(Identifier::Id(id)) => Ok(Target::Path(path_id(id)?.to_string())),
                Some(Identifier::ExternalId(value)) => Ok(query_pair(R::EXTERNAL_ID_KEY, value)),
                Some(Identifier::NaturalKey(value)) => Ok(query_pair(R::NATURAL_KEY, value)),
                None => Err(missing_identifier::<R>()),
            },
            Lookup::Parameters(parameters) => {
                if parameters.is_empty() {
                    return Err(ApiError::invalid("'parameters' must not be empty"));
                }
                Ok(Target::Query(
                    parameters
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ))
            }
        }
    }
}

/// A primary id usable as `<resource>/<id>`. Dot segments would collapse into
/// the collection itself.
pub(crate) fn path_id(id: &str) -> Result<&str, ApiError> {
    let id = present(Some(id)).ok_or_else(|| ApiError::invalid("'id' is empty"))?;
    if matches!(id, "." | "..") {
        return Err(ApiError::invalid(format!("'id' is not a valid path segment: {id:?}")));
    }
    Ok(id)
}

fn query_pair(key: &str, value: &str) -> Target {
    Target::Query(vec![(key.to_string(), value.to_string())])
}

pub(crate) fn missing_identifier<R: Resource>() -> ApiError {
    ApiError::invalid(format!(
        "provide one of 'id', '{}' or '{}' for {}",
        R::EXTERNAL_ID_KEY,
        R::NATURAL_KEY,
        R::ENDPOINT
    ))
}

/// `Some` only for non-empty values.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Anything that can name a record by its primary id.
pub trait PrimaryId {
    fn primary_id(&self) -> Option<&str>;
}

impl PrimaryId for str {
    fn primary_id(&self) -> Option<&str> {
        present(Some(self))
    }
}

impl PrimaryId for String {
    fn primary_id(&self) -> Option<&str> {
        present(Some(self.as_str()))
    }
}

/// Sort field for list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    CreatedAt,
    UpdatedAt,
    SignedUpAt,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::UpdatedAt => "updated_at",
            SortBy::SignedUpAt => "signed_up_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Builder for list filters, converted to `Parameters`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    sort: Option<SortBy>,
    order: Option<Order>,
    per_page: Option<u32>,
    filters: Parameters,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: SortBy) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Add a free-form filter such as `tag_id` or `segment_id`.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn to_parameters(&self) -> Parameters {
        let mut parameters = self.filters.clone();
        if let Some(sort) = self.sort {
            parameters.insert("sort".to_string(), sort.as_str().to_string());
        }
        if let Some(order) = self.order {
            parameters.insert("order".to_string(), order.as_str().to_string());
        }
        if let Some(per_page) = self.per_page {
            parameters.insert("per_page".to_string(), per_page.to_string());
        }
        parameters
    }
}

impl From<ListOptions> for Parameters {
    fn from(options: ListOptions) -> Self {
        options.to_parameters()
    }
}
