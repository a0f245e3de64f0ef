//! Conversations: read-only access by id or through admin/user filters.
//!
//! Conversations have no external id or natural key and are started through
//! messages, so they get a client of their own with `view` and `list` only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::Authentication;
use crate::client::{authorized, member_url, Call};
use crate::config::{normalize_base_url, ClientConfig};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::resource::{missing_identifier, path_id, Identifier, Parameters, Resource};
use crate::types::Pages;
use crate::users::User;

const ENDPOINT: &str = "conversations";

/// An admin, user or bot taking part in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// The message that opened a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Participant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_since: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snoozed_until: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_message: Option<ConversationMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Participant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Participant>,
}

/// `conversation.list` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversations {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Pages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Filters for listing conversations, converted to `Parameters`.
///
/// A query is scoped either to an admin's inbox or to one user's
/// conversations; `open`, `unread` and `plaintext` narrow it further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationQuery {
    parameters: Parameters,
}

impl ConversationQuery {
    /// Conversations assigned to `admin_id`.
    pub fn admin(admin_id: &str) -> Result<Self, ApiError> {
        if admin_id.is_empty() {
            return Err(ApiError::invalid("'admin_id' is empty"));
        }
        Ok(Self::scoped("admin", "admin_id", admin_id))
    }

    /// Conversations of one user, picked by `id`, then `user_id`, then `email`.
    pub fn user(user: &User) -> Result<Self, ApiError> {
        let (key, value) = match Identifier::resolve(user) {
            Some(Identifier::Id(id)) => ("intercom_user_id", id),
            Some(Identifier::ExternalId(user_id)) => (User::EXTERNAL_ID_KEY, user_id),
            Some(Identifier::NaturalKey(email)) => (User::NATURAL_KEY, email),
            None => return Err(missing_identifier::<User>()),
        };
        Ok(Self::scoped("user", key, value))
    }

    fn scoped(kind: &str, key: &str, value: &str) -> Self {
        let mut parameters = Parameters::new();
        parameters.insert("type".to_string(), kind.to_string());
        parameters.insert(key.to_string(), value.to_string());
        Self { parameters }
    }

    pub fn open(mut self, open: bool) -> Self {
        self.parameters.insert("open".to_string(), open.to_string());
        self
    }

    pub fn unread(mut self, unread: bool) -> Self {
        self.parameters.insert("unread".to_string(), unread.to_string());
        self
    }

    /// Ask for message bodies as plain text instead of HTML.
    pub fn plaintext(mut self) -> Self {
        self.parameters.insert("display_as".to_string(), "plaintext".to_string());
        self
    }

    pub fn to_parameters(&self) -> Parameters {
        self.parameters.clone()
    }
}

impl From<ConversationQuery> for Parameters {
    fn from(query: ConversationQuery) -> Self {
        query.parameters
    }
}

#[derive(Clone)]
pub struct ConversationsClient {
    base_url: String,
    auth: Authentication,
}

impl fmt::Debug for ConversationsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationsClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

impl ConversationsClient {
    /// An empty `base_url` selects the default API host.
    pub fn new(base_url: &str, auth: Authentication) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            auth,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, config.auth.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn view(&self, id: &str) -> Result<Call<Conversation>, ApiError> {
        let url = member_url(&self.endpoint_url(), path_id(id)?)?;
        Ok(Call::new(authorized(&self.auth, HttpMethod::Get, url)))
    }

    /// List conversations. Parameters pass through unchanged; see
    /// `ConversationQuery` for the admin and user scopes.
    pub fn list(&self, parameters: Option<&Parameters>) -> Call<Conversations> {
        let mut request = authorized(&self.auth, HttpMethod::Get, self.endpoint_url());
        if let Some(parameters) = parameters {
            request = request.with_query(parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Call::new(request)
    }

    /// Only the first page is fetched; see `ResourceClient::next_page`.
    pub fn next_page(&self, _pages: &Pages) -> Result<Call<Conversations>, ApiError> {
        Err(ApiError::NotSupported("pagination"))
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{ENDPOINT}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;

    fn client() -> ConversationsClient {
        ConversationsClient::new("http://localhost:3000", Authentication::token("tok"))
    }

    #[test]
    fn view_by_id_uses_path() {
        let call = client().view("147").unwrap();
        let req = call.request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/conversations/147");
        assert!(req.query.is_empty());
        assert!(req.body.is_none());
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn view_rejects_empty_and_dot_ids() {
        for id in ["", ".", ".."] {
            assert!(matches!(client().view(id), Err(ApiError::InvalidArgument(_))));
        }
    }

    #[test]
    fn view_escapes_the_id() {
        let call = client().view("1/reply").unwrap();
        assert_eq!(call.request().url, "http://localhost:3000/conversations/1%2Freply");
    }

    #[test]
    fn admin_query_with_filters() {
        let query = ConversationQuery::admin("25").unwrap().open(true).plaintext();
        let call = client().list(Some(&query.into()));
        let req = call.request();
        assert_eq!(req.url, "http://localhost:3000/conversations");
        assert_eq!(req.query_param("type"), Some("admin"));
        assert_eq!(req.query_param("admin_id"), Some("25"));
        assert_eq!(req.query_param("open"), Some("true"));
        assert_eq!(req.query_param("display_as"), Some("plaintext"));
    }

    #[test]
    fn admin_query_needs_an_id() {
        assert!(matches!(ConversationQuery::admin(""), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn user_query_follows_identifier_precedence() {
        let by_id = User {
            id: Some("5310d8e7".to_string()),
            email: Some("wash@serenity.io".to_string()),
            ..User::default()
        };
        let parameters = ConversationQuery::user(&by_id).unwrap().to_parameters();
        assert_eq!(parameters.get("type").map(String::as_str), Some("user"));
        assert_eq!(parameters.get("intercom_user_id").map(String::as_str), Some("5310d8e7"));
        assert!(!parameters.contains_key("email"));

        let by_email = User {
            email: Some("wash@serenity.io".to_string()),
            ..User::default()
        };
        let parameters = ConversationQuery::user(&by_email).unwrap().unread(false).to_parameters();
        assert_eq!(parameters.get("email").map(String::as_str), Some("wash@serenity.io"));
        assert_eq!(parameters.get("unread").map(String::as_str), Some("false"));

        assert!(matches!(
            ConversationQuery::user(&User::default()),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn list_passes_parameters_through() {
        let mut parameters = Parameters::new();
        parameters.insert("order".to_string(), "updated".to_string());
        let call = client().list(Some(&parameters));
        assert_eq!(
            call.request().query,
            vec![("order".to_string(), "updated".to_string())]
        );
        assert!(client().list(None).request().query.is_empty());
    }

    #[test]
    fn next_page_is_not_supported() {
        let err = client().next_page(&Pages::default()).unwrap_err();
        assert!(matches!(err, ApiError::NotSupported("pagination")));
    }

    #[test]
    fn conversation_decodes_nested_parts() {
        let body = r#"{"type":"conversation","id":"147","created_at":1400850973,"open":true,
            "read":false,"user":{"type":"user","id":"536e564f"},
            "assignee":{"type":"nobody_admin","id":null},
            "conversation_message":{"type":"conversation_message","id":"29","subject":"",
                "body":"<p>Hi</p>","author":{"type":"user","id":"536e564f"}}}"#;
        let conversation = client()
            .view("147")
            .unwrap()
            .parse(&HttpResponse::new(200, body))
            .into_result()
            .unwrap();
        assert_eq!(conversation.open, Some(true));
        assert_eq!(conversation.assignee.and_then(|a| a.kind).as_deref(), Some("nobody_admin"));
        let message = conversation.conversation_message.unwrap();
        assert_eq!(message.body.as_deref(), Some("<p>Hi</p>"));
        assert_eq!(message.author.and_then(|a| a.id).as_deref(), Some("536e564f"));
    }

    #[test]
    fn missing_conversation_is_not_found() {
        let body = r#"{"type":"error.list","errors":[{"code":"not_found","message":"Conversation Not Found"}]}"#;
        let err = client()
            .view("9")
            .unwrap()
            .parse(&HttpResponse::new(404, body))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
