//! User records and user-only mutations.
//!
//! Users are identified by `id`, then `user_id`, then `email`. The mutations
//! below post a small fixed body to `/users` rather than the whole record, and
//! all of them need the primary id.

use serde::{Deserialize, Serialize, Serializer};

use crate::client::{Call, ResourceClient};
use crate::companies::Companies;
use crate::error::ApiError;
use crate::resource::{present, PrimaryId, Resource};
use crate::types::{CustomAttributes, Pages};

pub type UsersClient = ResourceClient<User>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "type", default, skip_serializing)]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing)]
    pub pseudonym: Option<String>,
    #[serde(default, skip_serializing)]
    pub anonymous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_up_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsubscribed_from_emails: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<CustomAttributes>,
    /// Companies the user belongs to. Sent as a plain array, which attaches
    /// each entry on upsert; detaching goes through `remove_companies`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "companies_as_array"
    )]
    pub companies: Option<Companies>,
}

/// The API reads `companies` as an array on input but returns a `company.list`.
fn companies_as_array<S: Serializer>(
    companies: &Option<Companies>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match companies {
        Some(list) => list.companies.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// `user.list` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Users {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Pages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl Resource for User {
    const ENDPOINT: &'static str = "users";
    const EXTERNAL_ID_KEY: &'static str = "user_id";
    const NATURAL_KEY: &'static str = "email";

    type List = Users;

    fn id(&self) -> Option<&str> {
        present(self.id.as_deref())
    }

    fn external_id(&self) -> Option<&str> {
        present(self.user_id.as_deref())
    }

    fn natural_key(&self) -> Option<&str> {
        present(self.email.as_deref())
    }
}

impl PrimaryId for User {
    fn primary_id(&self) -> Option<&str> {
        present(self.id.as_deref())
    }
}

#[derive(Serialize)]
struct LastSeenAt<'a> {
    id: &'a str,
    last_request_at: i64,
}

#[derive(Serialize)]
struct LastSeenNow<'a> {
    id: &'a str,
    update_last_request_at: bool,
}

#[derive(Serialize)]
struct NewSession<'a> {
    id: &'a str,
    new_session: bool,
}

#[derive(Serialize)]
struct DetachCompanies<'a> {
    id: &'a str,
    companies: Vec<CompanyRemoval<'a>>,
}

#[derive(Serialize)]
struct CompanyRemoval<'a> {
    id: &'a str,
    remove: bool,
}

fn require_id<T: PrimaryId + ?Sized>(target: &T) -> Result<&str, ApiError> {
    target
        .primary_id()
        .ok_or_else(|| ApiError::invalid("the user's 'id' is required"))
}

impl ResourceClient<User> {
    /// Record a last-seen time (epoch seconds, strictly positive).
    pub fn update_last_seen_at<T>(&self, target: &T, timestamp: i64) -> Result<Call<User>, ApiError>
    where
        T: PrimaryId + ?Sized,
    {
        let id = require_id(target)?;
        if timestamp <= 0 {
            return Err(ApiError::invalid(format!(
                "'timestamp' must be greater than zero, got {timestamp}"
            )));
        }
        self.post(&LastSeenAt {
            id,
            last_request_at: timestamp,
        })
    }

    /// Ask the server to stamp the user as seen now.
    pub fn update_last_seen_now<T>(&self, target: &T) -> Result<Call<User>, ApiError>
    where
        T: PrimaryId + ?Sized,
    {
        let id = require_id(target)?;
        self.post(&LastSeenNow {
            id,
            update_last_request_at: true,
        })
    }

    pub fn increment_session<T>(&self, target: &T) -> Result<Call<User>, ApiError>
    where
        T: PrimaryId + ?Sized,
    {
        let id = require_id(target)?;
        self.post(&NewSession {
            id,
            new_session: true,
        })
    }

    /// Detach the user from each company in `company_ids`.
    pub fn remove_companies<T, S>(&self, target: &T, company_ids: &[S]) -> Result<Call<User>, ApiError>
    where
        T: PrimaryId + ?Sized,
        S: AsRef<str>,
    {
        let id = require_id(target)?;
        if company_ids.is_empty() {
            return Err(ApiError::invalid("'company_ids' must not be empty"));
        }
        let companies = company_ids
            .iter()
            .map(|company_id| {
                present(Some(company_id.as_ref()))
                    .map(|id| CompanyRemoval { id, remove: true })
                    .ok_or_else(|| ApiError::invalid("'company_ids' must not contain empty ids"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.post(&DetachCompanies { id, companies })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authentication;
    use crate::companies::Company;
    use crate::http::HttpMethod;

    fn client() -> UsersClient {
        UsersClient::new("http://localhost:3000", Authentication::token("tok"))
    }

    fn body(call: &Call<User>) -> serde_json::Value {
        serde_json::from_str(call.request().body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn last_seen_at_rejects_non_positive_timestamps() {
        for timestamp in [0, -1, -1000] {
            let err = client().update_last_seen_at("42", timestamp).unwrap_err();
            assert!(
                matches!(err, ApiError::InvalidArgument(_)),
                "timestamp {timestamp} should be rejected"
            );
        }
    }

    #[test]
    fn last_seen_at_sends_timestamp_verbatim() {
        for timestamp in [1, 1_500_000_000, i64::MAX] {
            let call = client().update_last_seen_at("42", timestamp).unwrap();
            assert_eq!(call.request().method, HttpMethod::Post);
            assert_eq!(call.request().url, "http://localhost:3000/users");
            assert_eq!(
                body(&call),
                serde_json::json!({"id": "42", "last_request_at": timestamp})
            );
        }
    }

    #[test]
    fn last_seen_at_requires_primary_id() {
        let user = User {
            email: Some("a@b.c".to_string()),
            ..User::default()
        };
        let err = client().update_last_seen_at(&user, 10).unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(client().update_last_seen_at("", 10).is_err());
    }

    #[test]
    fn last_seen_now_body() {
        let user = User {
            id: Some("42".to_string()),
            ..User::default()
        };
        let call = client().update_last_seen_now(&user).unwrap();
        assert_eq!(
            body(&call),
            serde_json::json!({"id": "42", "update_last_request_at": true})
        );
    }

    #[test]
    fn increment_session_body() {
        let call = client().increment_session(&"42".to_string()).unwrap();
        assert_eq!(body(&call), serde_json::json!({"id": "42", "new_session": true}));
    }

    #[test]
    fn remove_companies_body() {
        let call = client().remove_companies("42", &["c1", "c2"]).unwrap();
        assert_eq!(
            body(&call),
            serde_json::json!({
                "id": "42",
                "companies": [{"id": "c1", "remove": true}, {"id": "c2", "remove": true}]
            })
        );
    }

    #[test]
    fn remove_companies_rejects_empty_list_and_blank_ids() {
        let none: [&str; 0] = [];
        assert!(matches!(
            client().remove_companies("42", &none).unwrap_err(),
            ApiError::InvalidArgument(_)
        ));
        assert!(matches!(
            client().remove_companies("42", &["c1", ""]).unwrap_err(),
            ApiError::InvalidArgument(_)
        ));
    }

    #[test]
    fn server_only_fields_are_not_sent() {
        let user = User {
            kind: Some("user".to_string()),
            id: Some("42".to_string()),
            created_at: Some(1),
            session_count: Some(3),
            ..User::default()
        };
        let call = client().update(&user).unwrap();
        assert_eq!(body(&call), serde_json::json!({"id": "42"}));
    }

    #[test]
    fn companies_are_sent_as_an_array() {
        let user = User {
            user_id: Some("u1".to_string()),
            companies: Some(Companies {
                kind: Some("company.list".to_string()),
                companies: vec![Company {
                    kind: Some("company".to_string()),
                    company_id: Some("acme".to_string()),
                    name: Some("Acme".to_string()),
                    ..Company::default()
                }],
                ..Companies::default()
            }),
            ..User::default()
        };
        let call = client().create(&user).unwrap();
        assert_eq!(
            body(&call),
            serde_json::json!({
                "user_id": "u1",
                "companies": [{"company_id": "acme", "name": "Acme"}]
            })
        );
    }

    #[test]
    fn user_decodes_embedded_companies() {
        let user: User = serde_json::from_str(
            r#"{"type":"user","id":"1","user_id":"u1","session_count":2,
                "companies":{"type":"company.list","companies":[{"type":"company","id":"c1","name":"Acme"}]},
                "custom_attributes":{"plan":"pro","seats":3}}"#,
        )
        .unwrap();
        assert_eq!(user.session_count, Some(2));
        let companies = user.companies.unwrap().companies;
        assert_eq!(companies[0].name.as_deref(), Some("Acme"));
        assert_eq!(
            user.custom_attributes.unwrap().get("seats"),
            Some(&serde_json::json!(3))
        );
    }
}
