//! Company records: identified by `id`, then `company_id`, then `name`.

use serde::{Deserialize, Serialize};

use crate::client::ResourceClient;
use crate::resource::{present, PrimaryId, Resource};
use crate::types::{CustomAttributes, Pages};

pub type CompaniesClient = ResourceClient<Company>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "type", default, skip_serializing)]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_created_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_spend: Option<f64>,
    #[serde(default, skip_serializing)]
    pub session_count: Option<u32>,
    #[serde(default, skip_serializing)]
    pub user_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing)]
    pub plan: Option<Plan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<CustomAttributes>,
}

/// `company.list` wrapper, also embedded in user records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Companies {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Pages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl Resource for Company {
    const ENDPOINT: &'static str = "companies";
    const EXTERNAL_ID_KEY: &'static str = "company_id";
    const NATURAL_KEY: &'static str = "name";

    type List = Companies;

    fn id(&self) -> Option<&str> {
        present(self.id.as_deref())
    }

    fn external_id(&self) -> Option<&str> {
        present(self.company_id.as_deref())
    }

    fn natural_key(&self) -> Option<&str> {
        present(self.name.as_deref())
    }
}

impl PrimaryId for Company {
    fn primary_id(&self) -> Option<&str> {
        present(self.id.as_deref())
    }
}
