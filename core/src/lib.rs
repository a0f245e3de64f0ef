//! Typed client core for the Intercom REST API.
//!
//! # Overview
//! Resource clients validate arguments and build `HttpRequest` values without
//! touching the network (host-does-IO pattern). A `Transport` executes the
//! round-trip; the response is decoded through an `Envelope` into a typed
//! record or an `ApiError`.
//!
//! # Design
//! - `ResourceClient<R>` is stateless: a base URL and credentials.
//! - Every operation returns a `Call<T>`; `send` runs it on a blocking
//!   transport and `send_async` on an async one. Validation happens once,
//!   before either.
//! - View and delete take a `Lookup`; records resolve their identifier as
//!   primary id, then external id, then natural key.
//! - Conversations are read-only: `ConversationsClient` views by id and lists
//!   through admin or user scopes.
//!
//! ```no_run
//! # #[cfg(feature = "blocking")]
//! # fn main() -> Result<(), intercom_core::ApiError> {
//! use intercom_core::{ClientConfig, Lookup, UreqTransport, User, UsersClient};
//!
//! let config = ClientConfig::from_env()?;
//! let users = UsersClient::from_config(&config);
//! let transport = UreqTransport::new();
//!
//! let user = users.view(Lookup::Id("5310d8e7598c9a0b24000002"))?.send(&transport)?;
//! users.update_last_seen_now(&user)?.send(&transport)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "blocking"))]
//! # fn main() {}
//! ```

pub mod auth;
pub mod client;
pub mod companies;
pub mod config;
pub mod conversations;
pub mod envelope;
pub mod error;
pub mod http;
pub mod resource;
pub mod transport;
pub mod types;
pub mod users;

pub use auth::Authentication;
pub use client::{Call, ResourceClient};
pub use companies::{CompaniesClient, Company, Companies, Plan};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use conversations::{
    Conversation, ConversationMessage, ConversationQuery, Conversations, ConversationsClient,
    Participant,
};
pub use envelope::Envelope;
pub use error::{ApiError, ErrorDetail, ErrorList};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{
    Identifier, ListOptions, Lookup, Order, Parameters, PrimaryId, Resource, SortBy,
};
pub use transport::{AsyncTransport, Transport};
#[cfg(feature = "async-reqwest")]
pub use transport::ReqwestTransport;
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use types::{CustomAttributes, Pages};
pub use users::{User, Users, UsersClient};
