//! Message provider contract and the display records derived from it.
//!
//! The cache never fetches data. Callers hand it values implementing
//! [`ChatMessage`], and the cache reads the author and quoted-message fields
//! through that trait whenever it needs to derive something.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Opaque identity of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Role of a user within a channel.
///
/// Unknown role names are kept verbatim in [`UserRole::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Admin,
    Moderator,
    Member,
    Guest,
    Custom(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
            UserRole::Member => "member",
            UserRole::Guest => "guest",
            UserRole::Custom(name) => name,
        }
    }
}

impl From<String> for UserRole {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "moderator" => UserRole::Moderator,
            "member" | "user" => UserRole::Member,
            "guest" => UserRole::Guest,
            _ => UserRole::Custom(raw),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author record as exposed by the message provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: Option<String>,
    pub image_url: Option<Url>,
    pub role: Option<UserRole>,
}

impl Author {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            image_url: None,
            role: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image_url(mut self, url: Url) -> Self {
        self.image_url = Some(url);
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Minimal user-facing projection of an author, as rendered next to a message.
///
/// Immutable once built; a changed author produces a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDisplayInfo {
    id: UserId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<UserRole>,
}

impl UserDisplayInfo {
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        image_url: Option<Url>,
        role: Option<UserRole>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            image_url,
            role,
        }
    }

    /// Build the display record for an author.
    ///
    /// A missing or blank name falls back to the author's id.
    pub fn from_author(author: &Author) -> Self {
        let name = match author.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => author.id.as_str().to_string(),
        };
        Self {
            id: author.id.clone(),
            name,
            image_url: author.image_url.clone(),
            role: author.role.clone(),
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    pub fn role(&self) -> Option<&UserRole> {
        self.role.as_ref()
    }
}

/// A message as supplied by the host's message store.
///
/// `author()` and `quoted_message()` are only called on a cache miss (or on
/// every lookup in direct mode), so implementations may do real work there.
pub trait ChatMessage: Sized {
    fn id(&self) -> &MessageId;

    fn author(&self) -> Author;

    fn quoted_message(&self) -> Option<Self>;
}
