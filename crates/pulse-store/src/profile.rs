//! User profile record

use serde::{Deserialize, Serialize};

/// The signed-in user's profile as cached on the device.
///
/// Every field is optional; the default profile (nothing set) means "no user"
/// and encodes to `{}`. Unknown fields are ignored on decode so older builds
/// can read profiles written by newer ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    /// Server-side user identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar image location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Session access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Session refresh token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl UserProfile {
    /// A profile with only the display name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Whether this is the default "no user" profile
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encodes_to_empty_object() {
        assert_eq!(serde_json::to_string(&UserProfile::default()).unwrap(), "{}");
        assert!(UserProfile::default().is_empty());
    }

    #[test]
    fn test_named_profile_encoding() {
        let json = serde_json::to_string(&UserProfile::named("Ada")).unwrap();
        assert_eq!(json, r#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_unknown_and_missing_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"name":"Ada","avatarUrl":"a.png","theme":"dark"}"#).unwrap();
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.avatar_url.as_deref(), Some("a.png"));
        assert_eq!(profile.email, None);
    }
}
