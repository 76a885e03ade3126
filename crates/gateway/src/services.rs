//! Collaborator seams for concerns owned outside this subsystem.

use async_trait::async_trait;
use serde::Serialize;

/// Display fields for a user, as shown in call-history listings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub name: Option<String>,
    pub profile_pic: Option<String>,
}

/// Resolves user ids to display fields. Backed by the profile CRUD service
/// in production; the noop implementation leaves the fields empty.
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn display_fields(&self, user_id: &str) -> ProfileFields;
}

pub struct NoopProfileService;

#[async_trait]
impl ProfileService for NoopProfileService {
    async fn display_fields(&self, _user_id: &str) -> ProfileFields {
        ProfileFields::default()
    }
}
