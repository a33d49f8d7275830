// apps/marketplace/src/services/users.rs

use serde::Deserialize;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::UserProfile;
use crate::store::{self, Collection, DocumentStore};

/// Fields a user may change on their own profile. Role is not client-settable.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub name: Option<String>,
  pub college: Option<String>,
}

/// Writes the caller's profile, creating it from `current` if it was
/// transient. Only `name` and `college` come from the client.
#[instrument(name = "users::upsert_own", skip(store, current, update), fields(user_id = %current.id))]
pub async fn upsert_own_profile(
  store: &dyn DocumentStore,
  current: &UserProfile,
  update: ProfileUpdate,
) -> Result<UserProfile> {
  let mut profile = match store::load::<UserProfile>(store, Collection::Users, &current.id).await? {
    Some(stored) => stored.doc,
    None => current.clone(),
  };
  if let Some(name) = update.name {
    let name = name.trim();
    if name.is_empty() {
      return Err(AppError::InvalidState("Name cannot be blank".to_string()));
    }
    profile.name = name.to_string();
  }
  if let Some(college) = update.college {
    let college = college.trim();
    profile.college = (!college.is_empty()).then(|| college.to_string());
  }
  store::save(store, Collection::Users, &profile.id, &profile).await?;
  info!("Profile saved.");
  Ok(profile)
}

/// Display name for a user id, `None` if no profile is stored.
pub async fn display_name(store: &dyn DocumentStore, user_id: &str) -> Result<Option<String>> {
  Ok(
    store::load::<UserProfile>(store, Collection::Users, user_id)
      .await?
      .map(|v| v.doc.name),
  )
}
