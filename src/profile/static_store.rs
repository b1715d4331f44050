//! Profile store backed by the `[[profiles]]` section of the config file

use async_trait::async_trait;
use std::collections::HashMap;

use super::{Caller, Profile, ProfileStore};
use crate::config::ProfileEntry;
use crate::error::AppResult;

/// In-memory profiles keyed by caller bearer token
#[derive(Debug, Default)]
pub struct StaticProfileStore {
    by_token: HashMap<String, Profile>,
}

impl StaticProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured profile entries
    pub fn from_entries(entries: &[ProfileEntry]) -> Self {
        let by_token = entries
            .iter()
            .map(|entry| {
                let profile = Profile::new(
                    entry.user_id.clone(),
                    entry.openai_api_key.clone(),
                    entry.openai_organization_id.clone(),
                );
                (entry.token.clone(), profile)
            })
            .collect();
        Self { by_token }
    }

    /// Add or replace the profile for `token`
    pub fn insert(&mut self, token: impl Into<String>, profile: Profile) {
        self.by_token.insert(token.into(), profile);
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[async_trait]
impl ProfileStore for StaticProfileStore {
    async fn load_profile(&self, caller: &Caller) -> AppResult<Option<Profile>> {
        let Some(token) = caller.token() else {
            return Ok(None);
        };
        Ok(self.by_token.get(token).cloned())
    }
}
