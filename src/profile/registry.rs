//! Catalogue of distortion profiles, looked up by id.

use std::sync::Arc;

use super::{builtin_profiles, DistortionProfile};
use crate::error::{DistortionError, Result};

/// Fixed catalogue of profiles.
///
/// The registry only answers lookups; the profile a scene uses is the
/// `Arc` handed out by [`select`](Self::select) and passed on explicitly.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Arc<DistortionProfile>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in profile
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        for profile in builtin_profiles()? {
            registry.register(profile)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, profile: DistortionProfile) -> Result<Arc<DistortionProfile>> {
        if self.profiles.iter().any(|p| p.id() == profile.id()) {
            return Err(DistortionError::DuplicateProfile(profile.id().to_string()));
        }
        let profile = Arc::new(profile);
        self.profiles.push(Arc::clone(&profile));
        Ok(profile)
    }

    pub fn select(&self, id: &str) -> Result<Arc<DistortionProfile>> {
        self.profiles
            .iter()
            .find(|p| p.id() == id)
            .cloned()
            .ok_or_else(|| DistortionError::UnknownProfile(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DistortionProfile>> {
        self.profiles.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.id())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
