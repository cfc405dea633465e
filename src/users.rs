use dashmap::DashMap;

/// Profile for a user currently in some room.
///
/// The credential is the user's external provider token handle; it stays
/// inside the process and is never serialized into snapshots or events.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub is_host: bool,
    pub credential: Option<String>,
}

/// In-memory user registry.
///
/// Entries live from room create/join until the user leaves. Nothing
/// survives process restart.
pub struct UserRegistry {
    users: DashMap<String, UserProfile>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.user_id.clone(), profile);
    }

    pub fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.users.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, user_id: &str) {
        self.users.remove(user_id);
    }

    /// Update the host flag after a transfer or leave-triggered promotion.
    pub fn set_host(&self, user_id: &str, is_host: bool) {
        if let Some(mut entry) = self.users.get_mut(user_id) {
            entry.value_mut().is_host = is_host;
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
