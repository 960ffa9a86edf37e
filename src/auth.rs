/// Family membership checks
///
/// Identity itself comes from an external sign-in provider; the core
/// only decides "is this a family member" and "is this an admin" by
/// matching the signed-in user against a configured allow-list. The
/// list lives in a JSON file next to the catalog.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AlbumError;
use crate::state::data::SignedInUser;

/// The configured allow-list of family members and admins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Emails allowed to view and upload
    #[serde(default)]
    pub members: Vec<String>,
    /// Uids with admin rights (rebuild triggers, removals of any photo)
    #[serde(default)]
    pub admins: Vec<String>,
}

impl FamilyConfig {
    /// Load the allow-list from a JSON file
    pub fn load(path: &Path) -> Result<Self, AlbumError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn to_json(&self) -> Result<String, AlbumError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_member(&self, user: &SignedInUser) -> bool {
        self.members.iter().any(|email| email == &user.email)
    }

    pub fn is_admin(&self, user: &SignedInUser) -> bool {
        self.admins.iter().any(|uid| uid == &user.uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, uid: &str) -> SignedInUser {
        SignedInUser {
            email: email.to_string(),
            display_name: "Someone".to_string(),
            uid: uid.to_string(),
        }
    }

    fn config() -> FamilyConfig {
        FamilyConfig {
            members: vec!["mom@example.com".to_string(), "dad@example.com".to_string()],
            admins: vec!["uid-dad".to_string()],
        }
    }

    #[test]
    fn test_member_and_admin_predicates() {
        let config = config();
        assert!(config.is_member(&user("mom@example.com", "uid-mom")));
        assert!(!config.is_member(&user("stranger@example.com", "uid-x")));
        assert!(config.is_admin(&user("dad@example.com", "uid-dad")));
        assert!(!config.is_admin(&user("mom@example.com", "uid-mom")));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = config();
        let json = config.to_json().unwrap();
        let parsed: FamilyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let parsed: FamilyConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.members.is_empty());
        assert!(parsed.admins.is_empty());
    }
}
