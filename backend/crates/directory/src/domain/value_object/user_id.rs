//! User ID Value Object
//!
//! Internal UUID v4 identifier, assigned once on creation.

use kernel::id::Id;

/// Marker type for user ids
pub struct UserMarker;
pub type UserId = Id<UserMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_new() {
        let user_id = UserId::new();
        let uuid = user_id.as_uuid();
        assert_eq!(uuid.get_version_num(), 4); // UUIDv4
    }

    #[test]
    fn test_parse_round_trip() {
        let user_id = UserId::new();
        let parsed = UserId::parse_str(&user_id.to_string()).unwrap();
        assert_eq!(parsed, user_id);
        assert!(UserId::parse_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(UserId::new(), UserId::new());
    }
}
