//! Identifier generation for players and games.

use rand::Rng;
use rand::distributions::Alphanumeric;

pub type UserId = String;
pub type GameId = String;

/// Generates a fresh, globally unique player id.
pub fn new_user_id() -> UserId {
    uuid::Uuid::new_v4().to_string()
}

/// Generates a short, human-typeable game id for lobby creation.
///
/// Five characters from an alphanumeric alphabet. Collisions against live
/// games are the caller's responsibility to check (and retry on) against the
/// game registry, since uniqueness here is only probabilistic.
pub fn new_game_id() -> GameId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_are_five_chars() {
        assert_eq!(new_game_id().len(), 5);
    }

    #[test]
    fn user_ids_are_unique() {
        assert_ne!(new_user_id(), new_user_id());
    }
}
