//! A connected player: identity, position, lives, and the sink their
//! outbound envelopes are funneled through.

use std::time::Instant;

use rand::seq::SliceRandom;
use tokio::sync::mpsc;

use crate::config::{COLOR_POOL, DEFAULT_LIVES};
use crate::ids::UserId;
use crate::position::AbsolutePosition;
use crate::powerup::PlayerPowerups;
use protocol::Envelope;

/// The channel a connection's write task drains to actually push bytes out.
pub type SendSink = mpsc::UnboundedSender<Envelope>;

#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: UserId,
    pub username: String,
    pub color: String,
    pub position: AbsolutePosition,
    pub lives: u8,
    pub powerups: PlayerPowerups,
    pub ready: bool,
    /// Instant before which incoming damage is ignored. Starts in the past.
    pub invincible_until: Instant,
    pub sink: SendSink,
}

impl Player {
    pub fn new(user_id: UserId, sink: SendSink) -> Self {
        let now = Instant::now();
        Player {
            user_id,
            username: String::new(),
            color: String::new(),
            position: AbsolutePosition::new(0, 0),
            lives: DEFAULT_LIVES,
            powerups: PlayerPowerups::starting(),
            ready: false,
            invincible_until: now,
            sink,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }

    pub fn is_invincible(&self, now: Instant) -> bool {
        now < self.invincible_until
    }

    pub fn send(&self, envelope: Envelope) {
        // The receiving write task owns the socket; a closed channel just
        // means the connection is already gone.
        let _ = self.sink.send(envelope);
    }
}

/// Picks a color not already used by any of `taken`, mirroring the original
/// `RandColor`: start from the fixed pool, drop every color already in use
/// in the target game, then pick uniformly among what remains.
pub fn pick_color(taken: &[String]) -> String {
    let mut available: Vec<&str> = COLOR_POOL.to_vec();
    available.retain(|c| !taken.iter().any(|t| t == c));
    if available.is_empty() {
        return COLOR_POOL[0].to_string();
    }
    (*available.choose(&mut rand::thread_rng()).unwrap()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_color_avoids_taken_colors() {
        let taken = vec![COLOR_POOL[0].to_string(), COLOR_POOL[1].to_string()];
        for _ in 0..20 {
            let c = pick_color(&taken);
            assert!(!taken.contains(&c));
        }
    }

    #[test]
    fn invincibility_window_starts_expired() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let p = Player::new("u1".to_string(), tx);
        assert!(!p.is_invincible(Instant::now()));
    }
}
