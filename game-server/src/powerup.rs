//! The power-up catalog and the randomized barrel-contents bag.

use rand::seq::SliceRandom;

use crate::config::{BOMB_INCREMENT, FLAME_INCREMENT, POWERUP_BARREL_AMOUNT, SPEED_INCREMENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerupKind {
    Bomb,
    Flame,
    Speed,
    Nothing,
}

impl PowerupKind {
    pub const fn icon(self) -> u8 {
        match self {
            PowerupKind::Bomb => 7,
            PowerupKind::Flame => 8,
            PowerupKind::Speed => 9,
            PowerupKind::Nothing => 0,
        }
    }

    pub fn from_icon(icon: u8) -> Self {
        match icon {
            7 => PowerupKind::Bomb,
            8 => PowerupKind::Flame,
            9 => PowerupKind::Speed,
            _ => PowerupKind::Nothing,
        }
    }
}

/// A running player's power-up counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerPowerups {
    pub bombs: u32,
    pub flame: u32,
    pub speed: u32,
}

impl PlayerPowerups {
    pub fn starting() -> Self {
        PlayerPowerups {
            bombs: crate::config::DEFAULT_BOMBS,
            flame: crate::config::DEFAULT_FLAME,
            speed: crate::config::DEFAULT_SPEED,
        }
    }

    /// Applies a pickup by icon id. Unrecognized icons (including `Nothing`,
    /// icon `0`) are a no-op.
    pub fn apply_icon(&mut self, icon: u8) {
        match PowerupKind::from_icon(icon) {
            PowerupKind::Speed => self.speed += SPEED_INCREMENT,
            PowerupKind::Flame => self.flame += FLAME_INCREMENT,
            PowerupKind::Bomb => self.bombs += BOMB_INCREMENT,
            PowerupKind::Nothing => {}
        }
    }
}

/// Builds the shuffled sequence consumed, in order, as barrels are destroyed.
///
/// `barrel_count` non-empty entries are reserved for `Bomb`/`Flame`/`Speed`
/// (`POWERUP_BARREL_AMOUNT` each), the remainder pad out with `Nothing`, and
/// the whole sequence is shuffled uniformly at random.
pub fn random_barrel_contents(barrel_count: usize) -> Vec<PowerupKind> {
    let mut contents = Vec::with_capacity(barrel_count);
    for kind in [PowerupKind::Bomb, PowerupKind::Flame, PowerupKind::Speed] {
        for _ in 0..POWERUP_BARREL_AMOUNT {
            contents.push(kind);
        }
    }
    let empty_count = barrel_count.saturating_sub(contents.len());
    contents.extend(std::iter::repeat(PowerupKind::Nothing).take(empty_count));
    contents.truncate(barrel_count);
    contents.shuffle(&mut rand::thread_rng());
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_icon_increments_the_right_counter() {
        let mut p = PlayerPowerups::starting();
        p.apply_icon(PowerupKind::Speed.icon());
        assert_eq!(p.speed, crate::config::DEFAULT_SPEED + SPEED_INCREMENT);
    }

    #[test]
    fn apply_icon_nothing_is_a_no_op() {
        let mut p = PlayerPowerups::starting();
        let before = p;
        p.apply_icon(PowerupKind::Nothing.icon());
        assert_eq!(p, before);
    }

    #[test]
    fn barrel_contents_never_exceeds_barrel_count() {
        let contents = random_barrel_contents(10);
        assert_eq!(contents.len(), 10);
    }
}
