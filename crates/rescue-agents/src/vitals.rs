//! Remaining life and hazard exposure.
//!
//! Damage is charged once per *exposure*: a (tick, movement step) pair. An
//! actor that moves three cells in a tick is exposed three times; an actor
//! that stands still is exposed at most once per tick no matter how many
//! phases ask. All arithmetic saturates at zero.

use rescue_types::HazardLevel;

use crate::config::{DamageTable, MAX_LIFE};

/// One opportunity for a hazard to cost life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    /// Simulation tick.
    pub tick: u64,
    /// The actor's movement counter at the time.
    pub step: u64,
}

/// Remaining life plus the last exposure already charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    remaining_life: u32,
    last_exposure: Option<Exposure>,
}

impl Vitals {
    /// Fresh vitals, capped at [`MAX_LIFE`].
    pub const fn new(starting_life: u32) -> Self {
        let remaining_life = if starting_life > MAX_LIFE {
            MAX_LIFE
        } else {
            starting_life
        };
        Self {
            remaining_life,
            last_exposure: None,
        }
    }

    /// Remaining life percentage.
    pub const fn remaining_life(&self) -> u32 {
        self.remaining_life
    }

    /// Whether life has run out.
    pub const fn is_depleted(&self) -> bool {
        self.remaining_life == 0
    }

    /// Charge the damage for `level` unless this exposure was already charged.
    ///
    /// Returns the life actually lost. No-op once depleted.
    pub fn apply_hazard_damage(
        &mut self,
        level: HazardLevel,
        table: &DamageTable,
        exposure: Exposure,
    ) -> u32 {
        if self.is_depleted() || self.last_exposure == Some(exposure) {
            return 0;
        }
        self.last_exposure = Some(exposure);
        let before = self.remaining_life;
        self.remaining_life = before.saturating_sub(table.damage_for(level));
        before.saturating_sub(self.remaining_life)
    }
}
