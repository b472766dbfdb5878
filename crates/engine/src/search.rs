//! Slot search strategies.
//!
//! The placement callback owns the actual multi-tracker reservation, so
//! a strategy only drives candidate (day, start-hour) pairs until one is
//! accepted.

use crate::config::{DAY_END, FIRST_HOUR, RANDOM_ATTEMPTS};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use types::DayOfWeek;

pub trait SlotStrategy: Send {
    /// Feed candidate slots for a session of `length` hours into
    /// `try_place` until it accepts one; returns the accepted slot.
    fn find_slot(
        &mut self,
        length: u8,
        try_place: &mut dyn FnMut(DayOfWeek, u8) -> bool,
    ) -> Option<(DayOfWeek, u8)>;
}

/// Randomized probing with a fixed attempt budget, then an exhaustive
/// scan in day/hour order.
pub struct TwoPhaseSearch {
    rng: ChaCha8Rng,
}

impl TwoPhaseSearch {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SlotStrategy for TwoPhaseSearch {
    fn find_slot(
        &mut self,
        length: u8,
        try_place: &mut dyn FnMut(DayOfWeek, u8) -> bool,
    ) -> Option<(DayOfWeek, u8)> {
        let window = DAY_END - FIRST_HOUR;
        if length == 0 || length > window {
            return None;
        }

        if length < window {
            for _ in 0..RANDOM_ATTEMPTS {
                let day = DayOfWeek::ALL[self.rng.gen_range(0..DayOfWeek::ALL.len())];
                let start = FIRST_HOUR + self.rng.gen_range(0..window - length);
                if try_place(day, start) {
                    return Some((day, start));
                }
            }
        }

        for day in DayOfWeek::ALL {
            for start in FIRST_HOUR..=DAY_END - length {
                if try_place(day, start) {
                    return Some((day, start));
                }
            }
        }
        None
    }
}
