//! Spin targeting and the spin state machine.
//!
//! The roll service decides the winner; this module only works out where the
//! wheel has to stop so the pointer sits on the winner, and how the rotation
//! gets there frame by frame.

use crate::geometry::normalize_angle;
use crate::item::{ItemId, WheelItem};
use crate::segment::build_segments;
use crate::settings::SpinSettings;
use rand::Rng;
use std::f64::consts::TAU;
use std::time::Duration;
use thiserror::Error;

/// Fraction of a segment kept clear at each edge when picking the stop angle.
pub const SEGMENT_PADDING: f64 = 0.12;
pub const MIN_SPIN_DURATION: Duration = Duration::from_millis(300);
pub const BASE_TURNS: f64 = 4.0;
pub const EXTRA_TURNS: f64 = 3.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpinError {
    #[error("A spin is already in progress")]
    AlreadySpinning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinOutcome {
    Finished,
    Cancelled,
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Where on the wheel (in the wheel's own frame) the pointer should end up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinTarget {
    pub angle: f64,
    /// Index of the chosen segment, `None` when the winner was not on the wheel.
    pub segment: Option<usize>,
}

/// Pick a stop angle inside one of the winner's segments.
///
/// Fragments cut from the winner count as the winner too. When nothing
/// matches the wheel still spins and stops at angle `0`.
pub fn pick_target<R: Rng + ?Sized>(
    items: &[WheelItem],
    winner_id: &ItemId,
    rng: &mut R,
) -> SpinTarget {
    let segments = build_segments(items);
    let matching: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.item.matches(winner_id))
        .map(|(i, _)| i)
        .collect();

    if matching.is_empty() {
        log::warn!("Winner '{}' is not on the wheel, stopping at 0", winner_id);
        return SpinTarget {
            angle: 0.0,
            segment: None,
        };
    }

    let index = matching[rng.random_range(0..matching.len())];
    let segment = &segments[index];
    let inset = segment.span() * SEGMENT_PADDING;
    let usable = segment.span() - 2.0 * inset;
    SpinTarget {
        angle: segment.start + inset + usable * rng.random::<f64>(),
        segment: Some(index),
    }
}

/// Rotation that puts `angle` under the pointer.
pub fn target_rotation(angle: f64) -> f64 {
    normalize_angle(-angle)
}

/// Absolute rotation to animate to from `from`, landing on `target` (a value in
/// `[0, 2π)`) after a number of whole turns that grows with `speed`.
pub fn spin_destination(from: f64, target: f64, speed: f64) -> f64 {
    let speed = if speed.is_finite() { speed.max(0.0) } else { 1.0 };
    let turns = BASE_TURNS + (EXTRA_TURNS * speed).round();
    let base = from - from.rem_euclid(TAU);
    let mut to = base + target + turns * TAU;
    while to <= from + TAU {
        to += TAU;
    }
    to
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinPlan {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub target: SpinTarget,
}

impl SpinPlan {
    pub fn new<R: Rng + ?Sized>(
        items: &[WheelItem],
        winner_id: &ItemId,
        from: f64,
        settings: &SpinSettings,
        rng: &mut R,
    ) -> Self {
        let target = pick_target(items, winner_id, rng);
        let to = spin_destination(from, target_rotation(target.angle), settings.speed_multiplier);
        Self {
            from,
            to,
            duration: settings.duration().max(MIN_SPIN_DURATION),
            target,
        }
    }

    pub fn rotation_at(&self, t: f64) -> f64 {
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning {
        plan: SpinPlan,
        started: Option<Duration>,
        progress: f64,
    },
    /// Last frame has been drawn at the exact destination; the next tick
    /// reports completion.
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinTick {
    Idle,
    Frame(f64),
    Settled(f64),
}

/// `Idle -> Spinning -> Settling -> Idle`, advanced by frame timestamps.
#[derive(Debug, Clone, Default)]
pub struct SpinAnimator {
    phase: SpinPhase,
    rotation: f64,
}

impl SpinAnimator {
    pub fn new(rotation: f64) -> Self {
        Self {
            phase: SpinPhase::Idle,
            rotation,
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn phase(&self) -> &SpinPhase {
        &self.phase
    }

    pub fn is_spinning(&self) -> bool {
        !matches!(self.phase, SpinPhase::Idle)
    }

    pub fn start(&mut self, plan: SpinPlan) -> Result<(), SpinError> {
        if self.is_spinning() {
            return Err(SpinError::AlreadySpinning);
        }
        self.rotation = plan.from;
        self.phase = SpinPhase::Spinning {
            plan,
            started: None,
            progress: 0.0,
        };
        Ok(())
    }

    /// Advance to the frame timestamp `now`. The first tick of a spin marks
    /// its start time.
    pub fn tick(&mut self, now: Duration) -> SpinTick {
        match &mut self.phase {
            SpinPhase::Idle => SpinTick::Idle,
            SpinPhase::Spinning {
                plan,
                started,
                progress,
            } => {
                let start = *started.get_or_insert(now);
                let elapsed = now.saturating_sub(start);
                let t = (elapsed.as_secs_f64() / plan.duration.as_secs_f64())
                    .min(1.0)
                    .max(*progress);
                *progress = t;

                if t >= 1.0 {
                    self.rotation = plan.to;
                    self.phase = SpinPhase::Settling;
                } else {
                    self.rotation = plan.rotation_at(t).max(self.rotation);
                }
                SpinTick::Frame(self.rotation)
            }
            SpinPhase::Settling => {
                self.phase = SpinPhase::Idle;
                SpinTick::Settled(self.rotation)
            }
        }
    }

    /// Stop where the wheel currently is. Returns whether a spin was running.
    pub fn cancel(&mut self) -> bool {
        let was_spinning = self.is_spinning();
        self.phase = SpinPhase::Idle;
        was_spinning
    }
}
