//! Phase timeline.
//!
//! An ability runs through an ordered list of named phases, each with its
//! own duration. The timeline is a plain state machine stepped with
//! `advance(dt)` once per simulation tick:
//! - Progress within a phase is `clamp01(elapsed / duration)`
//! - Completing a phase restarts the elapsed counter at 0 (no carry-over)
//! - Every phase produces at least one tick, even a zero-length one

use harrow_common::clamp01;
use serde::{Deserialize, Serialize};

/// Smallest duration a phase may have (seconds).
pub const MIN_PHASE_DURATION: f32 = 1.0e-3;

/// Named sub-interval of an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Geometry reaching out.
    Extend,
    /// Geometry held in place (tether tracking).
    Hold,
    /// Whip sweep.
    Swing,
    /// Geometry pulling back.
    Retract,
    /// Single-phase abilities (slash, explosion).
    Active,
    /// Waiting before a delayed effect (harvest).
    Delay,
}

impl Phase {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Extend => "extend",
            Self::Hold => "hold",
            Self::Swing => "swing",
            Self::Retract => "retract",
            Self::Active => "active",
            Self::Delay => "delay",
        }
    }
}

/// Result of one `advance` step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineTick {
    /// Index of the phase this tick belongs to.
    pub index: usize,
    /// Phase this tick belongs to.
    pub phase: Phase,
    /// Normalized progress through that phase.
    pub progress: f32,
    /// The phase reached its duration on this tick.
    pub phase_completed: bool,
    /// The last phase completed (now or earlier).
    pub finished: bool,
}

/// Ordered phase sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimelineRepr")]
pub struct PhaseTimeline {
    phases: Vec<(Phase, f32)>,
    index: usize,
    elapsed: f32,
    finished: bool,
}

/// Serialized form; rebuilt through [`PhaseTimeline::new`].
#[derive(Default, Deserialize)]
#[serde(default)]
struct TimelineRepr {
    phases: Vec<(Phase, f32)>,
    index: usize,
    elapsed: f32,
    finished: bool,
}

impl From<TimelineRepr> for PhaseTimeline {
    fn from(repr: TimelineRepr) -> Self {
        let mut timeline = Self::new(repr.phases);
        timeline.index = repr.index.min(timeline.phases.len() - 1);
        timeline.elapsed = if repr.elapsed.is_finite() {
            repr.elapsed.max(0.0)
        } else {
            0.0
        };
        timeline.finished = repr.finished;
        timeline
    }
}

/// Replaces non-positive or non-finite durations with the minimum.
#[must_use]
pub fn normalize_duration(duration: f32) -> f32 {
    if duration.is_finite() && duration > MIN_PHASE_DURATION {
        duration
    } else {
        MIN_PHASE_DURATION
    }
}

impl PhaseTimeline {
    /// Create a timeline from `(phase, duration)` pairs.
    ///
    /// An empty list becomes a single minimal `Active` phase.
    #[must_use]
    pub fn new(phases: impl IntoIterator<Item = (Phase, f32)>) -> Self {
        let mut phases: Vec<(Phase, f32)> = phases
            .into_iter()
            .map(|(phase, duration)| (phase, normalize_duration(duration)))
            .collect();
        if phases.is_empty() {
            phases.push((Phase::Active, MIN_PHASE_DURATION));
        }
        Self {
            phases,
            index: 0,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Create a single-phase timeline.
    #[must_use]
    pub fn single(phase: Phase, duration: f32) -> Self {
        Self::new([(phase, duration)])
    }

    /// Step the timeline by `dt` seconds.
    ///
    /// Negative or non-finite `dt` counts as zero.
    pub fn advance(&mut self, dt: f32) -> TimelineTick {
        let last = self.phases.len() - 1;
        if self.finished {
            return TimelineTick {
                index: last,
                phase: self.phases[last].0,
                progress: 1.0,
                phase_completed: false,
                finished: true,
            };
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.elapsed += dt;

        let index = self.index;
        let (phase, duration) = self.phases[index];
        let progress = clamp01(self.elapsed / duration);

        if self.elapsed < duration {
            return TimelineTick {
                index,
                phase,
                progress,
                phase_completed: false,
                finished: false,
            };
        }

        if index < last {
            self.index += 1;
            self.elapsed = 0.0;
        } else {
            self.finished = true;
        }

        TimelineTick {
            index,
            phase,
            progress: 1.0,
            phase_completed: true,
            finished: self.finished,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.phases[self.index].0
    }

    /// Index of the current phase.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Seconds spent in the current phase.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Progress through the current phase (1.0 once finished).
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.finished {
            1.0
        } else {
            clamp01(self.elapsed / self.phases[self.index].1)
        }
    }

    /// Whether every phase has completed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false; a timeline holds at least one phase.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Normalized duration of a phase.
    #[must_use]
    pub fn duration_of(&self, index: usize) -> Option<f32> {
        self.phases.get(index).map(|(_, d)| *d)
    }

    /// Sum of all normalized phase durations.
    #[must_use]
    pub fn total_duration(&self) -> f32 {
        self.phases.iter().map(|(_, d)| d).sum()
    }
}
