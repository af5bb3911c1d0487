//! Load profiles: the declarative concurrency shapes a run follows.
mod curve;

#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;

use crate::error::ValidationError;

pub use curve::ShrinkHorizon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Fixed,
    RampUp,
    Spike,
    Stairs,
}

impl LoadMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LoadMode::Fixed => "fixed",
            LoadMode::RampUp => "ramp_up",
            LoadMode::Spike => "spike",
            LoadMode::Stairs => "stairs",
        }
    }
}

/// Every worker starts at once and runs until its loop budget or the
/// duration is used up, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProfile {
    threads: usize,
    loops: Option<u64>,
    duration_secs: Option<u64>,
}

impl FixedProfile {
    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    #[must_use]
    pub const fn loops(&self) -> Option<u64> {
        self.loops
    }

    #[must_use]
    pub const fn duration_secs(&self) -> Option<u64> {
        self.duration_secs
    }
}

/// Linear move from `start` to `end` threads over `ramp_secs`, then hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampUpProfile {
    start: usize,
    end: usize,
    ramp_secs: u64,
    duration_secs: u64,
}

impl RampUpProfile {
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub const fn ramp_secs(&self) -> u64 {
        self.ramp_secs
    }

    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

/// Rise, hold and fall. The three phase lengths are weights that get
/// rescaled so they exactly fill `duration_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpikeProfile {
    min: usize,
    max: usize,
    ramp_up: u64,
    hold: u64,
    ramp_down: u64,
    duration_secs: u64,
}

impl SpikeProfile {
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    #[must_use]
    pub const fn weights(&self) -> (u64, u64, u64) {
        (self.ramp_up, self.hold, self.ramp_down)
    }

    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

/// Adds `step` threads every `hold_secs` until `end` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StairsProfile {
    start: usize,
    end: usize,
    step: usize,
    hold_secs: u64,
    duration_secs: u64,
}

impl StairsProfile {
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    #[must_use]
    pub const fn hold_secs(&self) -> u64 {
        self.hold_secs
    }

    #[must_use]
    pub const fn duration_secs(&self) -> u64 {
        self.duration_secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProfile {
    Fixed(FixedProfile),
    RampUp(RampUpProfile),
    Spike(SpikeProfile),
    Stairs(StairsProfile),
}

impl LoadProfile {
    /// Builds a fixed profile.
    ///
    /// # Errors
    ///
    /// Returns an error when `threads` is zero, when a provided bound is zero,
    /// or when neither a loop count nor a duration is given.
    pub fn fixed(
        threads: usize,
        loops: Option<u64>,
        duration_secs: Option<u64>,
    ) -> Result<Self, ValidationError> {
        require_threads("threads", threads)?;
        if let Some(loops) = loops
            && loops == 0
        {
            return Err(ValidationError::LoopsTooSmall { field: "loops" });
        }
        if let Some(secs) = duration_secs {
            require_seconds("duration", secs)?;
        }
        if loops.is_none() && duration_secs.is_none() {
            return Err(ValidationError::FixedUnbounded);
        }
        Ok(LoadProfile::Fixed(FixedProfile {
            threads,
            loops,
            duration_secs,
        }))
    }

    /// Builds a ramp-up profile. `end` may be below `start`.
    ///
    /// # Errors
    ///
    /// Returns an error when a thread count or a duration is zero.
    pub fn ramp_up(
        start: usize,
        end: usize,
        ramp_secs: u64,
        duration_secs: u64,
    ) -> Result<Self, ValidationError> {
        require_threads("start", start)?;
        require_threads("end", end)?;
        require_seconds("ramp", ramp_secs)?;
        require_seconds("duration", duration_secs)?;
        Ok(LoadProfile::RampUp(RampUpProfile {
            start,
            end,
            ramp_secs,
            duration_secs,
        }))
    }

    /// Builds a spike profile. `min` may be zero.
    ///
    /// # Errors
    ///
    /// Returns an error when `max` is zero or below `min`, when every phase
    /// weight is zero, or when the duration is zero.
    pub fn spike(
        min: usize,
        max: usize,
        weights: (u64, u64, u64),
        duration_secs: u64,
    ) -> Result<Self, ValidationError> {
        require_threads("max", max)?;
        if max < min {
            return Err(ValidationError::SpikeMaxBelowMin { min, max });
        }
        let (ramp_up, hold, ramp_down) = weights;
        if ramp_up == 0 && hold == 0 && ramp_down == 0 {
            return Err(ValidationError::SpikeWeightsZero);
        }
        require_seconds("duration", duration_secs)?;
        Ok(LoadProfile::Spike(SpikeProfile {
            min,
            max,
            ramp_up,
            hold,
            ramp_down,
            duration_secs,
        }))
    }

    /// Builds a stairs profile. `start` may be zero.
    ///
    /// # Errors
    ///
    /// Returns an error when `end` or `step` is zero, or when a duration is
    /// zero.
    pub fn stairs(
        start: usize,
        end: usize,
        step: usize,
        hold_secs: u64,
        duration_secs: u64,
    ) -> Result<Self, ValidationError> {
        require_threads("end", end)?;
        require_threads("step", step)?;
        require_seconds("hold", hold_secs)?;
        require_seconds("duration", duration_secs)?;
        Ok(LoadProfile::Stairs(StairsProfile {
            start,
            end,
            step,
            hold_secs,
            duration_secs,
        }))
    }

    #[must_use]
    pub const fn mode(&self) -> LoadMode {
        match self {
            LoadProfile::Fixed(_) => LoadMode::Fixed,
            LoadProfile::RampUp(_) => LoadMode::RampUp,
            LoadProfile::Spike(_) => LoadMode::Spike,
            LoadProfile::Stairs(_) => LoadMode::Stairs,
        }
    }

    /// Wall-clock bound of the whole run; `None` for loop-bounded fixed runs.
    #[must_use]
    pub const fn total_duration(&self) -> Option<Duration> {
        let secs = match self {
            LoadProfile::Fixed(profile) => match profile.duration_secs {
                Some(secs) => secs,
                None => return None,
            },
            LoadProfile::RampUp(profile) => profile.duration_secs,
            LoadProfile::Spike(profile) => profile.duration_secs,
            LoadProfile::Stairs(profile) => profile.duration_secs,
        };
        Some(Duration::from_secs(secs))
    }

    /// Per-worker pass budget.
    #[must_use]
    pub const fn loops_per_worker(&self) -> Option<u64> {
        match self {
            LoadProfile::Fixed(profile) => profile.loops,
            LoadProfile::RampUp(_) | LoadProfile::Spike(_) | LoadProfile::Stairs(_) => None,
        }
    }

    /// Whether the scheduler may add workers after the initial spawn.
    #[must_use]
    pub const fn respawns(&self) -> bool {
        !matches!(self, LoadProfile::Fixed(_))
    }

    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        match self {
            LoadProfile::Fixed(profile) => profile.threads,
            LoadProfile::RampUp(profile) => profile.start.max(profile.end),
            LoadProfile::Spike(profile) => profile.max,
            LoadProfile::Stairs(profile) => profile.start.max(profile.end),
        }
    }

    /// Target number of workers `elapsed_secs` into the run.
    #[must_use]
    pub fn target_at(&self, elapsed_secs: u64) -> usize {
        match self {
            LoadProfile::Fixed(profile) => profile.threads,
            LoadProfile::RampUp(profile) => curve::ramp_target(profile, elapsed_secs),
            LoadProfile::Spike(profile) => curve::spike_target(profile, elapsed_secs),
            LoadProfile::Stairs(profile) => curve::stairs_target(profile, elapsed_secs),
        }
    }

    /// When the curve is in a falling segment, where it lands and how long
    /// until it gets there.
    #[must_use]
    pub fn shrink_horizon(&self, elapsed_secs: u64) -> Option<ShrinkHorizon> {
        match self {
            LoadProfile::RampUp(profile) => curve::ramp_shrink(profile, elapsed_secs),
            LoadProfile::Spike(profile) => curve::spike_shrink(profile, elapsed_secs),
            LoadProfile::Fixed(_) | LoadProfile::Stairs(_) => None,
        }
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadProfile::Fixed(profile) => {
                write!(f, "fixed(threads={}", profile.threads)?;
                if let Some(loops) = profile.loops {
                    write!(f, ", loops={}", loops)?;
                }
                if let Some(secs) = profile.duration_secs {
                    write!(f, ", duration={}s", secs)?;
                }
                write!(f, ")")
            }
            LoadProfile::RampUp(profile) => write!(
                f,
                "ramp_up({} -> {} over {}s, duration={}s)",
                profile.start, profile.end, profile.ramp_secs, profile.duration_secs
            ),
            LoadProfile::Spike(profile) => write!(
                f,
                "spike(min={}, max={}, phases={}/{}/{}, duration={}s)",
                profile.min,
                profile.max,
                profile.ramp_up,
                profile.hold,
                profile.ramp_down,
                profile.duration_secs
            ),
            LoadProfile::Stairs(profile) => write!(
                f,
                "stairs({} -> {} step {} every {}s, duration={}s)",
                profile.start, profile.end, profile.step, profile.hold_secs, profile.duration_secs
            ),
        }
    }
}

fn require_threads(field: &'static str, value: usize) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::ThreadsTooSmall { field });
    }
    Ok(())
}

fn require_seconds(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::SecondsTooSmall { field });
    }
    Ok(())
}
