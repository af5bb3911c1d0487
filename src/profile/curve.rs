use super::{RampUpProfile, SpikeProfile, StairsProfile};

/// A falling segment of the target curve: the population it settles at and
/// the seconds left until it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrinkHorizon {
    pub floor: usize,
    pub remaining_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct SpikePhases {
    pub(super) ramp_up: u64,
    pub(super) hold: u64,
    pub(super) ramp_down: u64,
}

impl SpikePhases {
    pub(super) fn of(profile: &SpikeProfile) -> Self {
        let total_weight = profile
            .ramp_up
            .saturating_add(profile.hold)
            .saturating_add(profile.ramp_down)
            .max(1);
        let scale = |weight: u64| -> u64 {
            let scaled = u128::from(profile.duration_secs)
                .saturating_mul(u128::from(weight))
                .checked_div(u128::from(total_weight))
                .unwrap_or(0);
            u64::try_from(scaled).unwrap_or(u64::MAX)
        };
        let ramp_up = scale(profile.ramp_up);
        let hold = scale(profile.hold);
        // Rounding slack lands in the ramp-down so the phases fill the run.
        let ramp_down = profile
            .duration_secs
            .saturating_sub(ramp_up)
            .saturating_sub(hold);
        Self {
            ramp_up,
            hold,
            ramp_down,
        }
    }

    const fn down_start(self) -> u64 {
        self.ramp_up.saturating_add(self.hold)
    }

    const fn end(self) -> u64 {
        self.down_start().saturating_add(self.ramp_down)
    }
}

pub(super) fn ramp_target(profile: &RampUpProfile, elapsed_secs: u64) -> usize {
    if elapsed_secs >= profile.ramp_secs {
        return profile.end;
    }
    interpolate(profile.start, profile.end, elapsed_secs, profile.ramp_secs)
}

pub(super) fn ramp_shrink(profile: &RampUpProfile, elapsed_secs: u64) -> Option<ShrinkHorizon> {
    if profile.end >= profile.start || elapsed_secs >= profile.ramp_secs {
        return None;
    }
    Some(ShrinkHorizon {
        floor: profile.end,
        remaining_secs: profile.ramp_secs.saturating_sub(elapsed_secs),
    })
}

pub(super) fn spike_target(profile: &SpikeProfile, elapsed_secs: u64) -> usize {
    let phases = SpikePhases::of(profile);
    if elapsed_secs < phases.ramp_up {
        return interpolate(profile.min, profile.max, elapsed_secs, phases.ramp_up);
    }
    if elapsed_secs < phases.down_start() {
        return profile.max;
    }
    if phases.ramp_down == 0 {
        return profile.min;
    }
    let into_down = elapsed_secs
        .saturating_sub(phases.down_start())
        .min(phases.ramp_down);
    interpolate(profile.max, profile.min, into_down, phases.ramp_down)
}

pub(super) fn spike_shrink(profile: &SpikeProfile, elapsed_secs: u64) -> Option<ShrinkHorizon> {
    let phases = SpikePhases::of(profile);
    if phases.ramp_down == 0
        || elapsed_secs < phases.down_start()
        || elapsed_secs >= phases.end()
    {
        return None;
    }
    Some(ShrinkHorizon {
        floor: profile.min,
        remaining_secs: phases.end().saturating_sub(elapsed_secs),
    })
}

pub(super) fn stairs_target(profile: &StairsProfile, elapsed_secs: u64) -> usize {
    let ceiling = profile.start.max(profile.end);
    let steps_taken = elapsed_secs
        .checked_div(profile.hold_secs)
        .unwrap_or(0);
    let steps_taken = usize::try_from(steps_taken).unwrap_or(usize::MAX);
    profile
        .start
        .saturating_add(profile.step.saturating_mul(steps_taken))
        .min(ceiling)
}

/// Linear interpolation in whole workers, truncated toward `from`.
fn interpolate(from: usize, to: usize, elapsed_secs: u64, span_secs: u64) -> usize {
    let span = i128::from(span_secs.max(1));
    let elapsed = i128::from(elapsed_secs.min(span_secs.max(1)));
    let from_i = i128::try_from(from).unwrap_or(i128::MAX);
    let to_i = i128::try_from(to).unwrap_or(i128::MAX);

    let delta = to_i.saturating_sub(from_i);
    let step = delta
        .saturating_mul(elapsed)
        .checked_div(span)
        .unwrap_or(0);
    let value = from_i.saturating_add(step);
    if value < 0 {
        0
    } else {
        usize::try_from(value).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
pub(super) fn phases_of(profile: &SpikeProfile) -> SpikePhases {
    SpikePhases::of(profile)
}
