use super::curve::phases_of;
use super::*;

#[test]
fn fixed_profile_requires_a_bound() -> Result<(), String> {
    match LoadProfile::fixed(5, None, None) {
        Err(ValidationError::FixedUnbounded) => {}
        other => return Err(format!("Expected FixedUnbounded, got {:?}", other)),
    }
    if LoadProfile::fixed(0, Some(1), None).is_ok() {
        return Err("Expected zero threads to be rejected".to_owned());
    }
    match LoadProfile::fixed(1, Some(0), None) {
        Err(ValidationError::LoopsTooSmall { field: "loops" }) => {}
        other => return Err(format!("Expected zero loops to name the field, got {:?}", other)),
    }
    let profile = LoadProfile::fixed(5, Some(2), None).map_err(|err| err.to_string())?;
    if profile.total_duration().is_some() {
        return Err("Loop-bounded fixed profile should have no deadline".to_owned());
    }
    if profile.loops_per_worker() != Some(2) {
        return Err("Expected loop budget of 2".to_owned());
    }
    if profile.respawns() {
        return Err("Fixed profile must not respawn".to_owned());
    }
    Ok(())
}

#[test]
fn durations_must_be_at_least_one_second() -> Result<(), String> {
    if LoadProfile::ramp_up(1, 2, 0, 10).is_ok() {
        return Err("Expected zero ramp to be rejected".to_owned());
    }
    if LoadProfile::spike(1, 2, (1, 1, 1), 0).is_ok() {
        return Err("Expected zero spike duration to be rejected".to_owned());
    }
    if LoadProfile::stairs(0, 4, 1, 0, 10).is_ok() {
        return Err("Expected zero hold to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn spike_and_stairs_allow_zero_minimum() -> Result<(), String> {
    let spike = LoadProfile::spike(0, 4, (1, 1, 1), 9).map_err(|err| err.to_string())?;
    if spike.target_at(0) != 0 {
        return Err(format!("Expected spike to start at 0, got {}", spike.target_at(0)));
    }
    let stairs = LoadProfile::stairs(0, 4, 2, 5, 30).map_err(|err| err.to_string())?;
    if stairs.target_at(0) != 0 {
        return Err("Expected stairs to start at 0".to_owned());
    }
    if LoadProfile::spike(5, 4, (1, 1, 1), 9).is_ok() {
        return Err("Expected max below min to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn ramp_up_hits_endpoints_and_never_decreases() -> Result<(), String> {
    let profile = LoadProfile::ramp_up(2, 10, 8, 30).map_err(|err| err.to_string())?;
    if profile.target_at(0) != 2 {
        return Err(format!("target(0) = {}", profile.target_at(0)));
    }
    if profile.target_at(8) != 10 {
        return Err(format!("target(8) = {}", profile.target_at(8)));
    }
    let mut previous = 0;
    for second in 0..=8 {
        let target = profile.target_at(second);
        if target < previous {
            return Err(format!("target decreased at t={}", second));
        }
        previous = target;
    }
    if profile.target_at(20) != 10 {
        return Err("Expected target to hold at end after ramp".to_owned());
    }
    if profile.shrink_horizon(3).is_some() {
        return Err("Growing ramp has no shrink horizon".to_owned());
    }
    Ok(())
}

#[test]
fn shrinking_ramp_reports_horizon() -> Result<(), String> {
    let profile = LoadProfile::ramp_up(10, 2, 8, 30).map_err(|err| err.to_string())?;
    if profile.target_at(4) != 6 {
        return Err(format!("target(4) = {}", profile.target_at(4)));
    }
    let horizon = profile
        .shrink_horizon(2)
        .ok_or_else(|| "Expected shrink horizon".to_owned())?;
    if horizon.floor != 2 || horizon.remaining_secs != 6 {
        return Err(format!("Unexpected horizon {:?}", horizon));
    }
    if profile.peak_concurrency() != 10 {
        return Err("Peak should be the ramp start".to_owned());
    }
    Ok(())
}

#[test]
fn spike_phases_rescale_to_duration() -> Result<(), String> {
    let profile = LoadProfile::spike(1, 20, (2, 1, 2), 25).map_err(|err| err.to_string())?;
    let LoadProfile::Spike(spike) = profile else {
        return Err("Expected spike profile".to_owned());
    };
    let phases = phases_of(&spike);
    if (phases.ramp_up, phases.hold, phases.ramp_down) != (10, 5, 10) {
        return Err(format!("Unexpected phases {:?}", phases));
    }
    Ok(())
}

#[test]
fn spike_holds_at_max_then_falls_to_min() -> Result<(), String> {
    let profile = LoadProfile::spike(1, 20, (10, 5, 10), 25).map_err(|err| err.to_string())?;
    if profile.target_at(0) != 1 {
        return Err(format!("target(0) = {}", profile.target_at(0)));
    }
    if profile.target_at(12) != 20 {
        return Err(format!("hold midpoint target = {}", profile.target_at(12)));
    }

    let mut previous = profile.target_at(15);
    for second in 16..=25 {
        let target = profile.target_at(second);
        if target >= previous {
            return Err(format!(
                "ramp-down not strictly decreasing at t={}: {} -> {}",
                second, previous, target
            ));
        }
        if target < 1 {
            return Err(format!("target dropped below min at t={}", second));
        }
        previous = target;
    }

    let horizon = profile
        .shrink_horizon(16)
        .ok_or_else(|| "Expected shrink horizon during ramp-down".to_owned())?;
    if horizon.floor != 1 || horizon.remaining_secs != 9 {
        return Err(format!("Unexpected horizon {:?}", horizon));
    }
    if profile.shrink_horizon(12).is_some() {
        return Err("Hold phase must not shrink".to_owned());
    }
    Ok(())
}

#[test]
fn stairs_only_step_up() -> Result<(), String> {
    let profile = LoadProfile::stairs(2, 9, 3, 5, 60).map_err(|err| err.to_string())?;
    let expected = [(0, 2), (4, 2), (5, 5), (9, 5), (10, 8), (15, 9), (59, 9)];
    for (second, target) in expected {
        if profile.target_at(second) != target {
            return Err(format!(
                "target({}) = {}, expected {}",
                second,
                profile.target_at(second),
                target
            ));
        }
    }
    if profile.shrink_horizon(30).is_some() {
        return Err("Stairs never shrink".to_owned());
    }
    Ok(())
}

#[test]
fn display_names_the_mode() -> Result<(), String> {
    let profile = LoadProfile::spike(1, 20, (10, 5, 10), 25).map_err(|err| err.to_string())?;
    let rendered = profile.to_string();
    if !rendered.starts_with(profile.mode().as_str()) {
        return Err(format!("Unexpected display '{}'", rendered));
    }
    Ok(())
}
