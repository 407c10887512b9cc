//! Fourth-order (snap-limited) point-by-point trajectory planner.
//!
//! `PlannerContext::init` performs a one-shot precomputation of a seven-phase
//! S-curve (optionally rescaled to a deadline via bisection on a time-scale
//! factor alpha), then `get_next_point` is a cheap per-sample polynomial
//! evaluation against the cached phase-boundary states.

use crate::error::PlannerError;

const MAX_ITERATIONS: usize = 100;
const TIME_TOLERANCE: f64 = 1e-9;
const ALPHA_TOLERANCE: f64 = 1e-7;
const DIST_TOL: f64 = 1e-9;
const DEGENERATE_DISTANCE: f64 = 1e-12;
const SEARCH_EPS: f64 = 1e-12;
const EVAL_EPS: f64 = 1e-9;
const CALC_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerInput {
    pub distance: f64,
    pub v_max: f64,
    pub a_max: f64,
    pub j_max: f64,
    pub d_max: f64,
    pub sample_time: f64,
    /// Deadline; ignored (optimal time used) when `<= 0.0`.
    pub time_limit: f64,
}

impl PlannerInput {
    fn validate(&self) -> Result<(), PlannerError> {
        if self.distance < 0.0
            || self.v_max <= 0.0
            || self.a_max <= 0.0
            || self.j_max <= 0.0
            || self.d_max <= 0.0
            || self.sample_time <= 0.0
        {
            return Err(PlannerError::InvalidInput(format!(
                "distance={}, v_max={}, a_max={}, j_max={}, d_max={}, sample_time={}",
                self.distance, self.v_max, self.a_max, self.j_max, self.d_max, self.sample_time
            )));
        }
        Ok(())
    }

    fn scaled_by(&self, alpha: f64) -> PlannerInput {
        PlannerInput {
            distance: self.distance,
            v_max: alpha * self.v_max,
            a_max: alpha.powi(2) * self.a_max,
            j_max: alpha.powi(3) * self.j_max,
            d_max: alpha.powi(4) * self.d_max,
            sample_time: self.sample_time,
            time_limit: self.time_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BoundaryState {
    pos: f64,
    vel: f64,
    acc: f64,
    jerk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub pos: f64,
    pub vel: f64,
    pub acc: f64,
    pub jerk: f64,
    pub snap: f64,
}

/// Summary of a planner's final segmentation and effective limits, reported
/// once after `init` for operator visibility (status query / logging).
#[derive(Debug, Clone, Copy)]
pub struct PlannerDiagnostics {
    pub total_time: f64,
    pub td: f64,
    pub tj: f64,
    pub ta: f64,
    pub tv: f64,
    pub is_time_scaled: bool,
    pub alpha: f64,
    pub v_max_effective: f64,
    pub a_max_effective: f64,
    pub j_max_effective: f64,
    pub d_max_effective: f64,
}

#[derive(Debug, Clone)]
pub struct PlannerContext {
    input: PlannerInput,
    td: f64,
    tj: f64,
    ta: f64,
    tv: f64,
    total_time: f64,
    is_time_scaled: bool,
    alpha: f64,
    acc_seg_borders: [f64; 8],
    dec_seg_borders: [f64; 8],
    const_vel_start_time: f64,
    decel_start_time: f64,
    acc_state_at_border: [BoundaryState; 8],
    dec_state_at_border: [BoundaryState; 8],
    const_vel_end_state: BoundaryState,
    current_time: f64,
    finished: bool,
}

impl PlannerContext {
    pub fn init(input: &PlannerInput) -> Result<Self, PlannerError> {
        input.validate()?;

        let (td_opt, tj_opt, ta_opt, tv_opt, optimal_time) = calculate_optimal_time_segments(input)?;

        let time_limit = input.time_limit;
        let mut td_final = td_opt;
        let mut tj_final = tj_opt;
        let mut ta_final = ta_opt;
        let mut tv_final = tv_opt;
        let mut alpha_final = 1.0;
        let final_time;
        let mut is_time_scaled = false;

        if time_limit > 0.0 && (time_limit - optimal_time).abs() > TIME_TOLERANCE {
            is_time_scaled = true;
            let (mut alpha_low, mut alpha_high) = if time_limit < optimal_time {
                (1.0, 50.0)
            } else {
                (1e-8, 1.0)
            };
            let mut best_alpha = 1.0;
            let mut min_time_error = f64::MAX;
            let (mut td_best, mut tj_best, mut ta_best, mut tv_best) = (td_final, tj_final, ta_final, tv_final);

            for _ in 0..MAX_ITERATIONS {
                let alpha_guess = (alpha_low + alpha_high) / 2.0;
                let scaled_input = input.scaled_by(alpha_guess);

                let guess = calculate_optimal_time_segments(&scaled_input);
                let (td_g, tj_g, ta_g, tv_g, time_g) = match guess {
                    Ok(v) if v.4.is_finite() => v,
                    _ => {
                        if time_limit < optimal_time {
                            alpha_high = alpha_guess;
                        } else {
                            alpha_low = alpha_guess;
                        }
                        continue;
                    }
                };

                let current_time_error = time_g - time_limit;
                if current_time_error.abs() < min_time_error {
                    min_time_error = current_time_error.abs();
                    best_alpha = alpha_guess;
                    td_best = td_g;
                    tj_best = tj_g;
                    ta_best = ta_g;
                    tv_best = tv_g;
                }

                if current_time_error > 0.0 {
                    alpha_low = alpha_guess;
                } else {
                    alpha_high = alpha_guess;
                }

                if (alpha_high - alpha_low) < ALPHA_TOLERANCE * alpha_high.max(1.0)
                    || current_time_error.abs() < TIME_TOLERANCE
                {
                    break;
                }
            }

            alpha_final = best_alpha;
            final_time = time_limit;
            td_final = td_best;
            tj_final = tj_best;
            ta_final = ta_best;
            tv_final = tv_best;
        } else {
            final_time = optimal_time;
        }

        let te_final = 4.0 * td_final + 2.0 * tj_final + ta_final;
        let total_time = final_time;
        tv_final = (total_time - 2.0 * te_final).max(0.0);

        let mut acc_seg_borders = [0.0f64; 8];
        let dur_vec = [td_final, tj_final, td_final, ta_final, td_final, tj_final, td_final];
        for i in 0..7 {
            acc_seg_borders[i + 1] = acc_seg_borders[i] + dur_vec[i];
        }
        let const_vel_start_time = te_final;
        let mut decel_start_time = total_time - te_final;
        if decel_start_time < const_vel_start_time - 1e-9 {
            decel_start_time = const_vel_start_time;
            tv_final = 0.0;
        } else {
            tv_final = (decel_start_time - const_vel_start_time).max(0.0);
        }
        let mut dec_seg_borders = [0.0f64; 8];
        for i in 0..8 {
            dec_seg_borders[i] = decel_start_time + acc_seg_borders[i];
        }

        let d_eff = alpha_final.powi(4) * input.d_max;
        let snap_acc = [d_eff, 0.0, -d_eff, 0.0, -d_eff, 0.0, d_eff];

        let mut acc_state_at_border = [BoundaryState::default(); 8];
        let (mut x, mut v, mut a, mut j) = (0.0, 0.0, 0.0, 0.0);
        for i in 0..7 {
            let dt = dur_vec[i];
            if dt < CALC_EPS {
                acc_state_at_border[i + 1] = acc_state_at_border[i];
                continue;
            }
            let snap = snap_acc[i];
            (x, v, a, j) = integrate_phase(x, v, a, j, snap, dt);
            if !x.is_finite() || !v.is_finite() || !a.is_finite() || !j.is_finite() {
                return Err(PlannerError::NumericalDivergence("acceleration precomputation"));
            }
            acc_state_at_border[i + 1] = BoundaryState { pos: x, vel: v, acc: a, jerk: j };
        }

        let mut const_vel_end_state = acc_state_at_border[7];
        const_vel_end_state.pos += acc_state_at_border[7].vel * tv_final;

        let mut dec_state_at_border = [BoundaryState::default(); 8];
        dec_state_at_border[0] = const_vel_end_state;
        let (mut x, mut v, mut a, mut j) = (const_vel_end_state.pos, const_vel_end_state.vel, 0.0, 0.0);
        let snap_dec = [-d_eff, 0.0, d_eff, 0.0, d_eff, 0.0, -d_eff];
        for i in 0..7 {
            let dt = dur_vec[i];
            if dt < CALC_EPS {
                dec_state_at_border[i + 1] = dec_state_at_border[i];
                continue;
            }
            let snap = snap_dec[i];
            (x, v, a, j) = integrate_phase(x, v, a, j, snap, dt);
            if !x.is_finite() || !v.is_finite() || !a.is_finite() || !j.is_finite() {
                return Err(PlannerError::NumericalDivergence("deceleration precomputation"));
            }
            dec_state_at_border[i + 1] = BoundaryState { pos: x, vel: v, acc: a, jerk: j };
        }

        let final_pos_error = (dec_state_at_border[7].pos - input.distance).abs();
        let final_vel_error = dec_state_at_border[7].vel.abs();
        if final_pos_error > 1e-6 || final_vel_error > 1e-6 {
            return Err(PlannerError::ConvergenceFailure);
        }

        Ok(PlannerContext {
            input: *input,
            td: td_final,
            tj: tj_final,
            ta: ta_final,
            tv: tv_final,
            total_time,
            is_time_scaled,
            alpha: alpha_final,
            acc_seg_borders,
            dec_seg_borders,
            const_vel_start_time,
            decel_start_time,
            acc_state_at_border,
            dec_state_at_border,
            const_vel_end_state,
            current_time: 0.0,
            finished: false,
        })
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn diagnostics(&self) -> PlannerDiagnostics {
        PlannerDiagnostics {
            total_time: self.total_time,
            td: self.td,
            tj: self.tj,
            ta: self.ta,
            tv: self.tv,
            is_time_scaled: self.is_time_scaled,
            alpha: self.alpha,
            v_max_effective: self.alpha * self.input.v_max,
            a_max_effective: self.alpha.powi(2) * self.input.a_max,
            j_max_effective: self.alpha.powi(3) * self.input.j_max,
            d_max_effective: self.alpha.powi(4) * self.input.d_max,
        }
    }

    /// Advance and return `(point, done)`. `done` means this was the last
    /// meaningful point; subsequent calls keep returning the final state.
    pub fn get_next_point(&mut self) -> (TrajectoryPoint, bool) {
        let mut time = self.current_time;

        if !self.finished && time >= self.total_time - EVAL_EPS {
            time = self.total_time;
            self.finished = true;
        } else if time < 0.0 {
            time = 0.0;
        }

        let point = self.calculate_point(time);

        if !self.finished {
            self.current_time += self.input.sample_time;
        } else {
            self.current_time = self.total_time + self.input.sample_time;
        }

        (point, self.finished)
    }

    fn calculate_point(&self, time: f64) -> TrajectoryPoint {
        let d_eff = self.alpha.powi(4) * self.input.d_max;

        if time < CALC_EPS {
            let s = self.acc_state_at_border[0];
            return TrajectoryPoint {
                time,
                pos: s.pos,
                vel: s.vel,
                acc: s.acc,
                jerk: s.jerk,
                snap: if self.td > CALC_EPS { d_eff } else { 0.0 },
            };
        }

        if (time - self.total_time).abs() < CALC_EPS {
            let s = self.dec_state_at_border[7];
            let mut pos = s.pos;
            if (pos - self.input.distance).abs() < 1e-6 {
                pos = self.input.distance;
            }
            return TrajectoryPoint { time, pos, vel: 0.0, acc: 0.0, jerk: 0.0, snap: 0.0 };
        }

        if time >= self.const_vel_start_time - EVAL_EPS && time < self.decel_start_time - EVAL_EPS {
            let s = self.acc_state_at_border[7];
            let tau = (time - self.const_vel_start_time).max(0.0);
            return TrajectoryPoint {
                time,
                pos: s.pos + s.vel * tau,
                vel: s.vel,
                acc: 0.0,
                jerk: 0.0,
                snap: 0.0,
            };
        }

        if time >= self.decel_start_time - EVAL_EPS {
            let snap_dec = [-d_eff, 0.0, d_eff, 0.0, d_eff, 0.0, -d_eff];
            for i in 0..7 {
                if time >= self.dec_seg_borders[i] - EVAL_EPS && time < self.dec_seg_borders[i + 1] - EVAL_EPS {
                    return self.evaluate_segment(
                        time,
                        self.dec_seg_borders[i],
                        self.dec_seg_borders[i + 1],
                        self.dec_state_at_border[i],
                        snap_dec[i],
                    );
                }
            }
            let s = self.dec_state_at_border[7];
            return TrajectoryPoint { time, pos: s.pos, vel: 0.0, acc: 0.0, jerk: 0.0, snap: 0.0 };
        }

        let snap_acc = [d_eff, 0.0, -d_eff, 0.0, -d_eff, 0.0, d_eff];
        for i in 0..7 {
            if time >= self.acc_seg_borders[i] - EVAL_EPS && time < self.acc_seg_borders[i + 1] - EVAL_EPS {
                return self.evaluate_segment(
                    time,
                    self.acc_seg_borders[i],
                    self.acc_seg_borders[i + 1],
                    self.acc_state_at_border[i],
                    snap_acc[i],
                );
            }
        }
        let s = self.acc_state_at_border[7];
        TrajectoryPoint { time, pos: s.pos, vel: s.vel, acc: s.acc, jerk: s.jerk, snap: snap_acc[6] }
    }

    fn evaluate_segment(
        &self,
        time: f64,
        seg_start: f64,
        seg_end: f64,
        initial: BoundaryState,
        snap: f64,
    ) -> TrajectoryPoint {
        let mut tau = (time - seg_start).max(0.0);
        let seg_duration = seg_end - seg_start;
        if tau > seg_duration + EVAL_EPS {
            tau = seg_duration.max(0.0);
        }

        let (pos, vel, acc, jerk) = evaluate_polynomial(initial, snap, tau);
        if !pos.is_finite() {
            return TrajectoryPoint { time, pos: initial.pos, vel, acc, jerk, snap };
        }
        TrajectoryPoint { time, pos, vel, acc, jerk, snap }
    }
}

fn integrate_phase(x: f64, v: f64, a: f64, j: f64, snap: f64, dt: f64) -> (f64, f64, f64, f64) {
    let (pos, vel, acc, jerk) = evaluate_polynomial(BoundaryState { pos: x, vel: v, acc: a, jerk: j }, snap, dt);
    (pos, vel, acc, jerk)
}

fn evaluate_polynomial(initial: BoundaryState, snap: f64, tau: f64) -> (f64, f64, f64, f64) {
    let dt2 = tau * tau;
    let dt3 = dt2 * tau;
    let dt4 = dt2 * dt2;
    let jerk = initial.jerk + snap * tau;
    let acc = initial.acc + initial.jerk * tau + 0.5 * snap * dt2;
    let vel = initial.vel + initial.acc * tau + 0.5 * initial.jerk * dt2 + (1.0 / 6.0) * snap * dt3;
    let pos = initial.pos
        + initial.vel * tau
        + 0.5 * initial.acc * dt2
        + (1.0 / 6.0) * initial.jerk * dt3
        + (1.0 / 24.0) * snap * dt4;
    (pos, vel, acc, jerk)
}

/// Ramp to `target_v` capped by `target_a`; returns `(td, tj, ta, final_v, final_s)`.
/// `final_v`/`final_s` are NaN if a non-finite intermediate was hit.
fn calculate_ramp_kinematics_internal(target_v: f64, target_a: f64, j_max: f64, d_max: f64) -> (f64, f64, f64, f64, f64) {
    if target_a <= SEARCH_EPS || target_v < -SEARCH_EPS {
        return (0.0, 0.0, 0.0, 0.0, 0.0);
    }
    let j_max = j_max.max(SEARCH_EPS);
    let d_max = d_max.max(SEARCH_EPS);

    let tj_crit = j_max / d_max;
    let a_crit = tj_crit * j_max;
    let (mut td, mut tj) = if target_a >= a_crit - SEARCH_EPS {
        (tj_crit, (target_a - a_crit) / j_max.max(SEARCH_EPS))
    } else {
        ((target_a / d_max).max(0.0).sqrt(), 0.0)
    };
    td = td.max(0.0);
    tj = tj.max(0.0);

    let vel_jerk_phases = target_a * (2.0 * td + tj);
    let mut ta = if target_v >= vel_jerk_phases - SEARCH_EPS {
        ((target_v - vel_jerk_phases) / target_a).max(0.0)
    } else {
        0.0
    };
    ta = ta.max(0.0);

    if td < SEARCH_EPS && tj < SEARCH_EPS && ta < SEARCH_EPS {
        return (td, tj, ta, 0.0, 0.0);
    }

    let dur = [td, tj, td, ta, td, tj, td];
    let snap = [d_max, 0.0, -d_max, 0.0, -d_max, 0.0, d_max];
    let (mut x, mut v, mut a, mut j) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..7 {
        let dt = dur[i];
        if dt < SEARCH_EPS {
            continue;
        }
        (x, v, a, j) = integrate_phase(x, v, a, j, snap[i], dt);
        if !x.is_finite() || !v.is_finite() || !a.is_finite() || !j.is_finite() {
            return (td, tj, ta, f64::NAN, f64::NAN);
        }
    }
    (td, tj, ta, v, x)
}

/// Triangle-wave (no `Ta`) ramp search helper; returns `(td, tj, s_ramp)`.
fn calculate_ramp_kinematics_for_search(target_a: f64, j_max: f64, d_max: f64) -> Result<(f64, f64, f64), ()> {
    if target_a <= SEARCH_EPS {
        return Ok((0.0, 0.0, 0.0));
    }
    let j_max = j_max.max(SEARCH_EPS);
    let d_max = d_max.max(SEARCH_EPS);

    let tj_crit = j_max / d_max;
    let a_crit = tj_crit * j_max;
    let (mut td, mut tj) = if target_a >= a_crit - SEARCH_EPS {
        (tj_crit, (target_a - a_crit) / j_max.max(SEARCH_EPS))
    } else {
        ((target_a / d_max).max(0.0).sqrt(), 0.0)
    };
    td = td.max(0.0);
    tj = tj.max(0.0);
    if td < SEARCH_EPS && tj < SEARCH_EPS {
        return Ok((td, tj, 0.0));
    }

    let dur = [td, tj, td, 0.0, td, tj, td];
    let snap = [d_max, 0.0, -d_max, 0.0, -d_max, 0.0, d_max];
    let (mut x, mut v, mut a, mut j) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..7 {
        let dt = dur[i];
        if dt < SEARCH_EPS {
            continue;
        }
        (x, v, a, j) = integrate_phase(x, v, a, j, snap[i], dt);
        if !x.is_finite() || !v.is_finite() || !a.is_finite() || !j.is_finite() {
            return Err(());
        }
    }
    Ok((td, tj, x))
}

/// Returns `(td, tj, ta, tv, total_time)` for the unscaled-optimal segmentation.
fn calculate_optimal_time_segments(input: &PlannerInput) -> Result<(f64, f64, f64, f64, f64), PlannerError> {
    let s = input.distance;
    if s < DEGENERATE_DISTANCE {
        return Ok((0.0, 0.0, 0.0, 0.0, 0.0));
    }

    let (td_ramp, tj_ramp, ta_ramp, v_ramp, s_ramp) =
        calculate_ramp_kinematics_internal(input.v_max, input.a_max, input.j_max, input.d_max);
    let _ = v_ramp;
    if !s_ramp.is_finite() {
        return Err(PlannerError::NumericalDivergence("ramp-to-vmax kinematics"));
    }

    let (td, tj, ta, tv);
    if 2.0 * s_ramp <= s + DIST_TOL {
        td = td_ramp;
        tj = tj_ramp;
        ta = ta_ramp;
        tv = if input.v_max > SEARCH_EPS { ((s - 2.0 * s_ramp) / input.v_max).max(0.0) } else { 0.0 };
    } else {
        let (mut a_low, mut a_high) = (0.0, input.a_max);
        let mut best_a = 0.0;
        let mut min_s_error = f64::MAX;
        let (mut td_best, mut tj_best) = (0.0, 0.0);
        let mut found = false;

        for iter in 0..MAX_ITERATIONS {
            let mut a_guess = 0.5 * (a_low + a_high);
            if a_guess <= 1e-15 {
                if a_low < 1e-14 && a_high < 1e-12 {
                    break;
                }
                a_guess = 1e-15;
            }

            match calculate_ramp_kinematics_for_search(a_guess, input.j_max, input.d_max) {
                Ok((td_g, tj_g, s_g)) if s_g.is_finite() => {
                    let error = 2.0 * s_g - s;
                    if error.abs() < min_s_error {
                        min_s_error = error.abs();
                        best_a = a_guess;
                        td_best = td_g;
                        tj_best = tj_g;
                        found = true;
                    }
                    if error > 0.0 {
                        a_high = a_guess;
                    } else {
                        a_low = a_guess;
                    }
                    if error.abs() < DIST_TOL || (a_high - a_low) < 1e-9 * a_high.max(1.0) {
                        break;
                    }
                }
                _ => {
                    if (a_high - a_low) < 1e-9 * input.a_max {
                        break;
                    }
                    a_low = a_guess;
                }
            }
            let _ = iter;
        }

        if !found {
            return Err(PlannerError::ConvergenceFailure);
        }
        let _ = best_a;
        td = td_best;
        tj = tj_best;
        ta = 0.0;
        tv = 0.0;
    }

    let total_time = (2.0 * (4.0 * td + 2.0 * tj + ta) + tv).max(0.0);
    Ok((td, tj, ta, tv, total_time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_input(distance: f64) -> PlannerInput {
        PlannerInput {
            distance,
            v_max: 0.8,
            a_max: 2.0,
            j_max: 10.0,
            d_max: 200.0,
            sample_time: 1e-3,
            time_limit: 0.0,
        }
    }

    #[test]
    fn default_move_has_a_cruise_phase_and_reaches_target() {
        let input = default_input(1.0);
        let mut ctx = PlannerContext::init(&input).expect("init should succeed");
        assert!(ctx.tv > 0.0, "expected a cruise phase");

        let mut last = TrajectoryPoint { time: 0.0, pos: 0.0, vel: 0.0, acc: 0.0, jerk: 0.0, snap: 0.0 };
        loop {
            let (point, done) = ctx.get_next_point();
            last = point;
            if done {
                break;
            }
        }
        assert!((last.pos - 1.0).abs() <= 1e-6);
        assert!(last.vel.abs() <= 1e-6);
        assert!(last.acc.abs() <= 1e-6);
        assert!(last.jerk.abs() <= 1e-6);
    }

    #[test]
    fn short_move_has_no_cruise_and_converges() {
        let input = default_input(0.001);
        let mut ctx = PlannerContext::init(&input).expect("init should succeed");
        assert_eq!(ctx.tv, 0.0);

        let mut last = TrajectoryPoint { time: 0.0, pos: 0.0, vel: 0.0, acc: 0.0, jerk: 0.0, snap: 0.0 };
        loop {
            let (point, done) = ctx.get_next_point();
            last = point;
            if done {
                break;
            }
        }
        assert!((last.pos - 0.001).abs() <= 1e-6);
        assert!(last.vel.abs() <= 1e-6);
    }

    #[test]
    fn zero_distance_is_immediately_done() {
        let input = default_input(0.0);
        let mut ctx = PlannerContext::init(&input).expect("init should succeed");
        let (point, done) = ctx.get_next_point();
        assert!(done);
        assert_eq!(point.pos, 0.0);
    }

    #[test]
    fn deadline_scales_alpha_above_one_and_hits_target() {
        let input = default_input(1.0);
        let baseline = PlannerContext::init(&input).unwrap();
        let optimal = baseline.total_time();

        let mut scaled_input = input;
        scaled_input.time_limit = 0.5 * optimal;
        let mut ctx = PlannerContext::init(&scaled_input).expect("scaled init should succeed");
        assert!(ctx.alpha > 1.0);
        assert!(ctx.is_time_scaled);
        assert!((ctx.total_time() - 0.5 * optimal).abs() < 1e-6);

        let mut last = TrajectoryPoint { time: 0.0, pos: 0.0, vel: 0.0, acc: 0.0, jerk: 0.0, snap: 0.0 };
        loop {
            let (point, done) = ctx.get_next_point();
            last = point;
            if done {
                break;
            }
        }
        assert!((last.pos - 1.0).abs() <= 1e-6);
        assert!(last.vel.abs() <= 1e-6);
    }

    #[test]
    fn velocity_is_non_negative_for_a_forward_move() {
        let input = default_input(1.0);
        let mut ctx = PlannerContext::init(&input).unwrap();
        loop {
            let (point, done) = ctx.get_next_point();
            assert!(point.vel >= -1e-9);
            if done {
                break;
            }
        }
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut input = default_input(1.0);
        input.a_max = -1.0;
        assert!(PlannerContext::init(&input).is_err());
    }
}
