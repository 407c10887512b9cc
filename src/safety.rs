//! Fault-driven safety supervisor: per-axis SAFINI/FMASK/FDEF fault chain,
//! system-level aggregate, and the accel-phase-gated error-threshold trip
//! that switches an axis from closed-loop to open-loop control.

pub const AXIS_COUNT: usize = 8;
pub const FAULT_COUNT: usize = 20;
pub const ERROR_THRESHOLD: f64 = 7e-10;

/// The 20 fault-type slots the per-axis vectors are indexed by. Only the two
/// named below are raised anywhere in this implementation; the rest are
/// reserved slots preserving the 20-wide shape the fault-aggregation chain
/// depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FaultKind {
    NonCriticalPosErr = 0,
    HardwareEmergencyStop = 1,
    Reserved02 = 2,
    Reserved03 = 3,
    Reserved04 = 4,
    Reserved05 = 5,
    Reserved06 = 6,
    Reserved07 = 7,
    Reserved08 = 8,
    Reserved09 = 9,
    Reserved10 = 10,
    Reserved11 = 11,
    Reserved12 = 12,
    Reserved13 = 13,
    Reserved14 = 14,
    Reserved15 = 15,
    Reserved16 = 16,
    Reserved17 = 17,
    Reserved18 = 18,
    Reserved19 = 19,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy)]
pub struct SafetyControlData {
    pub mode: ControlMode,
    pub last_valid_output: f64,
}

impl Default for SafetyControlData {
    fn default() -> Self {
        Self {
            mode: ControlMode::Closed,
            last_valid_output: 0.0,
        }
    }
}

/// Per-axis fault vectors and aggregate.
#[derive(Debug, Clone)]
pub struct AxisFaultCtx {
    pub safini: [bool; FAULT_COUNT],
    pub fmask: [bool; FAULT_COUNT],
    /// Declared but never consulted by `update` — preserved, not wired in.
    pub fdef: [bool; FAULT_COUNT],
    pub raw_fault: [bool; FAULT_COUNT],
    pub fault: [bool; FAULT_COUNT],
    pub internal_safety_cond: bool,
    pub axis_fault: bool,
}

impl Default for AxisFaultCtx {
    fn default() -> Self {
        Self {
            safini: [false; FAULT_COUNT],
            fmask: [true; FAULT_COUNT],
            fdef: [true; FAULT_COUNT],
            raw_fault: [false; FAULT_COUNT],
            fault: [false; FAULT_COUNT],
            internal_safety_cond: true,
            axis_fault: false,
        }
    }
}

impl AxisFaultCtx {
    pub fn raise(&mut self, kind: FaultKind) {
        self.raw_fault[kind as usize] = true;
    }

    /// Fold the raw fault vector through SAFINI/FMASK into the per-axis
    /// aggregate. `FDEF` is intentionally not read here.
    ///
    /// Folds `s` against `internalSafetyCond` by equality, not XOR: with the
    /// default `internalSafetyCond = true`, XOR would cancel every raised
    /// fault back to `false` (the two true values cancel), so a masked fault
    /// could never latch under default settings. Equality keeps `x == s`
    /// whenever `internalSafetyCond` is true, which is the default case.
    pub fn update(&mut self) {
        self.axis_fault = false;
        for i in 0..FAULT_COUNT {
            if !self.raw_fault[i] {
                continue;
            }
            let s = if self.safini[i] { !self.raw_fault[i] } else { self.raw_fault[i] };
            let x = s == self.internal_safety_cond;
            if self.fmask[i] {
                self.fault[i] = x;
                self.axis_fault |= x;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SystemFaultCtx {
    pub ssafini: bool,
    pub sfmask: bool,
    pub system_safety_cond: bool,
    pub system_fault: bool,
}

impl Default for SystemFaultCtx {
    fn default() -> Self {
        Self {
            ssafini: false,
            sfmask: true,
            system_safety_cond: true,
            system_fault: false,
        }
    }
}

impl SystemFaultCtx {
    /// Same equality fold as `AxisFaultCtx::update`, for the same reason:
    /// XOR against a default-`true` `systemSafetyCond` would always cancel.
    pub fn update(&mut self, axis_faults: &[AxisFaultCtx]) {
        let any = axis_faults.iter().any(|a| a.axis_fault);
        let o = any || self.system_safety_cond;
        let s = if self.ssafini { !o } else { o };
        let x = s == self.system_safety_cond;
        self.system_fault = x && self.sfmask;
    }
}

/// Arguments the accel-window gate needs from every active axis' planner
/// context: how far into its own accel phase the control step currently is.
pub struct AccelWindow {
    pub elapsed: f64,
    pub ta: f64,
}

/// `ApplySafetyControl`. `gate` carries every axis' `(elapsed, Ta)` so the
/// gate is "within the accel phase of *any* axis", matching the upstream
/// behavior verbatim; the trip itself (mode switch, fault raise, zero force)
/// is applied only to `axis` -- see DESIGN.md for why this split is correct.
pub fn apply_safety_control(
    axis: usize,
    control_force: f64,
    error: f64,
    gate: &[AccelWindow],
    safety: &mut [SafetyControlData],
    faults: &mut [AxisFaultCtx],
) -> f64 {
    let within_any_accel_window = gate.iter().any(|w| w.elapsed < w.ta);

    if within_any_accel_window
        && error.abs() > ERROR_THRESHOLD
        && safety[axis].mode == ControlMode::Closed
    {
        safety[axis].mode = ControlMode::Open;
        safety[axis].last_valid_output = control_force;

        faults[axis].raise(FaultKind::NonCriticalPosErr);
        faults[axis].update();
        return 0.0;
    }

    safety[axis].last_valid_output = control_force;
    control_force
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_yield_no_fault_for_all_zero_raw() {
        let mut ctx = AxisFaultCtx::default();
        ctx.update();
        assert!(!ctx.axis_fault);
    }

    #[test]
    fn raising_a_masked_bit_raises_the_aggregate() {
        let mut ctx = AxisFaultCtx::default();
        ctx.raise(FaultKind::NonCriticalPosErr);
        ctx.update();
        assert!(ctx.axis_fault);
    }

    #[test]
    fn clearing_fmask_suppresses_the_fault() {
        let mut ctx = AxisFaultCtx::default();
        ctx.raise(FaultKind::NonCriticalPosErr);
        ctx.fmask[FaultKind::NonCriticalPosErr as usize] = false;
        ctx.update();
        assert!(!ctx.axis_fault);
    }

    #[test]
    fn system_safety_cond_raises_system_fault_regardless_of_axes() {
        let axes = vec![AxisFaultCtx::default(); 2];
        let mut sys = SystemFaultCtx::default();
        sys.update(&axes);
        assert!(sys.system_fault);
    }

    #[test]
    fn safety_trip_switches_to_open_and_zeroes_force() {
        let mut safety = vec![SafetyControlData::default(); 2];
        let mut faults = vec![AxisFaultCtx::default(); 2];
        let gate = [AccelWindow { elapsed: 0.0, ta: 1.0 }];

        let force = apply_safety_control(0, 12.5, 1e-9, &gate, &mut safety, &mut faults);

        assert_eq!(force, 0.0);
        assert_eq!(safety[0].mode, ControlMode::Open);
        assert!(faults[0].raw_fault[FaultKind::NonCriticalPosErr as usize]);
        assert!(faults[0].axis_fault);
    }

    #[test]
    fn normal_closed_loop_passes_force_through() {
        let mut safety = vec![SafetyControlData::default(); 2];
        let mut faults = vec![AxisFaultCtx::default(); 2];
        let gate = [AccelWindow { elapsed: 2.0, ta: 1.0 }];

        let force = apply_safety_control(0, 3.3, 1e-9, &gate, &mut safety, &mut faults);

        assert_eq!(force, 3.3);
        assert_eq!(safety[0].mode, ControlMode::Closed);
    }
}
