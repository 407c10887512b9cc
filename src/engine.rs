//! Per-axis control orchestrator: owns every axis runtime and the fault
//! arrays, and runs the masked control step the command dispatcher drives.

use tracing::warn;

use crate::controller::Controller;
use crate::error::EngineError;
use crate::planner::{PlannerContext, PlannerInput};
use crate::plant::RigidBodyPlant;
use crate::safety::{
    apply_safety_control, AccelWindow, AxisFaultCtx, ControlMode, FaultKind, SafetyControlData, SystemFaultCtx,
    AXIS_COUNT,
};

pub const TOTAL_STEPS: u32 = 1001;
pub const SAMPLING_TIME: f64 = 1e-3;
pub const DEFAULT_MASS: f64 = 16.0;

fn default_planner_input() -> PlannerInput {
    PlannerInput {
        distance: 1.0,
        v_max: 0.8,
        a_max: 2.0,
        j_max: 10.0,
        d_max: 200.0,
        sample_time: SAMPLING_TIME,
        time_limit: 0.0,
    }
}

/// Last snapshot of one axis' step, also the unit a telemetry row is built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisSnapshot {
    pub target: f64,
    pub actual: f64,
    pub error: f64,
    pub force: f64,
    pub mode_is_open: bool,
}

pub struct AxisRuntime {
    pub plant: RigidBodyPlant,
    pub controller: Controller,
    pub planner: Option<PlannerContext>,
    pub step: u32,
    pub active: bool,
    pub snapshot: AxisSnapshot,
}

impl AxisRuntime {
    fn new(mass: f64) -> Self {
        Self {
            plant: RigidBodyPlant::new(mass, SAMPLING_TIME),
            controller: Controller::new(),
            planner: PlannerContext::init(&default_planner_input()).ok(),
            step: 0,
            active: false,
            snapshot: AxisSnapshot::default(),
        }
    }
}

/// One record of telemetry emitted after a control step: global step,
/// timestamp derived from the first masked axis, and per-axis snapshots.
#[derive(Debug, Clone)]
pub struct TelemetryRecord {
    pub step: u32,
    pub time: f64,
    pub axes: Vec<(usize, AxisSnapshot)>,
}

/// Owns every axis runtime and the process-wide fault arrays; the sole
/// mutator of plant, controller, safety, and fault state.
pub struct Engine {
    pub axes: Vec<AxisRuntime>,
    pub safety: Vec<SafetyControlData>,
    pub faults: Vec<AxisFaultCtx>,
    pub system_fault: SystemFaultCtx,
    pub control_step: u32,
    pub running: bool,
}

impl Engine {
    pub fn new(active_axis_count: usize) -> Self {
        assert!(active_axis_count <= AXIS_COUNT);
        let axes = (0..active_axis_count).map(|_| AxisRuntime::new(DEFAULT_MASS)).collect();
        Self {
            axes,
            safety: vec![SafetyControlData::default(); AXIS_COUNT],
            faults: vec![AxisFaultCtx::default(); AXIS_COUNT],
            system_fault: SystemFaultCtx::default(),
            control_step: 0,
            running: true,
        }
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn reset_counters(&mut self) {
        self.control_step = 0;
        for axis in &mut self.axes {
            axis.step = 0;
            axis.active = false;
        }
    }

    pub fn replace_planner(&mut self, axis: usize, input: PlannerInput) -> Result<(), EngineError> {
        match PlannerContext::init(&input) {
            Ok(ctx) => {
                self.axes[axis].planner = Some(ctx);
                Ok(())
            }
            Err(e) => {
                warn!("planner re-init failed for axis {axis}: {e}");
                self.axes[axis].planner = None;
                Ok(())
            }
        }
    }

    pub fn set_gains(&mut self, axis: usize, kp: f64, ki: f64, kd: f64) {
        self.axes[axis].controller.set_gains(kp, ki, kd);
    }

    pub fn emergency_stop(&mut self) {
        self.running = false;
        for axis in 0..self.axes.len() {
            self.faults[axis].raise(FaultKind::HardwareEmergencyStop);
            self.faults[axis].update();
        }
        self.system_fault.update(&self.faults);
        for axis in 0..self.axes.len() {
            self.safety[axis].mode = ControlMode::Open;
            self.axes[axis].snapshot.force = 0.0;
            self.axes[axis].snapshot.mode_is_open = true;
        }
    }

    /// Run one control step on every axis set in `mask` (bit `i` = axis `i`).
    pub fn execute_control_step(&mut self, mask: u32) -> Result<Option<TelemetryRecord>, EngineError> {
        if !self.running {
            return Ok(None);
        }
        if self.system_fault.system_fault {
            self.running = false;
            return Err(EngineError::SystemFault);
        }

        let axis_count = self.axes.len();
        // Gated on the global control step, matching `sysCtrlState->iControlStep *
        // SAMPLINGTIME < pContext[axis]->dTa`, not each axis's own step counter.
        let elapsed = self.control_step as f64 * SAMPLING_TIME;
        let gate: Vec<AccelWindow> = (0..axis_count)
            .map(|axis| {
                let ta = self.axes[axis].planner.as_ref().map(|p| p.diagnostics().ta).unwrap_or(0.0);
                AccelWindow { elapsed, ta }
            })
            .collect();

        for axis in 0..axis_count {
            if mask & (1 << axis) == 0 {
                continue;
            }
            self.axes[axis].active = true;

            if self.axes[axis].step >= TOTAL_STEPS {
                continue;
            }

            if self.faults[axis].axis_fault {
                self.safety[axis].mode = ControlMode::Open;
                self.axes[axis].snapshot.force = 0.0;
                self.axes[axis].snapshot.mode_is_open = true;
                continue;
            }

            let target = match self.axes[axis].planner.as_mut() {
                Some(planner) => planner.get_next_point().0.pos,
                None => self.axes[axis].snapshot.target,
            };
            let actual = self.axes[axis].plant.last_output();
            let error = target - actual;

            let raw_force = self.axes[axis].controller.update(error);
            let force = apply_safety_control(axis, raw_force, error, &gate, &mut self.safety, &mut self.faults);

            self.axes[axis].plant.update(force);
            self.axes[axis].step += 1;

            self.axes[axis].snapshot = AxisSnapshot {
                target,
                actual,
                error,
                force,
                mode_is_open: self.safety[axis].mode == ControlMode::Open,
            };
        }

        self.system_fault.update(&self.faults);

        for axis in 0..axis_count {
            if mask & (1 << axis) == 0 {
                continue;
            }
            let snap = self.axes[axis].snapshot;
            if !snap.error.is_finite() || !snap.force.is_finite() {
                return Err(EngineError::NonFiniteValue { axis });
            }
        }

        let mut record_time = 0.0;
        let mut axes_out = Vec::new();
        for axis in 0..axis_count {
            if mask & (1 << axis) == 0 {
                continue;
            }
            if axes_out.is_empty() {
                record_time = (self.axes[axis].step as f64 - 1.0) * SAMPLING_TIME;
            }
            axes_out.push((axis, self.axes[axis].snapshot));
        }

        let record = TelemetryRecord { step: self.control_step, time: record_time, axes: axes_out };
        self.control_step += 1;
        Ok(Some(record))
    }
}
