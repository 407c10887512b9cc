//! Command dispatcher: decodes the fixed wire command fields into a typed
//! `Command`, then drives the `Engine` the way the command table in the
//! external interface describes.

use tracing::{info, warn};

use crate::engine::{Engine, TelemetryRecord, TOTAL_STEPS};
use crate::planner::PlannerInput;

/// `axis` encoding for commands 1/3: `1` -> axis 0, `2` -> axis 1, `3` -> both.
fn axis_mask_from_legacy_encoding(axis: i32) -> Option<u32> {
    match axis {
        1 => Some(0b01),
        2 => Some(0b10),
        3 => Some(0b11),
        _ => None,
    }
}

/// Sentinel-zero parameter: `0.0` means "use the default/current value".
fn sentinel(value: f64, default: f64) -> f64 {
    if value != 0.0 {
        value
    } else {
        default
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RawRequest {
    pub cmd: i32,
    pub axis: i32,
    pub param: [f64; 5],
}

#[derive(Debug, Clone, Copy)]
pub enum Command {
    Step { axis_mask: u32 },
    ResetCounters,
    MultiStep { axis_mask: u32, steps: i32 },
    EmergencyStop,
    SetTrajectory { axis: usize, param: [f64; 5] },
    SetGains { axis: usize, param: [f64; 5] },
    Query { axis: usize },
    StepAll,
    MultiStepAll { steps: i32 },
    Disconnect,
    Unknown(i32),
}

impl Command {
    pub fn decode(req: RawRequest, axis_count: usize) -> Option<Command> {
        match req.cmd {
            1 => axis_mask_from_legacy_encoding(req.axis).map(|axis_mask| Command::Step { axis_mask }),
            2 => Some(Command::ResetCounters),
            3 => axis_mask_from_legacy_encoding(req.axis)
                .map(|axis_mask| Command::MultiStep { axis_mask, steps: req.param[0] as i32 }),
            4 => Some(Command::EmergencyStop),
            5 if (req.axis as usize) < axis_count && req.axis >= 0 => {
                Some(Command::SetTrajectory { axis: req.axis as usize, param: req.param })
            }
            6 if (req.axis as usize) < axis_count && req.axis >= 0 => {
                Some(Command::SetGains { axis: req.axis as usize, param: req.param })
            }
            7 if (req.axis as usize) < axis_count && req.axis >= 0 => Some(Command::Query { axis: req.axis as usize }),
            8 => Some(Command::StepAll),
            9 => Some(Command::MultiStepAll { steps: req.param[0] as i32 }),
            999 => Some(Command::Disconnect),
            5 | 6 | 7 => {
                warn!("invalid axis {} for cmd {}", req.axis, req.cmd);
                None
            }
            other => Some(Command::Unknown(other)),
        }
    }
}

/// Result of dispatching one command: whether the connection should close,
/// and an optional human-readable snapshot for cmd 7.
pub struct DispatchOutcome {
    pub close_connection: bool,
    pub status_text: Option<String>,
}

impl Default for DispatchOutcome {
    fn default() -> Self {
        Self { close_connection: false, status_text: None }
    }
}

pub fn dispatch(engine: &mut Engine, command: Command, mut on_telemetry: impl FnMut(TelemetryRecord)) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    match command {
        Command::Step { axis_mask } => {
            if let Ok(Some(record)) = engine.execute_control_step(axis_mask) {
                on_telemetry(record);
            }
        }
        Command::ResetCounters => {
            info!("resetting control step counters");
            engine.reset_counters();
        }
        Command::MultiStep { axis_mask, steps } => {
            for _ in 0..steps.max(0) {
                let axes_at_cap = (0..engine.axis_count())
                    .filter(|axis| axis_mask & (1 << axis) != 0)
                    .all(|axis| engine.axes[axis].step < TOTAL_STEPS);
                if !axes_at_cap {
                    break;
                }
                match engine.execute_control_step(axis_mask) {
                    Ok(Some(record)) => on_telemetry(record),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("control step failed: {e}");
                        break;
                    }
                }
            }
        }
        Command::EmergencyStop => {
            warn!("emergency stop requested");
            engine.emergency_stop();
        }
        Command::SetTrajectory { axis, param } => {
            let input = PlannerInput {
                distance: sentinel(param[0], 1.0),
                v_max: sentinel(param[1], 0.8),
                a_max: sentinel(param[2], 2.0),
                j_max: sentinel(param[3], 10.0),
                d_max: sentinel(param[4], 200.0),
                sample_time: 1e-3,
                time_limit: 0.0,
            };
            let _ = engine.replace_planner(axis, input);
        }
        Command::SetGains { axis, param } => {
            engine.set_gains(axis, param[0], param[1], param[2]);
        }
        Command::Query { axis } => {
            let snap = engine.axes[axis].snapshot;
            let (kp, ki, kd) = engine.axes[axis].controller.gains();
            let mass = engine.axes[axis].plant.mass();
            outcome.status_text = Some(format!(
                "axis={axis} step={} target={:.12} actual={:.15} error={:.13} force={:.9} kp={kp:.6} ki={ki:.6} kd={kd:.6} mass={mass:.6}",
                engine.axes[axis].step, snap.target, snap.actual, snap.error, snap.force
            ));
        }
        Command::StepAll => {
            let mask = (1u32 << engine.axis_count()) - 1;
            if let Ok(Some(record)) = engine.execute_control_step(mask) {
                on_telemetry(record);
            }
        }
        Command::MultiStepAll { steps } => {
            let mask = (1u32 << engine.axis_count()) - 1;
            for _ in 0..steps.max(0) {
                if engine.control_step >= TOTAL_STEPS {
                    break;
                }
                match engine.execute_control_step(mask) {
                    Ok(Some(record)) => on_telemetry(record),
                    Ok(None) => break,
                    Err(e) => {
                        warn!("control step failed: {e}");
                        break;
                    }
                }
            }
        }
        Command::Disconnect => {
            info!("disconnect command received");
            engine.running = false;
            outcome.close_connection = true;
        }
        Command::Unknown(cmd) => {
            warn!("unknown command: {cmd}");
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(cmd: i32, axis: i32, param: [f64; 5]) -> RawRequest {
        RawRequest { cmd, axis, param }
    }

    #[test]
    fn cmd1_axis_encoding_maps_to_masks() {
        assert!(matches!(
            Command::decode(req(1, 1, [0.0; 5]), 2),
            Some(Command::Step { axis_mask: 0b01 })
        ));
        assert!(matches!(
            Command::decode(req(1, 2, [0.0; 5]), 2),
            Some(Command::Step { axis_mask: 0b10 })
        ));
        assert!(matches!(
            Command::decode(req(1, 3, [0.0; 5]), 2),
            Some(Command::Step { axis_mask: 0b11 })
        ));
        assert!(Command::decode(req(1, 0, [0.0; 5]), 2).is_none());
    }

    #[test]
    fn cmd5_and_cmd6_use_zero_based_axis() {
        assert!(matches!(
            Command::decode(req(5, 1, [0.0; 5]), 2),
            Some(Command::SetTrajectory { axis: 1, .. })
        ));
        assert!(Command::decode(req(6, 5, [0.0; 5]), 2).is_none());
    }

    #[test]
    fn cmd999_maps_to_disconnect() {
        assert!(matches!(Command::decode(req(999, 0, [0.0; 5]), 2), Some(Command::Disconnect)));
    }

    #[test]
    fn dispatch_emergency_stop_clears_run_flag() {
        let mut engine = Engine::new(2);
        dispatch(&mut engine, Command::EmergencyStop, |_| {});
        assert!(!engine.running);
    }

    #[test]
    fn dispatch_set_gains_zero_sentinel_preserves_existing() {
        let mut engine = Engine::new(2);
        dispatch(&mut engine, Command::SetGains { axis: 0, param: [0.0, 99.0, 0.0, 0.0, 0.0] }, |_| {});
        let (kp, ki, kd) = engine.axes[0].controller.gains();
        assert_eq!(ki, 99.0);
        assert_eq!(kp, crate::controller::KP_DEFAULT);
        assert_eq!(kd, crate::controller::KD_DEFAULT);
    }
}
