//! The `$send_roi_for_emotion(x, y, w, h)` Verilog system task.
//!
//! Built as a VPI module. The simulator loads it, runs the registration
//! routine from `vlog_startup_routines`, and every call of the task forwards
//! one ROI to the emotion server through [`roi_bridge::RoiClient`].
//!
//! The endpoint and timeouts come from the JSON5 file named by
//! `ROI_BRIDGE_CONFIG` (defaults: `127.0.0.1:8888`, no timeouts). Log records
//! at or above `ROI_VPI_LOG` (default `warn`) are printed by the simulator.

mod logger;
mod task;
#[cfg(unix)]
mod vpi;

pub use logger::{level_from_env, HostLogger, LOG_ENV};
pub use task::{render_error, render_result, SendRoiTask, TaskError, TaskHost};
