use log::debug;
use roi_bridge::{ForwardError, Roi, RoiClient};
use thiserror::Error;

const BANNER: &str = "--------------------------------------------------";

/// What the simulator provides to a running system task.
pub trait TaskHost {
    /// Integer values of the call's arguments, or `None` when the call has
    /// no argument list at all.
    fn arguments(&mut self) -> Option<Vec<i32>>;

    /// Writes text to the simulator's output channel.
    fn print(&mut self, text: &str);
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{name} requires arguments (x, y, w, h)", name = SendRoiTask::NAME)]
    MissingArguments,

    #[error("{name} expects 4 arguments (x, y, w, h), got {0}", name = SendRoiTask::NAME)]
    WrongArgumentCount(usize),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

/// The `$send_roi_for_emotion(x, y, w, h)` system task.
///
/// Holds no per-call state. Each call reports its outcome through the host
/// and never fails the simulation.
#[derive(Debug, Clone, Default)]
pub struct SendRoiTask {
    client: RoiClient,
}

impl SendRoiTask {
    pub const NAME: &'static str = "$send_roi_for_emotion";

    pub fn new(client: RoiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RoiClient {
        &self.client
    }

    /// Runs one call and prints the outcome. The result is returned for
    /// callers that want it; the simulator callback ignores it.
    pub fn call<H>(&self, host: &mut H) -> Result<String, TaskError>
    where
        H: TaskHost + ?Sized,
    {
        let result = self.exchange(host);

        match &result {
            Ok(response) => host.print(&render_result(response)),
            Err(err) => host.print(&render_error(err)),
        }

        result
    }

    fn exchange<H>(&self, host: &mut H) -> Result<String, TaskError>
    where
        H: TaskHost + ?Sized,
    {
        let args = match host.arguments() {
            Some(args) if !args.is_empty() => args,
            _ => return Err(TaskError::MissingArguments),
        };
        let roi = Roi::try_from(args.as_slice())
            .map_err(|_| TaskError::WrongArgumentCount(args.len()))?;

        let Roi { x, y, w, h } = roi;
        host.print(&format!(
            "Sending ROI (x={}, y={}, w={}, h={})\n",
            x, y, w, h
        ));
        debug!("Forwarding {} to {}", roi, self.client.config().endpoint());

        let response = self.client.forward(roi)?;
        Ok(response)
    }
}

pub fn render_result(response: &str) -> String {
    format!("{BANNER}\nReceived Result: {response}\n{BANNER}\n")
}

pub fn render_error(err: &TaskError) -> String {
    format!("ERROR: {}\n", err)
}
