use crate::config::EnvConfig;
use crate::simulation::Vehicle;

/// The episode is over if the ego vehicle crashed, or left the road when
/// `offroad_terminal` is set.
pub fn is_terminated(ego: &Vehicle, offroad_terminal: bool) -> bool {
    ego.crashed || (offroad_terminal && !ego.on_road)
}

/// The episode is cut once the time limit is reached.
pub fn is_truncated(time: f64, duration: f64) -> bool {
    time >= duration
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpisodeStatus {
    pub terminated: bool,
    pub truncated: bool,
}

impl EpisodeStatus {
    pub fn evaluate(ego: &Vehicle, time: f64, config: &EnvConfig) -> Self {
        Self {
            terminated: is_terminated(ego, config.offroad_terminal),
            truncated: is_truncated(time, config.duration),
        }
    }

    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}
