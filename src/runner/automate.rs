//! Periodic-action runner
//!
//! Performs a randomly picked scenario, idles for a random number of
//! minutes and repeats, then puts the robot to rest.

use crate::channel::DeviceChannel;
use crate::command::CommandQueue;
use crate::core::Sleeper;
use crate::hardware::SerialTransport;
use crate::runner::RunnerError;
use crate::utils::AutomateConfig;
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// A named batch of command records
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<serde_json::Value>,
}

/// Read the scenario list; the file must hold a non-empty JSON array
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<Scenario>, RunnerError> {
    let path_str = path.as_ref().display().to_string();

    let content = fs::read_to_string(&path).map_err(|e| RunnerError::ScenarioMissing {
        path: path_str.clone(),
        source: e,
    })?;

    let scenarios: Vec<Scenario> =
        serde_json::from_str(&content).map_err(|e| RunnerError::ScenarioInvalid {
            path: path_str.clone(),
            source: e,
        })?;

    if scenarios.is_empty() {
        return Err(RunnerError::NoScenarios { path: path_str });
    }

    Ok(scenarios)
}

pub struct AutomateRunner<R = ThreadRng> {
    config: AutomateConfig,
    scenarios: Vec<Scenario>,
    rng: R,
}

impl AutomateRunner<ThreadRng> {
    pub fn new(config: AutomateConfig, scenarios: Vec<Scenario>) -> Self {
        Self::with_rng(config, scenarios, rand::thread_rng())
    }
}

impl<R: Rng> AutomateRunner<R> {
    pub fn with_rng(config: AutomateConfig, scenarios: Vec<Scenario>, rng: R) -> Self {
        Self {
            config,
            scenarios,
            rng,
        }
    }

    /// Minutes to idle between scenarios. An empty range falls back to the
    /// configured maximum.
    pub fn idle_minutes(&mut self) -> u64 {
        let (min, max) = (self.config.act_interval_min, self.config.act_interval_max);
        if min >= max {
            error!(
                "Failed to pick an idle time (range: {} to {}min)",
                min, max
            );
            return max;
        }
        self.rng.gen_range(min..max)
    }

    /// Perform `act_times` scenarios, then shut the channel down.
    /// Returns the names of the scenarios performed, in order.
    pub fn run<T: SerialTransport, S: Sleeper>(
        &mut self,
        channel: &mut DeviceChannel<T, S>,
    ) -> Result<Vec<String>, RunnerError> {
        if self.scenarios.is_empty() {
            return Err(RunnerError::NoScenarios {
                path: self.config.scenario_path.display().to_string(),
            });
        }

        let mut performed = Vec::new();
        let mut act_count = 0;
        loop {
            act_count += 1;

            let picked = match self.scenarios.choose(&mut self.rng) {
                Some(scenario) => scenario.clone(),
                None => break,
            };
            let queue = CommandQueue::from_records(&picked.commands);

            info!("Act take {} [{}]", act_count, picked.name);
            channel.transmit(&queue)?;

            for line in channel.drain_input() {
                debug!("{}", line);
            }
            performed.push(picked.name);

            if act_count >= self.config.act_times {
                info!("Bye!");
                break;
            }

            let idle = self.idle_minutes();
            info!("Idle sleep {}min", idle);
            channel.pause(Duration::from_secs(idle * 60));
        }

        channel.shutdown(true)?;
        Ok(performed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelSettings, ChannelState};
    use crate::core::RecordingSleeper;
    use crate::hardware::MockTransport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::io::Write;

    fn scenarios() -> Vec<Scenario> {
        vec![
            Scenario {
                name: "sit".to_string(),
                commands: vec![json!({"cmd": "ksit", "duration": 3}), json!({"cmd": "", "duration": 2})],
            },
            Scenario {
                name: "hello".to_string(),
                commands: vec![json!({"cmd": "khi", "duration": 4}), json!({"cmd": "kup", "duration": -4})],
            },
        ]
    }

    fn channel() -> DeviceChannel<MockTransport, RecordingSleeper> {
        DeviceChannel::with_sleeper(
            MockTransport::new(),
            ChannelSettings::with_min_command_secs(1),
            RecordingSleeper::new(),
        )
    }

    #[test]
    fn test_run_performs_act_times_and_rests() {
        let config = AutomateConfig::default();
        let mut runner = AutomateRunner::with_rng(config, scenarios(), StdRng::seed_from_u64(7));
        let mut ch = channel();

        let performed = runner.run(&mut ch).unwrap();
        assert_eq!(performed.len(), 3);

        let written = ch.transport().written_commands();
        // One motion per scenario, then the rest posture
        assert_eq!(written.len(), 4);
        assert_eq!(written.last().map(String::as_str), Some("d"));
        assert!(written[..3].iter().all(|c| c == "ksit" || c == "khi"));

        // Two idle periods between three acts, each 3 or 4 minutes
        let idles: Vec<_> = ch
            .sleeper()
            .calls()
            .iter()
            .filter(|d| d.as_secs() >= 60)
            .collect();
        assert_eq!(idles.len(), 2);
        for idle in idles {
            assert!(idle.as_secs() == 180 || idle.as_secs() == 240);
        }

        assert_eq!(ch.state(), ChannelState::Closed);
    }

    #[test]
    fn test_single_act_does_not_idle() {
        let config = AutomateConfig {
            act_times: 1,
            ..Default::default()
        };
        let mut runner = AutomateRunner::with_rng(config, scenarios(), StdRng::seed_from_u64(1));
        let mut ch = channel();

        runner.run(&mut ch).unwrap();
        assert!(ch.sleeper().calls().iter().all(|d| d.as_secs() < 60));
    }

    #[test]
    fn test_idle_range_fallback() {
        let config = AutomateConfig {
            act_interval_min: 6,
            act_interval_max: 6,
            ..Default::default()
        };
        let mut runner = AutomateRunner::with_rng(config, scenarios(), StdRng::seed_from_u64(3));
        assert_eq!(runner.idle_minutes(), 6);

        let config = AutomateConfig {
            act_interval_min: 2,
            act_interval_max: 3,
            ..Default::default()
        };
        let mut runner = AutomateRunner::with_rng(config, scenarios(), StdRng::seed_from_u64(3));
        assert_eq!(runner.idle_minutes(), 2);
    }

    #[test]
    fn test_run_without_scenarios() {
        let mut runner =
            AutomateRunner::with_rng(AutomateConfig::default(), Vec::new(), StdRng::seed_from_u64(0));
        let mut ch = channel();

        assert!(matches!(runner.run(&mut ch), Err(RunnerError::NoScenarios { .. })));
        assert!(ch.transport().written().is_empty());
    }

    #[test]
    fn test_write_failure_aborts_run() {
        let mut ch = channel();
        ch.transport_mut().fail_write(true);
        let mut runner =
            AutomateRunner::with_rng(AutomateConfig::default(), scenarios(), StdRng::seed_from_u64(0));

        assert!(matches!(runner.run(&mut ch), Err(RunnerError::Comm(_))));
    }

    #[test]
    fn test_load_scenarios() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "sit", "commands": [{{"cmd": "ksit", "duration": 3}}]}}, {{"name": "idle"}}]"#
        )
        .unwrap();

        let loaded = load_scenarios(file.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "sit");
        assert!(loaded[1].commands.is_empty());
    }

    #[test]
    fn test_shipped_scenarios_are_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/resources/automate.json");
        for scenario in load_scenarios(path).unwrap() {
            let queue = CommandQueue::from_records(&scenario.commands);
            assert_eq!(queue.len(), scenario.commands.len(), "{}", scenario.name);
        }
    }

    #[test]
    fn test_load_scenarios_errors() {
        assert!(matches!(
            load_scenarios("/nonexistent/automate.json"),
            Err(RunnerError::ScenarioMissing { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(load_scenarios(file.path()), Err(RunnerError::NoScenarios { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"name\": ").unwrap();
        assert!(matches!(load_scenarios(file.path()), Err(RunnerError::ScenarioInvalid { .. })));
    }
}
