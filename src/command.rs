use std::thread;
use std::time::Duration;

use log::trace;

pub const TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Lifecycle every tick-driven command exposes to its supervisor. The hooks
/// default to no-ops so most commands only write tick() and is_finished().
/// Ticking a command again after it reported finished is the caller's bug.
pub trait Command {
    fn on_start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn tick(&mut self) -> anyhow::Result<()>;

    fn is_finished(&self) -> anyhow::Result<bool>;

    fn on_end(&mut self, _interrupted: bool) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum RunOutcome {
    Finished { ticks: u64 },
    TimedOut { ticks: u64 },
}

/// Drives one command to completion at a fixed tick interval.
pub struct CommandRunner {
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            max_ticks: None,
        }
    }

    /// Zero is legal and is what the tests use.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn run(&self, command: &mut dyn Command) -> anyhow::Result<RunOutcome> {
        command.on_start()?;
        let mut ticks = 0;
        loop {
            if let Err(e) = command.tick() {
                let _ = command.on_end(true);
                return Err(e);
            }
            ticks += 1;

            match command.is_finished() {
                Ok(true) => {
                    command.on_end(false)?;
                    trace!("finished after {ticks} ticks");
                    return Ok(RunOutcome::Finished { ticks });
                }
                Ok(false) => {}
                Err(e) => {
                    let _ = command.on_end(true);
                    return Err(e);
                }
            }

            if let Some(max_ticks) = self.max_ticks {
                if ticks >= max_ticks {
                    command.on_end(true)?;
                    return Ok(RunOutcome::TimedOut { ticks });
                }
            }

            // TODO: This of course should be a proper RT interval!
            thread::sleep(self.tick_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[derive(Default)]
    struct CountingCommand {
        finish_after: u64,
        fail_on: Option<u64>,
        starts: u32,
        ticks: u64,
        ends: Vec<bool>,
    }

    impl Command for CountingCommand {
        fn on_start(&mut self) -> anyhow::Result<()> {
            self.starts += 1;
            Ok(())
        }

        fn tick(&mut self) -> anyhow::Result<()> {
            self.ticks += 1;
            if self.fail_on == Some(self.ticks) {
                return Err(anyhow!("tick {} blew up", self.ticks));
            }
            Ok(())
        }

        fn is_finished(&self) -> anyhow::Result<bool> {
            Ok(self.ticks >= self.finish_after)
        }

        fn on_end(&mut self, interrupted: bool) -> anyhow::Result<()> {
            self.ends.push(interrupted);
            Ok(())
        }
    }

    fn instant_runner() -> CommandRunner {
        CommandRunner::new().with_tick_interval(Duration::ZERO)
    }

    #[test]
    fn test_runs_until_finished() {
        let mut command = CountingCommand {
            finish_after: 3,
            ..Default::default()
        };
        let outcome = instant_runner().run(&mut command).unwrap();
        assert_eq!(outcome, RunOutcome::Finished { ticks: 3 });
        assert_eq!(command.starts, 1);
        assert_eq!(command.ends, vec![false]);
    }

    #[test]
    fn test_tick_budget_interrupts() {
        let mut command = CountingCommand {
            finish_after: u64::MAX,
            ..Default::default()
        };
        let outcome = instant_runner()
            .with_max_ticks(5)
            .run(&mut command)
            .unwrap();
        assert_eq!(outcome, RunOutcome::TimedOut { ticks: 5 });
        assert_eq!(command.ends, vec![true]);
    }

    #[test]
    fn test_finishing_on_the_last_allowed_tick_is_not_a_timeout() {
        let mut command = CountingCommand {
            finish_after: 5,
            ..Default::default()
        };
        let outcome = instant_runner()
            .with_max_ticks(5)
            .run(&mut command)
            .unwrap();
        assert_eq!(outcome, RunOutcome::Finished { ticks: 5 });
        assert_eq!(command.ends, vec![false]);
    }

    #[test]
    fn test_tick_error_ends_interrupted() {
        let mut command = CountingCommand {
            finish_after: u64::MAX,
            fail_on: Some(2),
            ..Default::default()
        };
        let result = instant_runner().run(&mut command);
        assert!(result.is_err());
        assert_eq!(command.ends, vec![true]);
    }
}
