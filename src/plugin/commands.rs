use super::devices::{UNIT_SETPOINT, UNIT_STRATEGY};
use super::{Endpoint, SessyPlugin};
use crate::error::{Result, SessyError};
use crate::host::SYSTEM_DEVICE_ID;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::sessy::{PowerStrategy, SwitchState};
use std::str::FromStr;

/// Host command verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandVerb {
    /// Selector or slider moved; the level carries the value
    SetLevel,
    Switch(SwitchState),
}

impl FromStr for CommandVerb {
    type Err = SessyError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("set level") {
            return Ok(CommandVerb::SetLevel);
        }
        s.parse::<SwitchState>()
            .map(CommandVerb::Switch)
            .map_err(|_| SessyError::command(format!("Unsupported command '{}'", s)))
    }
}

/// Per-battery share of a system-wide setpoint, rounded to whole watts
pub fn setpoint_share(total: i64, batteries: usize) -> i64 {
    if batteries == 0 {
        return 0;
    }
    (total as f64 / batteries as f64).round() as i64
}

/// Log a failed send and keep going; the first failure is reported
fn keep_first_error(
    outcome: Result<()>,
    sent: Result<()>,
    target: &Endpoint,
    logger: &StructuredLogger,
) -> Result<()> {
    if let Err(e) = &sent {
        logger.error(&format!("Command to {} failed: {}", target.config.name, e));
    }
    outcome.and(sent)
}

impl SessyPlugin {
    /// Relay a host command to the batteries it addresses
    ///
    /// The system device broadcasts to every battery; a battery device
    /// targets only itself. Commands are sent once. A broadcast reaches
    /// every battery even when one of them fails.
    pub async fn on_command(
        &mut self,
        device_id: &str,
        unit: u8,
        command: &str,
        level: f64,
    ) -> Result<()> {
        if !self.is_enabled() {
            return Err(SessyError::command("Plugin is not running"));
        }
        let logger = get_logger_with_context(
            LogContext::new("command")
                .with_device_id(device_id)
                .with_field("unit", unit.to_string()),
        );
        logger.info(&format!("Received '{}' level {}", command, level));

        let verb: CommandVerb = command.parse()?;
        let broadcast = device_id == SYSTEM_DEVICE_ID;
        let targets: Vec<Endpoint> = self
            .batteries
            .iter()
            .filter(|b| broadcast || b.config.name == device_id)
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(SessyError::command(format!(
                "No battery behind device '{}'",
                device_id
            )));
        }

        match unit {
            UNIT_STRATEGY => {
                let CommandVerb::SetLevel = verb else {
                    return Err(SessyError::command("Strategy only accepts 'Set Level'"));
                };
                let strategy = PowerStrategy::from_level(level.round() as i64)?;
                self.request_poll();
                let mut outcome = Ok(());
                for target in targets {
                    logger.info(&format!("Setting {} on {}", strategy, target.config.name));
                    let sent = target.api.set_strategy(strategy).await;
                    outcome = keep_first_error(outcome, sent, &target, &logger);
                }
                outcome?;
            }
            UNIT_SETPOINT => {
                let requested = match verb {
                    CommandVerb::SetLevel => level.round() as i64,
                    CommandVerb::Switch(SwitchState::Off) => 0,
                    CommandVerb::Switch(SwitchState::On) => {
                        return Err(SessyError::command("Setpoint cannot be switched on"));
                    }
                };
                let setpoint = if broadcast {
                    setpoint_share(requested, targets.len())
                } else {
                    requested
                };
                self.request_poll();
                let mut outcome = Ok(());
                for target in targets {
                    logger.info(&format!(
                        "Setting setpoint {}W on {}",
                        setpoint, target.config.name
                    ));
                    let sent = target.api.set_power_setpoint(setpoint).await;
                    outcome = keep_first_error(outcome, sent, &target, &logger);
                }
                outcome?;
            }
            other => {
                return Err(SessyError::command(format!(
                    "Unit {} does not accept commands",
                    other
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse() {
        assert_eq!("Set Level".parse::<CommandVerb>().unwrap(), CommandVerb::SetLevel);
        assert_eq!(
            "Off".parse::<CommandVerb>().unwrap(),
            CommandVerb::Switch(SwitchState::Off)
        );
        assert!(matches!(
            "Toggle".parse::<CommandVerb>().unwrap_err(),
            SessyError::Command { .. }
        ));
    }

    #[test]
    fn setpoint_is_shared_evenly() {
        assert_eq!(setpoint_share(1000, 4), 250);
        assert_eq!(setpoint_share(-1000, 3), -333);
        assert_eq!(setpoint_share(1000, 3), 333);
        assert_eq!(setpoint_share(1000, 0), 0);
    }
}
