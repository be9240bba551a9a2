use gdlsp_config::AutoReconnectConfig;

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub cooldown: Duration,
    attempts_made: u32,
}

impl ReconnectPolicy {
    pub fn new(enabled: bool, max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            enabled,
            max_attempts,
            cooldown,
            attempts_made: 0,
        }
    }

    pub fn from_config(config: &AutoReconnectConfig) -> Self {
        Self::new(config.enabled, config.attempts, config.cooldown())
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn can_retry(&self) -> bool {
        self.enabled && self.attempts_made < self.max_attempts
    }

    pub fn record_attempt(&mut self) {
        self.attempts_made += 1;
    }

    pub fn reset(&mut self) {
        self.attempts_made = 0;
    }
}
