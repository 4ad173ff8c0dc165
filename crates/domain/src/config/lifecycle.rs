use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::turn::Channel;

/// Per-channel override of the global lifecycle reset schedule (§4.C, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelLifecycleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_reset_hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_minutes: Option<u32>,
}

/// Session lifecycle reset configuration: a routine, non-punitive refresh of
/// `session_id` on a daily boundary crossing or after an idle timeout, with
/// identity continuity preserved (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "d_daily_reset_hour")]
    pub daily_reset_hour: u8,
    #[serde(default = "d_idle_timeout_minutes")]
    pub idle_timeout_minutes: u32,
    #[serde(default)]
    pub per_channel: HashMap<Channel, ChannelLifecycleOverride>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            daily_reset_hour: d_daily_reset_hour(),
            idle_timeout_minutes: d_idle_timeout_minutes(),
            per_channel: HashMap::new(),
        }
    }
}

impl LifecycleConfig {
    pub fn daily_reset_hour_for(&self, channel: Channel) -> u8 {
        self.per_channel
            .get(&channel)
            .and_then(|o| o.daily_reset_hour)
            .unwrap_or(self.daily_reset_hour)
    }

    pub fn idle_timeout_minutes_for(&self, channel: Channel) -> u32 {
        self.per_channel
            .get(&channel)
            .and_then(|o| o.idle_timeout_minutes)
            .unwrap_or(self.idle_timeout_minutes)
    }
}

fn d_daily_reset_hour() -> u8 {
    4
}
fn d_idle_timeout_minutes() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_global_when_no_override() {
        let cfg = LifecycleConfig::default();
        assert_eq!(cfg.idle_timeout_minutes_for(Channel::Phone), 30);
    }

    #[test]
    fn per_channel_override_wins() {
        let mut cfg = LifecycleConfig::default();
        cfg.per_channel.insert(
            Channel::Phone,
            ChannelLifecycleOverride { daily_reset_hour: None, idle_timeout_minutes: Some(5) },
        );
        assert_eq!(cfg.idle_timeout_minutes_for(Channel::Phone), 5);
        assert_eq!(cfg.idle_timeout_minutes_for(Channel::Whatsapp), 30);
    }
}
