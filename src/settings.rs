use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: String,
    pub user: String,
    pub staff_id: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.dify.ai/v1/chat-messages".into(),
            user: "flabba-pet".into(),
            staff_id: "EMP001".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub refresh_minutes: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            location_name: "Hsinchu".into(),
            latitude: 24.8138,
            longitude: 120.9675,
            timezone: "Asia/Taipei".into(),
            refresh_minutes: 30,
        }
    }
}

impl WeatherSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.max(1) * 60)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub lunch_enabled: bool,
    pub lunch_time: String,
    pub checkout_enabled: bool,
    pub checkout_time: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            lunch_enabled: true,
            lunch_time: "12:00:00".into(),
            checkout_enabled: true,
            checkout_time: "18:00:00".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusSettings {
    pub enabled: bool,
    pub poll_interval_ms: u64,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 500,
        }
    }
}

impl FocusSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetSettings {
    pub chat: ChatSettings,
    pub weather: WeatherSettings,
    pub reminders: ReminderSettings,
    pub focus: FocusSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PetSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                PetSettings::default()
            })
        } else {
            PetSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> PetSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: PetSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &PetSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
