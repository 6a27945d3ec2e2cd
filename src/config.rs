use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::Capacity;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are HealthCone AI Assistant, a smart, caring health monitoring assistant created by INEZA AIME BRUNO.
HealthCone is an AI-based health monitoring system that:
- Monitors real-time heart rate using wearable smartwatches
- Detects abnormal cardiac activity and sends automatic emergency alerts
- Shares user GPS location with nearby hospitals for fast ambulance response
- Combines traditional wellness wisdom with modern medical science
- Provides tailored health solutions for each user's unique wellness journey
- Focuses on early detection of heart problems and continuous health monitoring

You help users understand their health data, answer wellness questions,
explain HealthCone features, guide emergency procedures, and provide compassionate health advice.
Always make clear that you assist but never replace professional medical doctors.
Respond in a warm, professional, and reassuring tone. Be concise but thorough.";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
  pub listen_addr: String,
  pub upstream_url: String,
  pub candidate_models: Vec<String>,
  pub request_timeout_secs: u64,
  pub system_prompt: String,
  pub reading_log_capacity: usize,
  pub alert_queue_capacity: usize,
  pub recent_alerts_limit: usize,
  pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    let capacity = Capacity::default();
    Self {
      listen_addr: "127.0.0.1:3000".to_string(),
      upstream_url: "https://health-cone-backend.vercel.app/api/chat".to_string(),
      candidate_models: vec![
        "groq-1".to_string(),
        "groq-2".to_string(),
        "groq-3".to_string(),
        "groq-4".to_string(),
      ],
      request_timeout_secs: 20,
      system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
      reading_log_capacity: capacity.reading_log,
      alert_queue_capacity: capacity.alert_queue,
      recent_alerts_limit: capacity.recent_alerts,
      log_file: None,
    }
  }
}

impl AppConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs.max(1))
  }

  pub fn capacity(&self) -> Capacity {
    Capacity {
      reading_log: self.reading_log_capacity,
      alert_queue: self.alert_queue_capacity,
      recent_alerts: self.recent_alerts_limit,
    }
  }
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  if path.exists() {
    let data = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&data)?;
    Ok(config)
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    Ok(config)
  }
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}
