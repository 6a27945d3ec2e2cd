use std::collections::VecDeque;

use chrono::Utc;
use rand::Rng;
use serde_json::Value;

use crate::error::AlertError;
use crate::models::{Alert, ChartPoint, DashboardSnapshot, IngestReceipt, Reading, Severity};

pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Clone, Copy, Debug)]
pub struct Capacity {
  pub reading_log: usize,
  pub alert_queue: usize,
  pub recent_alerts: usize,
}

impl Default for Capacity {
  fn default() -> Self {
    Self {
      reading_log: 500,
      alert_queue: 100,
      recent_alerts: 10,
    }
  }
}

pub fn classify(bpm: f64) -> Severity {
  if bpm < 40.0 || bpm > 150.0 {
    Severity::Critical
  } else if bpm < 60.0 || bpm > 120.0 {
    Severity::Warning
  } else {
    Severity::Info
  }
}

impl Reading {
  /// Validates an ingestion body. Missing or unparsable bodies arrive here as `{}`.
  pub fn from_json(body: &Value) -> Result<Self, AlertError> {
    let user_id = match &body["userId"] {
      Value::String(s) if !s.is_empty() => s.clone(),
      Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
      _ => return Err(AlertError::MissingField),
    };

    let bpm = match &body["bpm"] {
      Value::Null => return Err(AlertError::MissingField),
      Value::String(s) if s.is_empty() => return Err(AlertError::MissingField),
      Value::Number(n) => n.as_f64().ok_or(AlertError::NotANumber)?,
      Value::String(s) => parse_bpm(s)?,
      _ => return Err(AlertError::NotANumber),
    };

    let location = body["location"]
      .as_str()
      .filter(|s| !s.is_empty())
      .map(str::to_string);

    Ok(Self {
      user_id,
      bpm,
      location,
    })
  }
}

fn parse_bpm(raw: &str) -> Result<f64, AlertError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(AlertError::NotANumber);
  }
  trimmed
    .parse::<f64>()
    .ok()
    .filter(|v| v.is_finite())
    .ok_or(AlertError::NotANumber)
}

/// Process-lifetime store of readings and the abnormal-only alert queue.
///
/// The reading log grows at the tail; the alert queue is most-recent-first.
/// Ids are never reused, even after an entry is trimmed away.
pub struct AlertStore {
  alerts: VecDeque<Alert>,
  readings: VecDeque<Alert>,
  next_id: u64,
  capacity: Capacity,
}

impl AlertStore {
  pub fn new(capacity: Capacity) -> Self {
    Self {
      alerts: VecDeque::new(),
      readings: VecDeque::new(),
      next_id: 1,
      capacity,
    }
  }

  /// Store preloaded with the sample alerts the dashboard starts with.
  pub fn seeded(capacity: Capacity) -> Self {
    let now = Utc::now().timestamp_millis();
    let seed = [
      ("User #482", 142.0, "Kigali, RW", 120_000, Severity::Critical, false),
      ("User #219", 38.0, "Huye, RW", 660_000, Severity::Warning, false),
      ("User #731", 155.0, "Musanze, RW", 1_380_000, Severity::Critical, true),
      ("User #102", 95.0, "Rubavu, RW", 3_600_000, Severity::Info, true),
    ];

    let mut store = Self::new(capacity);
    for (user, bpm, location, ago_ms, severity, resolved) in seed {
      let id = store.issue_id();
      store.alerts.push_back(Alert {
        id,
        user: user.to_string(),
        bpm,
        location: location.to_string(),
        time: now - ago_ms,
        severity,
        resolved,
      });
    }
    store
  }

  fn issue_id(&mut self) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  pub fn ingest(&mut self, reading: Reading) -> IngestReceipt {
    let severity = classify(reading.bpm);
    let record = Alert {
      id: self.issue_id(),
      user: reading.user_id,
      bpm: reading.bpm,
      location: reading.location.unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
      time: Utc::now().timestamp_millis(),
      severity,
      resolved: false,
    };

    if severity.is_abnormal() {
      tracing::info!(
        id = record.id,
        user = %record.user,
        bpm = record.bpm,
        severity = severity.as_str(),
        "abnormal reading queued as alert"
      );
      self.alerts.push_front(record.clone());
    }
    self.readings.push_back(record.clone());

    while self.readings.len() > self.capacity.reading_log {
      self.readings.pop_front();
    }
    self.alerts.truncate(self.capacity.alert_queue);

    IngestReceipt {
      received: true,
      alert: severity.is_abnormal(),
      severity,
      log: record,
    }
  }

  /// Marks the alert resolved. Unknown ids are ignored.
  pub fn resolve(&mut self, id: u64) -> bool {
    match self.alerts.iter_mut().find(|a| a.id == id) {
      Some(alert) => {
        alert.resolved = true;
        true
      }
      None => false,
    }
  }

  #[cfg(test)]
  pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
    self.alerts.iter()
  }

  #[cfg(test)]
  pub fn readings(&self) -> impl Iterator<Item = &Alert> {
    self.readings.iter()
  }

  pub fn summary(&self) -> DashboardSnapshot {
    let active: Vec<Alert> = self.alerts.iter().filter(|a| !a.resolved).cloned().collect();

    DashboardSnapshot {
      total_users: 1284,
      active_alerts: active.len(),
      hospitals_connected: 12,
      emergencies_this_month: 7,
      uptime: "99.98%".to_string(),
      avg_response_time: "4.2 min".to_string(),
      last_updated: Utc::now().to_rfc3339(),
      recent_alerts: self.alerts.iter().take(self.capacity.recent_alerts).cloned().collect(),
      active_alerts_list: active,
      chart_data: simulated_chart(&mut rand::thread_rng()),
    }
  }
}

/// 24 hourly points of a synthetic waveform with jitter.
pub fn simulated_chart<R: Rng>(rng: &mut R) -> Vec<ChartPoint> {
  (0..24)
    .map(|hour| {
      let wave = 65.0 + (hour as f64 * 0.42).sin() * 11.0;
      ChartPoint {
        hour: format!("{hour:02}:00"),
        avg_bpm: (wave + rng.gen_range(0.0..7.0)).floor() as i64,
        alerts: rng.gen_range(0..3),
      }
    })
    .collect()
}
