use serde::{Deserialize, Serialize, Serializer};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
  pub role: Role,
  pub content: String,
}

impl Message {
  pub fn new(role: Role, content: impl Into<String>) -> Self {
    Self {
      role,
      content: content.into(),
    }
  }
}

/// Inbound chat body after validation.
#[derive(Deserialize, Clone, Debug)]
pub struct ChatRequest {
  pub messages: Vec<Message>,
  pub model: Option<String>,
}

/// Body sent upstream on every attempt.
#[derive(Serialize, Debug)]
pub struct UpstreamChatRequest<'a> {
  pub messages: &'a [Message],
  pub model: &'a str,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
  pub reply: String,
  pub used_model: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Warning,
  Critical,
}

impl Severity {
  pub fn is_abnormal(self) -> bool {
    self != Severity::Info
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Severity::Info => "info",
      Severity::Warning => "warning",
      Severity::Critical => "critical",
    }
  }
}

/// A validated reading, ready to be classified and stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
  pub user_id: String,
  pub bpm: f64,
  pub location: Option<String>,
}

/// Stored form of a reading. Entries of the reading log and the alert queue
/// share this shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Alert {
  pub id: u64,
  pub user: String,
  #[serde(serialize_with = "serialize_bpm")]
  pub bpm: f64,
  pub location: String,
  pub time: i64,
  pub severity: Severity,
  pub resolved: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IngestReceipt {
  pub received: bool,
  pub alert: bool,
  pub severity: Severity,
  pub log: Alert,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReceipt {
  pub ok: bool,
  pub resolved_id: Option<u64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
  pub hour: String,
  pub avg_bpm: i64,
  pub alerts: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
  pub total_users: u64,
  pub active_alerts: usize,
  pub hospitals_connected: u32,
  pub emergencies_this_month: u32,
  pub uptime: String,
  pub avg_response_time: String,
  pub last_updated: String,
  pub recent_alerts: Vec<Alert>,
  pub active_alerts_list: Vec<Alert>,
  /// Simulated filler. Not derived from stored readings.
  pub chart_data: Vec<ChartPoint>,
}

#[derive(Default, Debug, PartialEq)]
pub struct StatsQuery {
  pub action: Option<String>,
  pub id: Option<String>,
}

impl StatsQuery {
  /// Repeated keys are joined with commas, so `id=1&id=2` reads as `"1,2"`
  /// and a repeated `action` never equals a single action name.
  pub fn from_pairs(pairs: &[(String, String)]) -> Self {
    let joined = |key: &str| {
      let values: Vec<&str> = pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .collect();
      (!values.is_empty()).then(|| values.join(","))
    };
    Self {
      action: joined("action"),
      id: joined("id"),
    }
  }
}

/// Integral readings go out as JSON integers (`75`, not `75.0`).
fn serialize_bpm<S: Serializer>(bpm: &f64, serializer: S) -> Result<S::Ok, S::Error> {
  const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
  if bpm.fract() == 0.0 && bpm.abs() < MAX_EXACT {
    serializer.serialize_i64(*bpm as i64)
  } else {
    serializer.serialize_f64(*bpm)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  fn alert(bpm: f64) -> Alert {
    Alert {
      id: 1,
      user: "u1".to_string(),
      bpm,
      location: "Unknown".to_string(),
      time: 0,
      severity: Severity::Info,
      resolved: false,
    }
  }

  #[test]
  fn stats_query_joins_repeated_keys() {
    let query = StatsQuery::from_pairs(&pairs(&[("action", "resolve"), ("id", "1"), ("id", "2")]));
    assert_eq!(query.action.as_deref(), Some("resolve"));
    assert_eq!(query.id.as_deref(), Some("1,2"));

    let query = StatsQuery::from_pairs(&pairs(&[("action", "a"), ("action", "b")]));
    assert_eq!(query.action.as_deref(), Some("a,b"));
    assert_eq!(query.id, None);

    assert_eq!(StatsQuery::from_pairs(&[]), StatsQuery::default());
  }

  #[test]
  fn integral_bpm_serializes_without_fraction() {
    let json = serde_json::to_value(alert(75.0)).unwrap();
    assert_eq!(json["bpm"].to_string(), "75");

    let json = serde_json::to_value(alert(61.5)).unwrap();
    assert_eq!(json["bpm"].to_string(), "61.5");
  }

  #[test]
  fn integral_bpm_reads_back() {
    let back: Alert = serde_json::from_str(&serde_json::to_string(&alert(142.0)).unwrap()).unwrap();
    assert_eq!(back.bpm, 142.0);
  }
}
