use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One resource-usage record pushed by the host's stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    pub container_id: String,
    pub cpu_percent: f64,
    #[serde(rename = "memory_usage")]
    pub memory_used_bytes: u64,
    #[serde(rename = "memory_limit")]
    pub memory_limit_bytes: u64,
    pub memory_percent: f64,
    #[serde(rename = "network_rx")]
    pub network_rx_bytes: u64,
    #[serde(rename = "network_tx")]
    pub network_tx_bytes: u64,
}

impl TelemetrySample {
    /// Check the numeric ranges a well-formed record must satisfy
    ///
    /// Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if !self.cpu_percent.is_finite() || self.cpu_percent < 0.0 {
            return Err(format!("cpu_percent out of range: {}", self.cpu_percent));
        }
        if !self.memory_percent.is_finite() || !(0.0..=100.0).contains(&self.memory_percent) {
            return Err(format!(
                "memory_percent out of range: {}",
                self.memory_percent
            ));
        }
        Ok(())
    }
}

/// A charted point derived from one sample
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPoint {
    pub timestamp: DateTime<Local>,
    pub cpu: f64,
    pub memory: f64,
}

impl TelemetryPoint {
    /// Build a point stamped with the current local time
    pub fn now(sample: &TelemetrySample) -> Self {
        Self::at(Local::now(), sample)
    }

    pub fn at(timestamp: DateTime<Local>, sample: &TelemetrySample) -> Self {
        Self {
            timestamp,
            cpu: sample.cpu_percent,
            memory: sample.memory_percent,
        }
    }

    /// Wall-clock label used on chart axes (HH:MM:SS)
    pub fn label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(cpu: f64, memory: f64) -> TelemetrySample {
        TelemetrySample {
            container_id: "abc123".into(),
            cpu_percent: cpu,
            memory_used_bytes: 512 * 1024 * 1024,
            memory_limit_bytes: 2 * 1024 * 1024 * 1024,
            memory_percent: memory,
            network_rx_bytes: 1000,
            network_tx_bytes: 2000,
        }
    }

    #[test]
    fn test_validate_accepts_multicore_cpu() {
        assert!(sample(250.0, 25.0).validate().is_ok());
        assert!(sample(0.0, 0.0).validate().is_ok());
        assert!(sample(1.0, 100.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_cpu() {
        let err = sample(-1.0, 10.0).validate().unwrap_err();
        assert!(err.contains("cpu_percent"));
    }

    #[test]
    fn test_validate_rejects_memory_out_of_range() {
        assert!(sample(1.0, 100.5).validate().is_err());
        assert!(sample(1.0, -0.1).validate().is_err());
        assert!(sample(1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample(1.5, 2.5)).unwrap();
        assert_eq!(json["memory_usage"], 512 * 1024 * 1024);
        assert_eq!(json["memory_limit"], 2u64 * 1024 * 1024 * 1024);
        assert_eq!(json["network_rx"], 1000);
        assert_eq!(json["network_tx"], 2000);
        assert_eq!(json["cpu_percent"], 1.5);
    }

    #[test]
    fn test_point_from_sample() {
        let ts = Local.with_ymd_and_hms(2026, 3, 1, 14, 5, 9).unwrap();
        let point = TelemetryPoint::at(ts, &sample(12.5, 40.0));
        assert_eq!(point.cpu, 12.5);
        assert_eq!(point.memory, 40.0);
        assert_eq!(point.label(), "14:05:09");
    }
}
