//! Layout report and export functionality

use crate::layout::{AxisMode, InputEventLabels, KeyLayoutMap, PolicyFlags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete description of one loaded layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Entry counts
    pub summary: LayoutSummary,
    /// Every mapping, sorted by code
    pub entries: LayoutEntries,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// File the layout was loaded from
    pub source_file: Option<String>,
}

/// Number of entries per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub scan_code_keys: usize,
    pub usage_code_keys: usize,
    pub axes: usize,
    pub scan_code_leds: usize,
    pub usage_code_leds: usize,
    pub sensors: usize,
    pub required_kernel_configs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEntries {
    pub keys: Vec<KeyEntry>,
    pub axes: Vec<AxisEntry>,
    pub leds: Vec<LedEntry>,
    pub sensors: Vec<SensorEntry>,
    pub required_kernel_configs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub code: i32,
    /// Keyed by HID usage rather than scan code
    pub usage: bool,
    pub key_code: i32,
    pub label: Option<String>,
    pub flags: Vec<String>,
    pub flag_bits: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisEntry {
    pub scan_code: i32,
    /// `normal`, `invert` or `split`
    pub mode: String,
    pub axis: i32,
    pub axis_label: Option<String>,
    pub high_axis: Option<i32>,
    pub high_axis_label: Option<String>,
    pub split_value: Option<i32>,
    pub flat_override: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedEntry {
    pub code: i32,
    pub usage: bool,
    pub led_code: i32,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub abs_code: i32,
    pub sensor_type: String,
    pub data_index: i32,
}

impl LayoutReport {
    /// Build a report, naming codes with `labels` where possible
    pub fn new(map: &KeyLayoutMap, labels: &InputEventLabels) -> Self {
        let now: DateTime<Utc> = Utc::now();

        let key_entry = |usage: bool| {
            move |(code, key): (i32, crate::layout::Key)| KeyEntry {
                code,
                usage,
                key_code: key.key_code,
                label: labels.key_code_label(key.key_code).map(str::to_string),
                flags: labels
                    .key_flag_labels(key.flags.bits())
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                flag_bits: key.flags.bits(),
            }
        };
        let mut keys: Vec<KeyEntry> = map
            .keys_by_scan_code()
            .map(key_entry(false))
            .chain(map.keys_by_usage_code().map(key_entry(true)))
            .collect();
        keys.sort_by_key(|k| (k.usage, k.code));

        let mut axes: Vec<AxisEntry> = map
            .axes()
            .map(|(scan_code, info)| {
                let (mode, split_value) = match info.mode {
                    AxisMode::Normal { .. } => ("normal", None),
                    AxisMode::Invert { .. } => ("invert", None),
                    AxisMode::Split { split_value, .. } => ("split", Some(split_value)),
                };
                AxisEntry {
                    scan_code,
                    mode: mode.to_string(),
                    axis: info.axis(),
                    axis_label: labels.axis_label(info.axis()).map(str::to_string),
                    high_axis: info.high_axis(),
                    high_axis_label: info
                        .high_axis()
                        .and_then(|axis| labels.axis_label(axis))
                        .map(str::to_string),
                    split_value,
                    flat_override: info.flat_override,
                }
            })
            .collect();
        axes.sort_by_key(|a| a.scan_code);

        let led_entry = |usage: bool| {
            move |(code, led): (i32, crate::layout::Led)| LedEntry {
                code,
                usage,
                led_code: led.led_code,
                label: labels.led_label(led.led_code).map(str::to_string),
            }
        };
        let mut leds: Vec<LedEntry> = map
            .leds_by_scan_code()
            .map(led_entry(false))
            .chain(map.leds_by_usage_code().map(led_entry(true)))
            .collect();
        leds.sort_by_key(|l| (l.usage, l.code));

        let mut sensors: Vec<SensorEntry> = map
            .sensors()
            .map(|(abs_code, sensor)| SensorEntry {
                abs_code,
                sensor_type: sensor.sensor_type.name().to_string(),
                data_index: sensor.data_index,
            })
            .collect();
        sensors.sort_by_key(|s| s.abs_code);

        let summary = LayoutSummary {
            scan_code_keys: keys.iter().filter(|k| !k.usage).count(),
            usage_code_keys: keys.iter().filter(|k| k.usage).count(),
            axes: axes.len(),
            scan_code_leds: leds.iter().filter(|l| !l.usage).count(),
            usage_code_leds: leds.iter().filter(|l| l.usage).count(),
            sensors: sensors.len(),
            required_kernel_configs: map.required_kernel_configs().len(),
        };

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                source_file: map.load_file_name().map(str::to_string),
            },
            summary,
            entries: LayoutEntries {
                keys,
                axes,
                leds,
                sensors,
                required_kernel_configs: map.required_kernel_configs().iter().cloned().collect(),
            },
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn label_or_code(label: &Option<String>, code: i32) -> String {
    label.clone().unwrap_or_else(|| code.to_string())
}

fn usage_prefix(usage: bool) -> &'static str {
    if usage {
        "usage "
    } else {
        ""
    }
}

/// Renders the layout back in key layout file syntax
impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.metadata.source_file {
            writeln!(f, "# {}", source)?;
        }
        for config in &self.entries.required_kernel_configs {
            writeln!(f, "requires_kernel_config {}", config)?;
        }
        for key in &self.entries.keys {
            write!(
                f,
                "key {}0x{:x} {}",
                usage_prefix(key.usage),
                key.code,
                label_or_code(&key.label, key.key_code)
            )?;
            for flag in &key.flags {
                write!(f, " {}", flag)?;
            }
            let unnamed = PolicyFlags::from_bits_retain(key.flag_bits) - PolicyFlags::all();
            if !unnamed.is_empty() {
                write!(f, " # unnamed flags 0x{:08x}", unnamed.bits())?;
            }
            writeln!(f)?;
        }
        for axis in &self.entries.axes {
            write!(f, "axis 0x{:02x} ", axis.scan_code)?;
            match (axis.mode.as_str(), axis.split_value, axis.high_axis) {
                ("split", Some(split_value), Some(high_axis)) => write!(
                    f,
                    "split {} {} {}",
                    split_value,
                    label_or_code(&axis.axis_label, axis.axis),
                    label_or_code(&axis.high_axis_label, high_axis)
                )?,
                ("invert", _, _) => {
                    write!(f, "invert {}", label_or_code(&axis.axis_label, axis.axis))?
                }
                _ => write!(f, "{}", label_or_code(&axis.axis_label, axis.axis))?,
            }
            if let Some(flat) = axis.flat_override {
                write!(f, " flat {}", flat)?;
            }
            writeln!(f)?;
        }
        for led in &self.entries.leds {
            writeln!(
                f,
                "led {}0x{:x} {}",
                usage_prefix(led.usage),
                led.code,
                label_or_code(&led.label, led.led_code)
            )?;
        }
        for sensor in &self.entries.sensors {
            let channel = match sensor.data_index {
                0 => "X",
                1 => "Y",
                _ => "Z",
            };
            writeln!(
                f,
                "sensor 0x{:02x} {} {}",
                sensor.abs_code, sensor.sensor_type, channel
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::KeyLayoutLoader;

    const SAMPLE: &str = "\
requires_kernel_config CONFIG_HID_PLAYSTATION
key 0x130 BUTTON_A
key 0x131 BUTTON_B WAKE
key usage 0x000c0223 HOME FALLBACK_USAGE_MAPPING
axis 0x00 X flat 16
axis 0x02 invert Z
axis 0x11 split 75 X Y flat 4096
led 0x01 CAPS_LOCK
led usage 0x00080002 CAPS_LOCK
sensor 0x03 GYROSCOPE X
";

    fn sample_report() -> LayoutReport {
        let map = KeyLayoutLoader::new()
            .without_kernel_config_gate()
            .load_contents("Vendor_054c_Product_0ce6.kl", SAMPLE)
            .unwrap();
        LayoutReport::new(&map, &InputEventLabels::new())
    }

    #[test]
    fn summary_counts_every_table() {
        let report = sample_report();
        assert_eq!(
            report.summary,
            LayoutSummary {
                scan_code_keys: 2,
                usage_code_keys: 1,
                axes: 3,
                scan_code_leds: 1,
                usage_code_leds: 1,
                sensors: 1,
                required_kernel_configs: 1,
            }
        );
        assert_eq!(
            report.metadata.source_file.as_deref(),
            Some("Vendor_054c_Product_0ce6.kl")
        );
    }

    #[test]
    fn entries_are_sorted_and_labelled() {
        let report = sample_report();
        let codes: Vec<i32> = report.entries.keys.iter().map(|k| k.code).collect();
        assert_eq!(codes, vec![0x130, 0x131, 0x000c_0223]);
        assert_eq!(report.entries.keys[1].label.as_deref(), Some("BUTTON_B"));
        assert_eq!(report.entries.keys[1].flags, vec!["WAKE".to_string()]);
        assert_eq!(report.entries.axes[2].mode, "split");
        assert_eq!(report.entries.axes[2].high_axis_label.as_deref(), Some("Y"));
        assert_eq!(report.entries.sensors[0].sensor_type, "GYROSCOPE");
    }

    #[test]
    fn display_renders_reloadable_layout() {
        let report = sample_report();
        let text = report.to_string();
        assert!(text.contains("key 0x131 BUTTON_B WAKE"));
        assert!(text.contains("axis 0x11 split 75 X Y flat 4096"));
        assert!(text.contains("led usage 0x80002 CAPS_LOCK"));

        let reloaded = KeyLayoutLoader::new()
            .without_kernel_config_gate()
            .load_contents("Vendor_054c_Product_0ce6.kl", &text)
            .unwrap();
        let expected = KeyLayoutLoader::new()
            .without_kernel_config_gate()
            .load_contents("Vendor_054c_Product_0ce6.kl", SAMPLE)
            .unwrap();
        assert_eq!(reloaded, expected);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = sample_report();
        let json = report.to_json().expect("Failed to serialize");
        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"GYROSCOPE\""));

        let parsed: LayoutReport = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(parsed.summary, report.summary);
    }
}
