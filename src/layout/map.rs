//! The loaded key layout and its read-only queries

use super::error::LookupError;
use super::labels::InputDeviceSensorType;
use bitflags::bitflags;
use log::debug;
use std::collections::{BTreeSet, HashMap};

const MAPPING_TARGET: &str = "keylayout::mapping";

bitflags! {
    /// Policy flags attached to a key mapping
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PolicyFlags: u32 {
        /// Key press wakes the device
        const WAKE = 0x0000_0001;
        /// Key is a virtual (soft) key
        const VIRTUAL = 0x0000_0002;
        /// Key is a function key
        const FUNCTION = 0x0000_0004;
        /// Key originates from a gesture
        const GESTURE = 0x0000_0008;
        /// Usage mapping is only a fallback and must not be reported back
        const FALLBACK_USAGE_MAPPING = 0x0000_0010;
    }
}

/// Result of mapping a scan code or usage code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Key {
    pub key_code: i32,
    pub flags: PolicyFlags,
}

/// How a raw axis is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
    /// Reported as `axis` unchanged
    Normal { axis: i32 },
    /// Reported as `axis` with its value inverted
    Invert { axis: i32 },
    /// Values below `split_value` go to `low_axis`, values above to `high_axis`
    Split {
        low_axis: i32,
        high_axis: i32,
        split_value: i32,
    },
}

/// Axis mapping for one scan code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisInfo {
    pub mode: AxisMode,
    pub flat_override: Option<i32>,
}

impl AxisInfo {
    pub fn new(mode: AxisMode) -> Self {
        Self {
            mode,
            flat_override: None,
        }
    }

    /// The primary axis (the low axis for a split)
    pub fn axis(&self) -> i32 {
        match self.mode {
            AxisMode::Normal { axis } | AxisMode::Invert { axis } => axis,
            AxisMode::Split { low_axis, .. } => low_axis,
        }
    }

    /// The high axis of a split, `None` otherwise
    pub fn high_axis(&self) -> Option<i32> {
        match self.mode {
            AxisMode::Split { high_axis, .. } => Some(high_axis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Led {
    pub led_code: i32,
}

/// Sensor channel fed by one absolute axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMapping {
    pub sensor_type: InputDeviceSensorType,
    /// 0, 1 or 2 for the X, Y and Z channel
    pub data_index: i32,
}

/// Immutable mapping tables produced by one successful load.
///
/// Populated once by the parser, then shared behind an `Arc`. Every query
/// is a pure read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLayoutMap {
    keys_by_scan_code: HashMap<i32, Key>,
    keys_by_usage_code: HashMap<i32, Key>,
    axes: HashMap<i32, AxisInfo>,
    leds_by_scan_code: HashMap<i32, Led>,
    leds_by_usage_code: HashMap<i32, Led>,
    sensors_by_abs_code: HashMap<i32, SensorMapping>,
    required_kernel_configs: BTreeSet<String>,
    load_file_name: Option<String>,
}

impl KeyLayoutMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Map a key event to a key code.
    ///
    /// A non-zero `usage_code` with a mapping wins over the scan code.
    /// Zero means "no code supplied" for either argument. Callers treat
    /// `None` as key code 0 (unknown) with no flags, i.e. `Key::default()`.
    pub fn map_key(&self, scan_code: i32, usage_code: i32) -> Option<Key> {
        let key = self.get_key(scan_code, usage_code);
        match key {
            Some(key) => debug!(
                target: MAPPING_TARGET,
                "mapKey: scanCode={}, usageCode=0x{:08x} ~ Result keyCode={}, outFlags=0x{:08x}.",
                scan_code,
                usage_code,
                key.key_code,
                key.flags.bits()
            ),
            None => debug!(
                target: MAPPING_TARGET,
                "mapKey: scanCode={}, usageCode=0x{:08x} ~ Failed.", scan_code, usage_code
            ),
        }
        key
    }

    fn get_key(&self, scan_code: i32, usage_code: i32) -> Option<Key> {
        if usage_code != 0 {
            if let Some(key) = self.keys_by_usage_code.get(&usage_code) {
                return Some(*key);
            }
        }
        if scan_code != 0 {
            if let Some(key) = self.keys_by_scan_code.get(&scan_code) {
                return Some(*key);
            }
        }
        None
    }

    pub fn map_axis(&self, scan_code: i32) -> Option<AxisInfo> {
        let info = self.axes.get(&scan_code).copied();
        match &info {
            Some(info) => debug!(
                target: MAPPING_TARGET,
                "mapAxis: scanCode={} ~ Result mode={:?}, flatOverride={:?}.",
                scan_code,
                info.mode,
                info.flat_override
            ),
            None => debug!(target: MAPPING_TARGET, "mapAxis: scanCode={} ~ Failed.", scan_code),
        }
        info
    }

    pub fn map_sensor(&self, abs_code: i32) -> Result<SensorMapping, LookupError> {
        match self.sensors_by_abs_code.get(&abs_code) {
            Some(sensor) => {
                debug!(
                    target: MAPPING_TARGET,
                    "mapSensor: absCode={}, sensorType={}, sensorDataIndex=0x{:x}.",
                    abs_code,
                    sensor.sensor_type,
                    sensor.data_index
                );
                Ok(*sensor)
            }
            None => {
                debug!(target: MAPPING_TARGET, "mapSensor: absCode={}, ~ Failed.", abs_code);
                Err(LookupError::AbsCodeNotFound(abs_code))
            }
        }
    }

    /// Scan codes mapped to `key_code`, excluding function-key mappings
    pub fn find_scan_codes_for_key(&self, key_code: i32) -> Vec<i32> {
        self.keys_by_scan_code
            .iter()
            .filter(|(_, key)| {
                key.key_code == key_code && !key.flags.contains(PolicyFlags::FUNCTION)
            })
            .map(|(&scan_code, _)| scan_code)
            .collect()
    }

    /// Usage codes mapped to `key_code`, excluding fallback mappings
    pub fn find_usage_codes_for_key(&self, key_code: i32) -> Vec<i32> {
        self.keys_by_usage_code
            .iter()
            .filter(|(_, key)| {
                key.key_code == key_code
                    && !key.flags.contains(PolicyFlags::FALLBACK_USAGE_MAPPING)
            })
            .map(|(&usage_code, _)| usage_code)
            .collect()
    }

    pub fn find_scan_code_for_led(&self, led_code: i32) -> Option<i32> {
        let found = find_led(&self.leds_by_scan_code, led_code);
        match found {
            Some(scan_code) => debug!(
                target: MAPPING_TARGET,
                "findScanCodeForLed: ledCode={}, scanCode={}.", led_code, scan_code
            ),
            None => debug!(
                target: MAPPING_TARGET,
                "findScanCodeForLed: ledCode={} ~ Not found.", led_code
            ),
        }
        found
    }

    pub fn find_usage_code_for_led(&self, led_code: i32) -> Option<i32> {
        let found = find_led(&self.leds_by_usage_code, led_code);
        match found {
            Some(usage_code) => debug!(
                target: MAPPING_TARGET,
                "findUsageCodeForLed: ledCode={}, usage={:x}.", led_code, usage_code
            ),
            None => debug!(
                target: MAPPING_TARGET,
                "findUsageCodeForLed: ledCode={} ~ Not found.", led_code
            ),
        }
        found
    }

    /// File this layout was loaded from, set once the load fully succeeds
    pub fn load_file_name(&self) -> Option<&str> {
        self.load_file_name.as_deref()
    }

    pub fn required_kernel_configs(&self) -> &BTreeSet<String> {
        &self.required_kernel_configs
    }

    pub fn keys_by_scan_code(&self) -> impl Iterator<Item = (i32, Key)> + '_ {
        self.keys_by_scan_code.iter().map(|(&code, &key)| (code, key))
    }

    pub fn keys_by_usage_code(&self) -> impl Iterator<Item = (i32, Key)> + '_ {
        self.keys_by_usage_code.iter().map(|(&code, &key)| (code, key))
    }

    pub fn axes(&self) -> impl Iterator<Item = (i32, AxisInfo)> + '_ {
        self.axes.iter().map(|(&code, &info)| (code, info))
    }

    pub fn leds_by_scan_code(&self) -> impl Iterator<Item = (i32, Led)> + '_ {
        self.leds_by_scan_code.iter().map(|(&code, &led)| (code, led))
    }

    pub fn leds_by_usage_code(&self) -> impl Iterator<Item = (i32, Led)> + '_ {
        self.leds_by_usage_code.iter().map(|(&code, &led)| (code, led))
    }

    pub fn sensors(&self) -> impl Iterator<Item = (i32, SensorMapping)> + '_ {
        self.sensors_by_abs_code
            .iter()
            .map(|(&code, &sensor)| (code, sensor))
    }

    /// True if the file produced no mappings and no requirements
    pub fn is_empty(&self) -> bool {
        self.keys_by_scan_code.is_empty()
            && self.keys_by_usage_code.is_empty()
            && self.axes.is_empty()
            && self.leds_by_scan_code.is_empty()
            && self.leds_by_usage_code.is_empty()
            && self.sensors_by_abs_code.is_empty()
            && self.required_kernel_configs.is_empty()
    }

    // --- population, used only while parsing ---

    pub(crate) fn key_table_mut(&mut self, usage: bool) -> &mut HashMap<i32, Key> {
        if usage {
            &mut self.keys_by_usage_code
        } else {
            &mut self.keys_by_scan_code
        }
    }

    pub(crate) fn led_table_mut(&mut self, usage: bool) -> &mut HashMap<i32, Led> {
        if usage {
            &mut self.leds_by_usage_code
        } else {
            &mut self.leds_by_scan_code
        }
    }

    pub(crate) fn axes_mut(&mut self) -> &mut HashMap<i32, AxisInfo> {
        &mut self.axes
    }

    pub(crate) fn sensors_mut(&mut self) -> &mut HashMap<i32, SensorMapping> {
        &mut self.sensors_by_abs_code
    }

    pub(crate) fn required_kernel_configs_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.required_kernel_configs
    }

    pub(crate) fn set_load_file_name(&mut self, filename: impl Into<String>) {
        self.load_file_name = Some(filename.into());
    }
}

fn find_led(leds: &HashMap<i32, Led>, led_code: i32) -> Option<i32> {
    leds.iter()
        .find(|(_, led)| led.led_code == led_code)
        .map(|(&code, _)| code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key_code: i32, flags: PolicyFlags) -> Key {
        Key { key_code, flags }
    }

    fn sample_map() -> KeyLayoutMap {
        let mut map = KeyLayoutMap::new();
        map.key_table_mut(false).insert(30, key(29, PolicyFlags::empty()));
        map.key_table_mut(false).insert(31, key(30, PolicyFlags::empty()));
        map.key_table_mut(false).insert(59, key(131, PolicyFlags::FUNCTION));
        map.key_table_mut(false).insert(60, key(131, PolicyFlags::empty()));
        map.key_table_mut(true).insert(0x0007_0004, key(29, PolicyFlags::WAKE));
        map.key_table_mut(true)
            .insert(0x0007_0005, key(29, PolicyFlags::FALLBACK_USAGE_MAPPING));
        map.led_table_mut(false).insert(0x01, Led { led_code: 1 });
        map.led_table_mut(true).insert(0x0008_0002, Led { led_code: 1 });
        map
    }

    #[test]
    fn map_key_prefers_usage_code() {
        let map = sample_map();
        assert_eq!(
            map.map_key(30, 0x0007_0004),
            Some(key(29, PolicyFlags::WAKE))
        );
        assert_eq!(map.map_key(31, 0x0007_0004), Some(key(29, PolicyFlags::WAKE)));
    }

    #[test]
    fn map_key_falls_back_to_scan_code() {
        let map = sample_map();
        assert_eq!(map.map_key(31, 0x0007_00ff), Some(key(30, PolicyFlags::empty())));
        assert_eq!(map.map_key(31, 0), Some(key(30, PolicyFlags::empty())));
    }

    #[test]
    fn map_key_zero_means_absent() {
        let mut map = sample_map();
        map.key_table_mut(false).insert(0, key(5, PolicyFlags::empty()));
        assert_eq!(map.map_key(0, 0), None);
        assert_eq!(map.map_key(99, 0), None);
        assert_eq!(map.map_key(99, 0).unwrap_or_default(), Key::default());
    }

    #[test]
    fn reverse_lookup_skips_function_keys() {
        let map = sample_map();
        assert_eq!(map.find_scan_codes_for_key(131), vec![60]);
        assert_eq!(map.find_scan_codes_for_key(29), vec![30]);
        assert!(map.find_scan_codes_for_key(1000).is_empty());
    }

    #[test]
    fn reverse_lookup_skips_fallback_usages() {
        let map = sample_map();
        assert_eq!(map.find_usage_codes_for_key(29), vec![0x0007_0004]);
    }

    #[test]
    fn reverse_lookup_order_is_stable() {
        let mut map = KeyLayoutMap::new();
        for scan_code in 1..=64 {
            map.key_table_mut(false).insert(scan_code, key(7, PolicyFlags::empty()));
        }
        let first = map.find_scan_codes_for_key(7);
        assert_eq!(first.len(), 64);
        assert_eq!(map.find_scan_codes_for_key(7), first);
    }

    #[test]
    fn led_lookups() {
        let map = sample_map();
        assert_eq!(map.find_scan_code_for_led(1), Some(0x01));
        assert_eq!(map.find_usage_code_for_led(1), Some(0x0008_0002));
        assert_eq!(map.find_scan_code_for_led(2), None);
        assert_eq!(map.find_usage_code_for_led(2), None);
    }

    #[test]
    fn map_axis_and_sensor() {
        let mut map = KeyLayoutMap::new();
        let mut info = AxisInfo::new(AxisMode::Split {
            low_axis: 0,
            high_axis: 1,
            split_value: 75,
        });
        info.flat_override = Some(4096);
        map.axes_mut().insert(0x11, info);
        map.sensors_mut().insert(
            0x03,
            SensorMapping {
                sensor_type: InputDeviceSensorType::GYROSCOPE,
                data_index: 0,
            },
        );

        let axis = map.map_axis(0x11).unwrap();
        assert_eq!(axis.axis(), 0);
        assert_eq!(axis.high_axis(), Some(1));
        assert_eq!(axis.flat_override, Some(4096));
        assert_eq!(map.map_axis(0x12), None);

        let sensor = map.map_sensor(0x03).unwrap();
        assert_eq!(sensor.sensor_type, InputDeviceSensorType::GYROSCOPE);
        assert_eq!(map.map_sensor(0x04), Err(LookupError::AbsCodeNotFound(4)));
    }

    #[test]
    fn axis_accessors_for_plain_and_inverted() {
        let normal = AxisInfo::new(AxisMode::Normal { axis: 11 });
        let inverted = AxisInfo::new(AxisMode::Invert { axis: 14 });
        assert_eq!(normal.axis(), 11);
        assert_eq!(normal.high_axis(), None);
        assert_eq!(inverted.axis(), 14);
        assert_eq!(inverted.high_axis(), None);
    }

    #[test]
    fn new_map_is_empty() {
        let map = KeyLayoutMap::new();
        assert!(map.is_empty());
        assert_eq!(map.load_file_name(), None);
        assert!(!sample_map().is_empty());
    }
}
