//! keylayout - Key layout map loader and query engine
//!
//! Parses `.kl` key layout files that describe how an input device's raw
//! scan codes, HID usages, absolute axes, LEDs and motion sensor channels
//! map to abstract key codes, axes, LED identifiers and sensor readings.
//!
//! ```no_run
//! use keylayout::KeyLayoutLoader;
//!
//! let layout = KeyLayoutLoader::new().load("/system/usr/keylayout/Generic.kl")?;
//! if let Some(key) = layout.map_key(30, 0) {
//!     println!("scan code 30 -> key code {}", key.key_code);
//! }
//! # Ok::<(), keylayout::LayoutError>(())
//! ```

pub mod config;
pub mod layout;
pub mod report;
pub mod utils;

pub use config::Config;
pub use layout::{
    AxisInfo, AxisMode, InputDeviceSensorType, InputEventLabels, Key, KeyLayoutLoader,
    KeyLayoutMap, LabelResolver, LayoutError, Led, LookupError, ParseError, PolicyFlags,
    SensorMapping, SharedKeyLayoutMap,
};
pub use report::LayoutReport;
