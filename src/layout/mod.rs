//! Key layout loading, parsing and lookup

mod error;
pub mod kernel_config;
pub mod labels;
mod loader;
mod map;
pub mod parser;
pub mod tokenizer;

#[cfg(test)]
mod test_helpers;

pub use error::{LayoutError, LookupError, ParseError, ParseErrorKind};
pub use kernel_config::{
    HostKernelConfig, KernelConfigError, KernelConfigProvider, KernelConfigSnapshot,
    StaticKernelConfig,
};
pub use labels::{InputDeviceSensorType, InputEventLabels, LabelResolver};
pub use loader::{load, load_contents, KeyLayoutLoader, SharedKeyLayoutMap};
pub use map::{AxisInfo, AxisMode, Key, KeyLayoutMap, Led, PolicyFlags, SensorMapping};
pub use tokenizer::{Location, Tokenizer};
