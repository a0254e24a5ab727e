//! Shared fixtures for layout unit tests
//!
//! Provides a small fixed-vocabulary label resolver and helpers that parse
//! an in-memory layout without going through the loader.

use super::error::ParseError;
use super::kernel_config::StaticKernelConfig;
use super::labels::LabelResolver;
use super::map::KeyLayoutMap;
use super::parser::Parser;
use super::tokenizer::Tokenizer;

/// Label resolver with a handful of names and made-up codes
pub struct FixedLabels;

impl FixedLabels {
    pub const A: i32 = 1;
    pub const B: i32 = 2;
    pub const AXIS_X: i32 = 100;
    pub const AXIS_Y: i32 = 101;
    pub const LED_NUM_LOCK: i32 = 200;
    pub const LED_CAPS_LOCK: i32 = 201;
}

impl LabelResolver for FixedLabels {
    fn key_code(&self, label: &str) -> Option<i32> {
        match label {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            _ => None,
        }
    }

    fn key_flag(&self, label: &str) -> Option<u32> {
        match label {
            "WAKE" => Some(0x01),
            "FUNCTION" => Some(0x04),
            "FALLBACK_USAGE_MAPPING" => Some(0x10),
            _ => None,
        }
    }

    fn axis(&self, label: &str) -> Option<i32> {
        match label {
            "X" => Some(Self::AXIS_X),
            "Y" => Some(Self::AXIS_Y),
            "HAT_X" => Some(102),
            "HAT_Y" => Some(103),
            _ => None,
        }
    }

    fn led(&self, label: &str) -> Option<i32> {
        match label {
            "NUM_LOCK" => Some(Self::LED_NUM_LOCK),
            "CAPS_LOCK" => Some(Self::LED_CAPS_LOCK),
            _ => None,
        }
    }
}

/// Parse `contents` as a file named `test.kl` using [`FixedLabels`]
pub fn parse_str(contents: &str) -> Result<KeyLayoutMap, ParseError> {
    let mut map = KeyLayoutMap::new();
    let mut tokenizer = Tokenizer::from_contents("test.kl", contents);
    Parser::new(&mut map, &mut tokenizer, &FixedLabels).parse()?;
    Ok(map)
}

/// Kernel config snapshot built from `(name, value)` pairs
pub fn kernel_configs(pairs: &[(&str, &str)]) -> StaticKernelConfig {
    StaticKernelConfig::new(
        pairs
            .iter()
            .map(|&(name, value)| (name.to_string(), value.to_string())),
    )
}
