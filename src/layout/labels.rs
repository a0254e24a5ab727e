//! Symbolic label resolution
//!
//! Layout files refer to key codes, policy flags, axes and LEDs by name. The
//! parser does not own those vocabularies; it asks a [`LabelResolver`] it is
//! given at construction. [`InputEventLabels`] is the built-in platform
//! vocabulary.
//!
//! Sensor types are different: their 17 names are part of the file format
//! itself, so they live here as [`InputDeviceSensorType`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Maps symbolic names used in layout files to integer codes
pub trait LabelResolver {
    /// Key code for a label such as `A` or `DPAD_UP`
    fn key_code(&self, label: &str) -> Option<i32>;

    /// Single-bit policy flag mask for a label such as `WAKE`
    fn key_flag(&self, label: &str) -> Option<u32>;

    /// Motion axis for a label such as `X` or `HAT_Y`
    fn axis(&self, label: &str) -> Option<i32>;

    /// LED code for a label such as `CAPS_LOCK`
    fn led(&self, label: &str) -> Option<i32>;
}

type LabelTable = &'static [(&'static str, i32)];

const KEY_CODES: LabelTable = &[
    ("UNKNOWN", 0),
    ("SOFT_LEFT", 1),
    ("SOFT_RIGHT", 2),
    ("HOME", 3),
    ("BACK", 4),
    ("CALL", 5),
    ("ENDCALL", 6),
    ("0", 7),
    ("1", 8),
    ("2", 9),
    ("3", 10),
    ("4", 11),
    ("5", 12),
    ("6", 13),
    ("7", 14),
    ("8", 15),
    ("9", 16),
    ("STAR", 17),
    ("POUND", 18),
    ("DPAD_UP", 19),
    ("DPAD_DOWN", 20),
    ("DPAD_LEFT", 21),
    ("DPAD_RIGHT", 22),
    ("DPAD_CENTER", 23),
    ("VOLUME_UP", 24),
    ("VOLUME_DOWN", 25),
    ("POWER", 26),
    ("CAMERA", 27),
    ("CLEAR", 28),
    ("A", 29),
    ("B", 30),
    ("C", 31),
    ("D", 32),
    ("E", 33),
    ("F", 34),
    ("G", 35),
    ("H", 36),
    ("I", 37),
    ("J", 38),
    ("K", 39),
    ("L", 40),
    ("M", 41),
    ("N", 42),
    ("O", 43),
    ("P", 44),
    ("Q", 45),
    ("R", 46),
    ("S", 47),
    ("T", 48),
    ("U", 49),
    ("V", 50),
    ("W", 51),
    ("X", 52),
    ("Y", 53),
    ("Z", 54),
    ("COMMA", 55),
    ("PERIOD", 56),
    ("ALT_LEFT", 57),
    ("ALT_RIGHT", 58),
    ("SHIFT_LEFT", 59),
    ("SHIFT_RIGHT", 60),
    ("TAB", 61),
    ("SPACE", 62),
    ("SYM", 63),
    ("EXPLORER", 64),
    ("ENVELOPE", 65),
    ("ENTER", 66),
    ("DEL", 67),
    ("GRAVE", 68),
    ("MINUS", 69),
    ("EQUALS", 70),
    ("LEFT_BRACKET", 71),
    ("RIGHT_BRACKET", 72),
    ("BACKSLASH", 73),
    ("SEMICOLON", 74),
    ("APOSTROPHE", 75),
    ("SLASH", 76),
    ("AT", 77),
    ("NUM", 78),
    ("HEADSETHOOK", 79),
    ("FOCUS", 80),
    ("PLUS", 81),
    ("MENU", 82),
    ("NOTIFICATION", 83),
    ("SEARCH", 84),
    ("MEDIA_PLAY_PAUSE", 85),
    ("MEDIA_STOP", 86),
    ("MEDIA_NEXT", 87),
    ("MEDIA_PREVIOUS", 88),
    ("MEDIA_REWIND", 89),
    ("MEDIA_FAST_FORWARD", 90),
    ("MUTE", 91),
    ("PAGE_UP", 92),
    ("PAGE_DOWN", 93),
    ("PICTSYMBOLS", 94),
    ("SWITCH_CHARSET", 95),
    ("BUTTON_A", 96),
    ("BUTTON_B", 97),
    ("BUTTON_C", 98),
    ("BUTTON_X", 99),
    ("BUTTON_Y", 100),
    ("BUTTON_Z", 101),
    ("BUTTON_L1", 102),
    ("BUTTON_R1", 103),
    ("BUTTON_L2", 104),
    ("BUTTON_R2", 105),
    ("BUTTON_THUMBL", 106),
    ("BUTTON_THUMBR", 107),
    ("BUTTON_START", 108),
    ("BUTTON_SELECT", 109),
    ("BUTTON_MODE", 110),
    ("ESCAPE", 111),
    ("FORWARD_DEL", 112),
    ("CTRL_LEFT", 113),
    ("CTRL_RIGHT", 114),
    ("CAPS_LOCK", 115),
    ("SCROLL_LOCK", 116),
    ("META_LEFT", 117),
    ("META_RIGHT", 118),
    ("FUNCTION", 119),
    ("SYSRQ", 120),
    ("BREAK", 121),
    ("MOVE_HOME", 122),
    ("MOVE_END", 123),
    ("INSERT", 124),
    ("FORWARD", 125),
    ("MEDIA_PLAY", 126),
    ("MEDIA_PAUSE", 127),
    ("MEDIA_CLOSE", 128),
    ("MEDIA_EJECT", 129),
    ("MEDIA_RECORD", 130),
    ("F1", 131),
    ("F2", 132),
    ("F3", 133),
    ("F4", 134),
    ("F5", 135),
    ("F6", 136),
    ("F7", 137),
    ("F8", 138),
    ("F9", 139),
    ("F10", 140),
    ("F11", 141),
    ("F12", 142),
    ("NUM_LOCK", 143),
    ("NUMPAD_0", 144),
    ("NUMPAD_1", 145),
    ("NUMPAD_2", 146),
    ("NUMPAD_3", 147),
    ("NUMPAD_4", 148),
    ("NUMPAD_5", 149),
    ("NUMPAD_6", 150),
    ("NUMPAD_7", 151),
    ("NUMPAD_8", 152),
    ("NUMPAD_9", 153),
    ("NUMPAD_DIVIDE", 154),
    ("NUMPAD_MULTIPLY", 155),
    ("NUMPAD_SUBTRACT", 156),
    ("NUMPAD_ADD", 157),
    ("NUMPAD_DOT", 158),
    ("NUMPAD_COMMA", 159),
    ("NUMPAD_ENTER", 160),
    ("NUMPAD_EQUALS", 161),
    ("NUMPAD_LEFT_PAREN", 162),
    ("NUMPAD_RIGHT_PAREN", 163),
    ("VOLUME_MUTE", 164),
    ("INFO", 165),
    ("CHANNEL_UP", 166),
    ("CHANNEL_DOWN", 167),
    ("ZOOM_IN", 168),
    ("ZOOM_OUT", 169),
    ("TV", 170),
    ("WINDOW", 171),
    ("GUIDE", 172),
    ("DVR", 173),
    ("BOOKMARK", 174),
    ("CAPTIONS", 175),
    ("SETTINGS", 176),
    ("TV_POWER", 177),
    ("TV_INPUT", 178),
    ("STB_POWER", 179),
    ("STB_INPUT", 180),
    ("AVR_POWER", 181),
    ("AVR_INPUT", 182),
    ("PROG_RED", 183),
    ("PROG_GREEN", 184),
    ("PROG_YELLOW", 185),
    ("PROG_BLUE", 186),
    ("APP_SWITCH", 187),
    ("BUTTON_1", 188),
    ("BUTTON_2", 189),
    ("BUTTON_3", 190),
    ("BUTTON_4", 191),
    ("BUTTON_5", 192),
    ("BUTTON_6", 193),
    ("BUTTON_7", 194),
    ("BUTTON_8", 195),
    ("BUTTON_9", 196),
    ("BUTTON_10", 197),
    ("BUTTON_11", 198),
    ("BUTTON_12", 199),
    ("BUTTON_13", 200),
    ("BUTTON_14", 201),
    ("BUTTON_15", 202),
    ("BUTTON_16", 203),
    ("LANGUAGE_SWITCH", 204),
    ("MANNER_MODE", 205),
    ("3D_MODE", 206),
    ("CONTACTS", 207),
    ("CALENDAR", 208),
    ("MUSIC", 209),
    ("CALCULATOR", 210),
    ("ZENKAKU_HANKAKU", 211),
    ("EISU", 212),
    ("MUHENKAN", 213),
    ("HENKAN", 214),
    ("KATAKANA_HIRAGANA", 215),
    ("YEN", 216),
    ("RO", 217),
    ("KANA", 218),
    ("ASSIST", 219),
    ("BRIGHTNESS_DOWN", 220),
    ("BRIGHTNESS_UP", 221),
    ("MEDIA_AUDIO_TRACK", 222),
    ("SLEEP", 223),
    ("WAKEUP", 224),
    ("PAIRING", 225),
    ("MEDIA_TOP_MENU", 226),
    ("11", 227),
    ("12", 228),
    ("LAST_CHANNEL", 229),
    ("TV_DATA_SERVICE", 230),
    ("VOICE_ASSIST", 231),
    ("TV_RADIO_SERVICE", 232),
    ("TV_TELETEXT", 233),
    ("TV_NUMBER_ENTRY", 234),
    ("TV_TERRESTRIAL_ANALOG", 235),
    ("TV_TERRESTRIAL_DIGITAL", 236),
    ("TV_SATELLITE", 237),
    ("TV_SATELLITE_BS", 238),
    ("TV_SATELLITE_CS", 239),
    ("TV_SATELLITE_SERVICE", 240),
    ("TV_NETWORK", 241),
    ("TV_ANTENNA_CABLE", 242),
    ("TV_INPUT_HDMI_1", 243),
    ("TV_INPUT_HDMI_2", 244),
    ("TV_INPUT_HDMI_3", 245),
    ("TV_INPUT_HDMI_4", 246),
    ("TV_INPUT_COMPOSITE_1", 247),
    ("TV_INPUT_COMPOSITE_2", 248),
    ("TV_INPUT_COMPONENT_1", 249),
    ("TV_INPUT_COMPONENT_2", 250),
    ("TV_INPUT_VGA_1", 251),
    ("TV_AUDIO_DESCRIPTION", 252),
    ("TV_AUDIO_DESCRIPTION_MIX_UP", 253),
    ("TV_AUDIO_DESCRIPTION_MIX_DOWN", 254),
    ("TV_ZOOM_MODE", 255),
    ("TV_CONTENTS_MENU", 256),
    ("TV_MEDIA_CONTEXT_MENU", 257),
    ("TV_TIMER_PROGRAMMING", 258),
    ("HELP", 259),
    ("NAVIGATE_PREVIOUS", 260),
    ("NAVIGATE_NEXT", 261),
    ("NAVIGATE_IN", 262),
    ("NAVIGATE_OUT", 263),
    ("STEM_PRIMARY", 264),
    ("STEM_1", 265),
    ("STEM_2", 266),
    ("STEM_3", 267),
    ("DPAD_UP_LEFT", 268),
    ("DPAD_DOWN_LEFT", 269),
    ("DPAD_UP_RIGHT", 270),
    ("DPAD_DOWN_RIGHT", 271),
    ("MEDIA_SKIP_FORWARD", 272),
    ("MEDIA_SKIP_BACKWARD", 273),
    ("MEDIA_STEP_FORWARD", 274),
    ("MEDIA_STEP_BACKWARD", 275),
    ("SOFT_SLEEP", 276),
    ("CUT", 277),
    ("COPY", 278),
    ("PASTE", 279),
    ("SYSTEM_NAVIGATION_UP", 280),
    ("SYSTEM_NAVIGATION_DOWN", 281),
    ("SYSTEM_NAVIGATION_LEFT", 282),
    ("SYSTEM_NAVIGATION_RIGHT", 283),
    ("ALL_APPS", 284),
    ("REFRESH", 285),
    ("THUMBS_UP", 286),
    ("THUMBS_DOWN", 287),
    ("PROFILE_SWITCH", 288),
];

const KEY_FLAGS: LabelTable = &[
    ("WAKE", 0x0000_0001),
    ("VIRTUAL", 0x0000_0002),
    ("FUNCTION", 0x0000_0004),
    ("GESTURE", 0x0000_0008),
    ("FALLBACK_USAGE_MAPPING", 0x0000_0010),
];

const AXES: LabelTable = &[
    ("X", 0),
    ("Y", 1),
    ("PRESSURE", 2),
    ("SIZE", 3),
    ("TOUCH_MAJOR", 4),
    ("TOUCH_MINOR", 5),
    ("TOOL_MAJOR", 6),
    ("TOOL_MINOR", 7),
    ("ORIENTATION", 8),
    ("VSCROLL", 9),
    ("HSCROLL", 10),
    ("Z", 11),
    ("RX", 12),
    ("RY", 13),
    ("RZ", 14),
    ("HAT_X", 15),
    ("HAT_Y", 16),
    ("LTRIGGER", 17),
    ("RTRIGGER", 18),
    ("THROTTLE", 19),
    ("RUDDER", 20),
    ("WHEEL", 21),
    ("GAS", 22),
    ("BRAKE", 23),
    ("DISTANCE", 24),
    ("TILT", 25),
    ("SCROLL", 26),
    ("RELATIVE_X", 27),
    ("RELATIVE_Y", 28),
    ("GENERIC_1", 32),
    ("GENERIC_2", 33),
    ("GENERIC_3", 34),
    ("GENERIC_4", 35),
    ("GENERIC_5", 36),
    ("GENERIC_6", 37),
    ("GENERIC_7", 38),
    ("GENERIC_8", 39),
    ("GENERIC_9", 40),
    ("GENERIC_10", 41),
    ("GENERIC_11", 42),
    ("GENERIC_12", 43),
    ("GENERIC_13", 44),
    ("GENERIC_14", 45),
    ("GENERIC_15", 46),
    ("GENERIC_16", 47),
];

const LEDS: LabelTable = &[
    ("NUM_LOCK", 0x00),
    ("CAPS_LOCK", 0x01),
    ("SCROLL_LOCK", 0x02),
    ("COMPOSE", 0x03),
    ("KANA", 0x04),
    ("SLEEP", 0x05),
    ("SUSPEND", 0x06),
    ("MUTE", 0x07),
    ("MISC", 0x08),
    ("MAIL", 0x09),
    ("CHARGING", 0x0a),
    ("CONTROLLER_1", 0x10),
    ("CONTROLLER_2", 0x11),
    ("CONTROLLER_3", 0x12),
    ("CONTROLLER_4", 0x13),
];

/// Forward and reverse index over one label table
struct LabelIndex {
    by_label: HashMap<&'static str, i32>,
    by_code: HashMap<i32, &'static str>,
}

impl LabelIndex {
    fn new(table: LabelTable) -> Self {
        let by_label = table.iter().copied().collect();
        let by_code = table.iter().map(|&(label, code)| (code, label)).collect();
        Self { by_label, by_code }
    }
}

static KEY_CODE_INDEX: LazyLock<LabelIndex> = LazyLock::new(|| LabelIndex::new(KEY_CODES));
static KEY_FLAG_INDEX: LazyLock<LabelIndex> = LazyLock::new(|| LabelIndex::new(KEY_FLAGS));
static AXIS_INDEX: LazyLock<LabelIndex> = LazyLock::new(|| LabelIndex::new(AXES));
static LED_INDEX: LazyLock<LabelIndex> = LazyLock::new(|| LabelIndex::new(LEDS));

/// The platform's built-in label vocabulary
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEventLabels;

impl InputEventLabels {
    pub fn new() -> Self {
        Self
    }

    /// Name of a key code, e.g. `29` -> `A`
    pub fn key_code_label(&self, code: i32) -> Option<&'static str> {
        KEY_CODE_INDEX.by_code.get(&code).copied()
    }

    /// Names of every flag bit set in `flags`, lowest bit first.
    ///
    /// Bits with no known name are skipped.
    pub fn key_flag_labels(&self, flags: u32) -> Vec<&'static str> {
        (0..u32::BITS)
            .map(|bit| 1u32 << bit)
            .filter(|mask| flags & mask != 0)
            .filter_map(|mask| KEY_FLAG_INDEX.by_code.get(&(mask as i32)).copied())
            .collect()
    }

    pub fn axis_label(&self, axis: i32) -> Option<&'static str> {
        AXIS_INDEX.by_code.get(&axis).copied()
    }

    pub fn led_label(&self, led: i32) -> Option<&'static str> {
        LED_INDEX.by_code.get(&led).copied()
    }
}

impl LabelResolver for InputEventLabels {
    fn key_code(&self, label: &str) -> Option<i32> {
        KEY_CODE_INDEX.by_label.get(label).copied()
    }

    fn key_flag(&self, label: &str) -> Option<u32> {
        KEY_FLAG_INDEX.by_label.get(label).map(|&mask| mask as u32)
    }

    fn axis(&self, label: &str) -> Option<i32> {
        AXIS_INDEX.by_label.get(label).copied()
    }

    fn led(&self, label: &str) -> Option<i32> {
        LED_INDEX.by_label.get(label).copied()
    }
}

/// Sensor types addressable from a `sensor` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
#[repr(i32)]
pub enum InputDeviceSensorType {
    ACCELEROMETER = 1,
    MAGNETIC_FIELD = 2,
    ORIENTATION = 3,
    GYROSCOPE = 4,
    LIGHT = 5,
    PRESSURE = 6,
    TEMPERATURE = 7,
    PROXIMITY = 8,
    GRAVITY = 9,
    LINEAR_ACCELERATION = 10,
    ROTATION_VECTOR = 11,
    RELATIVE_HUMIDITY = 12,
    AMBIENT_TEMPERATURE = 13,
    MAGNETIC_FIELD_UNCALIBRATED = 14,
    GAME_ROTATION_VECTOR = 15,
    GYROSCOPE_UNCALIBRATED = 16,
    SIGNIFICANT_MOTION = 17,
}

impl InputDeviceSensorType {
    pub const ALL: [InputDeviceSensorType; 17] = [
        Self::ACCELEROMETER,
        Self::MAGNETIC_FIELD,
        Self::ORIENTATION,
        Self::GYROSCOPE,
        Self::LIGHT,
        Self::PRESSURE,
        Self::TEMPERATURE,
        Self::PROXIMITY,
        Self::GRAVITY,
        Self::LINEAR_ACCELERATION,
        Self::ROTATION_VECTOR,
        Self::RELATIVE_HUMIDITY,
        Self::AMBIENT_TEMPERATURE,
        Self::MAGNETIC_FIELD_UNCALIBRATED,
        Self::GAME_ROTATION_VECTOR,
        Self::GYROSCOPE_UNCALIBRATED,
        Self::SIGNIFICANT_MOTION,
    ];

    /// Name as written in layout files
    pub fn name(&self) -> &'static str {
        match self {
            Self::ACCELEROMETER => "ACCELEROMETER",
            Self::MAGNETIC_FIELD => "MAGNETIC_FIELD",
            Self::ORIENTATION => "ORIENTATION",
            Self::GYROSCOPE => "GYROSCOPE",
            Self::LIGHT => "LIGHT",
            Self::PRESSURE => "PRESSURE",
            Self::TEMPERATURE => "TEMPERATURE",
            Self::PROXIMITY => "PROXIMITY",
            Self::GRAVITY => "GRAVITY",
            Self::LINEAR_ACCELERATION => "LINEAR_ACCELERATION",
            Self::ROTATION_VECTOR => "ROTATION_VECTOR",
            Self::RELATIVE_HUMIDITY => "RELATIVE_HUMIDITY",
            Self::AMBIENT_TEMPERATURE => "AMBIENT_TEMPERATURE",
            Self::MAGNETIC_FIELD_UNCALIBRATED => "MAGNETIC_FIELD_UNCALIBRATED",
            Self::GAME_ROTATION_VECTOR => "GAME_ROTATION_VECTOR",
            Self::GYROSCOPE_UNCALIBRATED => "GYROSCOPE_UNCALIBRATED",
            Self::SIGNIFICANT_MOTION => "SIGNIFICANT_MOTION",
        }
    }

    /// Exact, case-sensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }
}

impl fmt::Display for InputDeviceSensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_key_codes() {
        let labels = InputEventLabels::new();
        assert_eq!(labels.key_code("A"), Some(29));
        assert_eq!(labels.key_code("DPAD_UP"), Some(19));
        assert_eq!(labels.key_code("0"), Some(7));
        assert_eq!(labels.key_code("a"), None);
        assert_eq!(labels.key_code("KEYCODE_A"), None);
    }

    #[test]
    fn key_flags_are_single_bits() {
        let labels = InputEventLabels::new();
        for &(name, _) in KEY_FLAGS {
            let mask = labels.key_flag(name).unwrap();
            assert_eq!(mask.count_ones(), 1, "{name} is not a single bit");
        }
        assert_eq!(labels.key_flag("FUNCTION"), Some(0x4));
        assert_eq!(labels.key_flag("SHIFT"), None);
    }

    #[test]
    fn resolves_axes_and_leds() {
        let labels = InputEventLabels::new();
        assert_eq!(labels.axis("HAT_X"), Some(15));
        assert_eq!(labels.axis("GENERIC_16"), Some(47));
        assert_eq!(labels.led("CAPS_LOCK"), Some(1));
        assert_eq!(labels.led("CONTROLLER_1"), Some(0x10));
        assert_eq!(labels.led("BLINK"), None);
    }

    #[test]
    fn reverse_lookups() {
        let labels = InputEventLabels::new();
        assert_eq!(labels.key_code_label(29), Some("A"));
        assert_eq!(labels.axis_label(11), Some("Z"));
        assert_eq!(labels.led_label(2), Some("SCROLL_LOCK"));
        assert_eq!(labels.key_flag_labels(0x5), vec!["WAKE", "FUNCTION"]);
        assert!(labels.key_flag_labels(0x8000_0000).is_empty());
    }

    #[test]
    fn tables_have_unique_labels_and_codes() {
        for table in [KEY_CODES, KEY_FLAGS, AXES, LEDS] {
            let index = LabelIndex::new(table);
            assert_eq!(index.by_label.len(), table.len());
            assert_eq!(index.by_code.len(), table.len());
        }
    }

    #[test]
    fn sensor_type_names_round_trip() {
        assert_eq!(InputDeviceSensorType::ALL.len(), 17);
        for ty in InputDeviceSensorType::ALL {
            assert_eq!(InputDeviceSensorType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(InputDeviceSensorType::from_name("accelerometer"), None);
        assert_eq!(InputDeviceSensorType::from_name("STEP_COUNTER"), None);
    }
}
