//! Parser for the key layout text format
//!
//! One directive per line:
//!
//! ```text
//! key [usage] <code> <KEYCODE> [<FLAG> ...]
//! axis <scan code> (<AXIS> | invert <AXIS> | split <value> <LOW> <HIGH>) [flat <value>]
//! led [usage] <code> <LED>
//! sensor <abs code> <SENSOR_TYPE> (X | Y | Z)
//! requires_kernel_config <CONFIG_NAME>
//! ```
//!
//! `#` starts a comment that runs to the end of the line. The first error
//! aborts the parse.

use super::error::{ParseError, ParseErrorKind};
use super::labels::{InputDeviceSensorType, LabelResolver};
use super::map::{AxisInfo, AxisMode, Key, KeyLayoutMap, Led, PolicyFlags, SensorMapping};
use super::tokenizer::Tokenizer;
use crate::utils::parse_c_int;
use log::{debug, error};

/// Token delimiters: space, tab and carriage return
pub const WHITESPACE: &str = " \t\r";

const PARSER_TARGET: &str = "keylayout::parser";

/// Single-pass parser filling a [`KeyLayoutMap`] from a [`Tokenizer`]
pub struct Parser<'a> {
    map: &'a mut KeyLayoutMap,
    tokenizer: &'a mut Tokenizer,
    labels: &'a dyn LabelResolver,
}

impl<'a> Parser<'a> {
    pub fn new(
        map: &'a mut KeyLayoutMap,
        tokenizer: &'a mut Tokenizer,
        labels: &'a dyn LabelResolver,
    ) -> Self {
        Self {
            map,
            tokenizer,
            labels,
        }
    }

    pub fn parse(&mut self) -> Result<(), ParseError> {
        while !self.tokenizer.is_eof() {
            debug!(
                target: PARSER_TARGET,
                "Parsing {}: '{}'.",
                self.tokenizer.location(),
                self.tokenizer.peek_remainder_of_line()
            );

            self.tokenizer.skip_delimiters(WHITESPACE);

            if !self.at_end_of_directive() {
                let keyword = self.tokenizer.next_token(WHITESPACE);
                self.tokenizer.skip_delimiters(WHITESPACE);
                match keyword.as_str() {
                    "key" => self.parse_key()?,
                    "axis" => self.parse_axis()?,
                    "led" => self.parse_led()?,
                    "sensor" => self.parse_sensor()?,
                    "requires_kernel_config" => self.parse_required_kernel_config()?,
                    _ => {
                        return Err(self.fail(
                            ParseErrorKind::Syntax,
                            format!("Expected keyword, got '{}'.", keyword),
                        ))
                    }
                }

                self.tokenizer.skip_delimiters(WHITESPACE);
                if !self.at_end_of_directive() {
                    return Err(self.fail(
                        ParseErrorKind::Syntax,
                        format!(
                            "Expected end of line or trailing comment, got '{}'.",
                            self.tokenizer.peek_remainder_of_line()
                        ),
                    ));
                }
            }

            self.tokenizer.next_line();
        }
        Ok(())
    }

    fn parse_key(&mut self) -> Result<(), ParseError> {
        let (usage, code_token) = self.next_code_token();
        let dimension = code_dimension(usage);

        let code = parse_c_int(&code_token).map_err(|_| {
            self.fail(
                ParseErrorKind::Syntax,
                format!("Expected key {} number, got '{}'.", dimension, code_token),
            )
        })?;
        if self.map.key_table_mut(usage).contains_key(&code) {
            return Err(self.fail(
                ParseErrorKind::DuplicateEntry,
                format!("Duplicate entry for key {} '{}'.", dimension, code_token),
            ));
        }

        self.tokenizer.skip_delimiters(WHITESPACE);
        let key_code_token = self.tokenizer.next_token(WHITESPACE);
        let key_code = self.labels.key_code(&key_code_token).ok_or_else(|| {
            self.fail(
                ParseErrorKind::UnknownLabel,
                format!("Expected key code label, got '{}'.", key_code_token),
            )
        })?;

        let mut flags: u32 = 0;
        loop {
            self.tokenizer.skip_delimiters(WHITESPACE);
            if self.at_end_of_directive() {
                break;
            }

            let flag_token = self.tokenizer.next_token(WHITESPACE);
            let flag = self.labels.key_flag(&flag_token).ok_or_else(|| {
                self.fail(
                    ParseErrorKind::UnknownLabel,
                    format!("Expected key flag label, got '{}'.", flag_token),
                )
            })?;
            if flags & flag != 0 {
                return Err(self.fail(
                    ParseErrorKind::DuplicateEntry,
                    format!("Duplicate key flag '{}'.", flag_token),
                ));
            }
            flags |= flag;
        }

        debug!(
            target: PARSER_TARGET,
            "Parsed key {}: code={}, keyCode={}, flags=0x{:08x}.", dimension, code, key_code, flags
        );

        self.map.key_table_mut(usage).insert(
            code,
            Key {
                key_code,
                flags: PolicyFlags::from_bits_retain(flags),
            },
        );
        Ok(())
    }

    fn parse_axis(&mut self) -> Result<(), ParseError> {
        let scan_code_token = self.tokenizer.next_token(WHITESPACE);
        let scan_code = parse_c_int(&scan_code_token).map_err(|_| {
            self.fail(
                ParseErrorKind::Syntax,
                format!("Expected axis scan code number, got '{}'.", scan_code_token),
            )
        })?;
        if self.map.axes_mut().contains_key(&scan_code) {
            return Err(self.fail(
                ParseErrorKind::DuplicateEntry,
                format!("Duplicate entry for axis scan code '{}'.", scan_code_token),
            ));
        }

        self.tokenizer.skip_delimiters(WHITESPACE);
        let token = self.tokenizer.next_token(WHITESPACE);
        let mode = match token.as_str() {
            "invert" => AxisMode::Invert {
                axis: self.next_axis("inverted axis")?,
            },
            "split" => {
                self.tokenizer.skip_delimiters(WHITESPACE);
                let split_token = self.tokenizer.next_token(WHITESPACE);
                let split_value = parse_c_int(&split_token).map_err(|_| {
                    self.fail(
                        ParseErrorKind::Syntax,
                        format!("Expected split value, got '{}'.", split_token),
                    )
                })?;
                let low_axis = self.next_axis("low axis")?;
                let high_axis = self.next_axis("high axis")?;
                AxisMode::Split {
                    low_axis,
                    high_axis,
                    split_value,
                }
            }
            _ => {
                let axis = self.labels.axis(&token).ok_or_else(|| {
                    self.fail(
                        ParseErrorKind::UnknownLabel,
                        format!("Expected axis label, 'split' or 'invert', got '{}'.", token),
                    )
                })?;
                AxisMode::Normal { axis }
            }
        };
        let mut info = AxisInfo::new(mode);

        loop {
            self.tokenizer.skip_delimiters(WHITESPACE);
            if self.at_end_of_directive() {
                break;
            }

            let keyword = self.tokenizer.next_token(WHITESPACE);
            if keyword != "flat" {
                return Err(self.fail(
                    ParseErrorKind::Syntax,
                    format!("Expected keyword 'flat', got '{}'.", keyword),
                ));
            }
            self.tokenizer.skip_delimiters(WHITESPACE);
            let flat_token = self.tokenizer.next_token(WHITESPACE);
            let flat = parse_c_int(&flat_token).map_err(|_| {
                self.fail(
                    ParseErrorKind::Syntax,
                    format!("Expected flat value, got '{}'.", flat_token),
                )
            })?;
            info.flat_override = Some(flat);
        }

        debug!(
            target: PARSER_TARGET,
            "Parsed axis: scanCode={}, mode={:?}, flatOverride={:?}.",
            scan_code,
            info.mode,
            info.flat_override
        );
        self.map.axes_mut().insert(scan_code, info);
        Ok(())
    }

    fn parse_led(&mut self) -> Result<(), ParseError> {
        let (usage, code_token) = self.next_code_token();
        let dimension = code_dimension(usage);

        let code = parse_c_int(&code_token).map_err(|_| {
            self.fail(
                ParseErrorKind::Syntax,
                format!("Expected led {} number, got '{}'.", dimension, code_token),
            )
        })?;
        if self.map.led_table_mut(usage).contains_key(&code) {
            return Err(self.fail(
                ParseErrorKind::DuplicateEntry,
                format!("Duplicate entry for led {} '{}'.", dimension, code_token),
            ));
        }

        self.tokenizer.skip_delimiters(WHITESPACE);
        let led_token = self.tokenizer.next_token(WHITESPACE);
        let led_code = self.labels.led(&led_token).ok_or_else(|| {
            self.fail(
                ParseErrorKind::UnknownLabel,
                format!("Expected LED code label, got '{}'.", led_token),
            )
        })?;

        debug!(
            target: PARSER_TARGET,
            "Parsed led {}: code={}, ledCode={}.", dimension, code, led_code
        );
        self.map.led_table_mut(usage).insert(code, Led { led_code });
        Ok(())
    }

    // sensor <abs code> <sensor type> <X|Y|Z>, e.g. `sensor 0x03 GYROSCOPE X`
    fn parse_sensor(&mut self) -> Result<(), ParseError> {
        let code_token = self.tokenizer.next_token(WHITESPACE);
        let code = parse_c_int(&code_token).map_err(|_| {
            self.fail(
                ParseErrorKind::Syntax,
                format!("Expected sensor abs code number, got '{}'.", code_token),
            )
        })?;
        if self.map.sensors_mut().contains_key(&code) {
            return Err(self.fail(
                ParseErrorKind::DuplicateEntry,
                format!("Duplicate entry for sensor abs code '{}'.", code_token),
            ));
        }

        self.tokenizer.skip_delimiters(WHITESPACE);
        let type_token = self.tokenizer.next_token(WHITESPACE);
        let sensor_type = InputDeviceSensorType::from_name(&type_token).ok_or_else(|| {
            self.fail(
                ParseErrorKind::UnknownLabel,
                format!("Expected sensor code label, got '{}'.", type_token),
            )
        })?;

        self.tokenizer.skip_delimiters(WHITESPACE);
        let index_token = self.tokenizer.next_token(WHITESPACE);
        let data_index = match index_token.as_str() {
            "X" => 0,
            "Y" => 1,
            "Z" => 2,
            _ => {
                return Err(self.fail(
                    ParseErrorKind::Syntax,
                    format!("Expected sensor data index label, got '{}'.", index_token),
                ))
            }
        };

        debug!(
            target: PARSER_TARGET,
            "Parsed sensor: abs code={}, sensorType={}, sensorDataIndex={}.",
            code,
            sensor_type,
            data_index
        );
        self.map.sensors_mut().insert(
            code,
            SensorMapping {
                sensor_type,
                data_index,
            },
        );
        Ok(())
    }

    // The layout is only used if the named option is enabled in the running
    // kernel, e.g. `requires_kernel_config CONFIG_HID_PLAYSTATION`
    fn parse_required_kernel_config(&mut self) -> Result<(), ParseError> {
        let name = self.tokenizer.next_token(WHITESPACE);
        if name.is_empty() {
            return Err(self.fail(
                ParseErrorKind::Syntax,
                "Expected kernel config name, got ''.".to_string(),
            ));
        }

        if !self.map.required_kernel_configs_mut().insert(name.clone()) {
            return Err(self.fail(
                ParseErrorKind::DuplicateEntry,
                format!("Duplicate entry for required kernel config {}.", name),
            ));
        }

        debug!(target: PARSER_TARGET, "Parsed required kernel config: name={}", name);
        Ok(())
    }

    /// Reads the code operand of `key` and `led`, consuming an optional
    /// leading `usage` word. Returns whether `usage` was present.
    fn next_code_token(&mut self) -> (bool, String) {
        let token = self.tokenizer.next_token(WHITESPACE);
        if token == "usage" {
            self.tokenizer.skip_delimiters(WHITESPACE);
            (true, self.tokenizer.next_token(WHITESPACE))
        } else {
            (false, token)
        }
    }

    fn next_axis(&mut self, what: &str) -> Result<i32, ParseError> {
        self.tokenizer.skip_delimiters(WHITESPACE);
        let token = self.tokenizer.next_token(WHITESPACE);
        self.labels.axis(&token).ok_or_else(|| {
            self.fail(
                ParseErrorKind::UnknownLabel,
                format!("Expected {} label, got '{}'.", what, token),
            )
        })
    }

    fn at_end_of_directive(&self) -> bool {
        self.tokenizer.is_eol() || self.tokenizer.peek_char() == Some('#')
    }

    fn fail(&self, kind: ParseErrorKind, message: String) -> ParseError {
        let err = ParseError::new(self.tokenizer.location(), kind, message);
        error!("{}", err);
        err
    }
}

fn code_dimension(usage: bool) -> &'static str {
    if usage {
        "usage"
    } else {
        "scan code"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_helpers::{parse_str, FixedLabels};

    #[test]
    fn parses_scan_code_key() {
        let map = parse_str("key 30 A\n").unwrap();
        assert_eq!(
            map.map_key(30, 0),
            Some(Key {
                key_code: FixedLabels::A,
                flags: PolicyFlags::empty()
            })
        );
    }

    #[test]
    fn parses_usage_key_with_flags() {
        let map = parse_str("key usage 0x00070004 A WAKE FUNCTION\n").unwrap();
        let key = map.map_key(0, 0x0007_0004).unwrap();
        assert_eq!(key.key_code, FixedLabels::A);
        assert_eq!(key.flags, PolicyFlags::WAKE | PolicyFlags::FUNCTION);
        assert_eq!(map.map_key(0x0007_0004, 0), None);
    }

    #[test]
    fn same_code_in_both_key_tables_is_allowed() {
        let map = parse_str("key 4 A\nkey usage 4 B\n").unwrap();
        assert_eq!(map.map_key(4, 0).unwrap().key_code, FixedLabels::A);
        assert_eq!(map.map_key(0, 4).unwrap().key_code, FixedLabels::B);
    }

    #[test]
    fn rejects_duplicate_flag() {
        let err = parse_str("key 30 A WAKE WAKE\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateEntry);
        assert!(err.message.contains("WAKE"));
    }

    #[test]
    fn rejects_unknown_labels() {
        let err = parse_str("key 30 NOT_A_KEY\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownLabel);
        assert_eq!(err.message, "Expected key code label, got 'NOT_A_KEY'.");

        let err = parse_str("key 30 A SHOUT\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownLabel);

        let err = parse_str("led 1 BLINK\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownLabel);

        let err = parse_str("axis 1 W\n").unwrap_err();
        assert_eq!(err.message, "Expected axis label, 'split' or 'invert', got 'W'.");
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = parse_str("key zz A\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.message, "Expected key scan code number, got 'zz'.");

        let err = parse_str("key usage 0x1ffffffff A\n").unwrap_err();
        assert_eq!(err.message, "Expected key usage number, got '0x1ffffffff'.");

        let err = parse_str("key\n").unwrap_err();
        assert_eq!(err.message, "Expected key scan code number, got ''.");
    }

    #[test]
    fn rejects_unknown_keyword() {
        let err = parse_str("# header\nkeys 30 A\n").unwrap_err();
        assert_eq!(err.line(), 2);
        assert_eq!(err.message, "Expected keyword, got 'keys'.");
    }

    #[test]
    fn keyword_is_case_sensitive() {
        assert!(parse_str("KEY 30 A\n").is_err());
        assert!(parse_str("key USAGE 30 A\n").is_err());
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse_str("led 1 CAPS_LOCK extra\n").unwrap_err();
        assert_eq!(
            err.message,
            "Expected end of line or trailing comment, got 'extra'."
        );
        let err = parse_str("sensor 0 GYROSCOPE X Y\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn trailing_comments_are_allowed() {
        let map = parse_str(
            "key 30 A # letter a\n\
             key 31 B WAKE # wakes\n\
             axis 0 X # stick\n\
             led 1 CAPS_LOCK # caps\n\
             sensor 0 ACCELEROMETER X # accel\n\
             requires_kernel_config CONFIG_X # gate\n",
        )
        .unwrap();
        assert_eq!(map.map_key(31, 0).unwrap().flags, PolicyFlags::WAKE);
        assert!(map.required_kernel_configs().contains("CONFIG_X"));
    }

    #[test]
    fn parses_axis_forms() {
        let map = parse_str(
            "axis 0x00 X\n\
             axis 0x01 invert Y flat 0x10\n\
             axis 0x11 split 75 X Y flat 4096\n\
             axis 0x12 split -1 HAT_X HAT_Y\n",
        )
        .unwrap();

        assert_eq!(
            map.map_axis(0x00),
            Some(AxisInfo::new(AxisMode::Normal { axis: FixedLabels::AXIS_X }))
        );
        let inverted = map.map_axis(0x01).unwrap();
        assert_eq!(inverted.mode, AxisMode::Invert { axis: FixedLabels::AXIS_Y });
        assert_eq!(inverted.flat_override, Some(16));

        let split = map.map_axis(0x11).unwrap();
        assert_eq!(
            split.mode,
            AxisMode::Split {
                low_axis: FixedLabels::AXIS_X,
                high_axis: FixedLabels::AXIS_Y,
                split_value: 75
            }
        );
        assert_eq!(split.flat_override, Some(4096));
        assert_eq!(map.map_axis(0x12).unwrap().flat_override, None);
    }

    #[test]
    fn axis_errors() {
        let err = parse_str("axis 1 split 75 X\n").unwrap_err();
        assert_eq!(err.message, "Expected high axis label, got ''.");

        let err = parse_str("axis 1 split many X Y\n").unwrap_err();
        assert_eq!(err.message, "Expected split value, got 'many'.");

        let err = parse_str("axis 1 invert\n").unwrap_err();
        assert_eq!(err.message, "Expected inverted axis label, got ''.");

        let err = parse_str("axis 1 X deadzone 5\n").unwrap_err();
        assert_eq!(err.message, "Expected keyword 'flat', got 'deadzone'.");

        let err = parse_str("axis 1 X flat\n").unwrap_err();
        assert_eq!(err.message, "Expected flat value, got ''.");
    }

    #[test]
    fn parses_sensors() {
        let map = parse_str(
            "sensor 0x00 ACCELEROMETER X\n\
             sensor 0x01 ACCELEROMETER Y\n\
             sensor 0x02 ACCELEROMETER Z\n",
        )
        .unwrap();
        let z = map.map_sensor(0x02).unwrap();
        assert_eq!(z.sensor_type, InputDeviceSensorType::ACCELEROMETER);
        assert_eq!(z.data_index, 2);
    }

    #[test]
    fn sensor_errors() {
        let err = parse_str("sensor 0 accelerometer X\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownLabel);
        let err = parse_str("sensor 0 GYROSCOPE W\n").unwrap_err();
        assert_eq!(err.message, "Expected sensor data index label, got 'W'.");
    }

    #[test]
    fn required_kernel_configs() {
        let map = parse_str(
            "requires_kernel_config CONFIG_HID_PLAYSTATION\n\
             requires_kernel_config CONFIG_HID_NINTENDO\n",
        )
        .unwrap();
        assert_eq!(map.required_kernel_configs().len(), 2);

        let err = parse_str("requires_kernel_config\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn duplicate_entries_in_every_table() {
        let cases = [
            "key 30 A\nkey 30 B\n",
            "key usage 7 A\nkey usage 0x7 B\n",
            "led 1 CAPS_LOCK\nled 1 NUM_LOCK\n",
            "led usage 1 CAPS_LOCK\nled usage 1 NUM_LOCK\n",
            "axis 1 X\naxis 1 Y\n",
            "sensor 0 ACCELEROMETER X\nsensor 0 GYROSCOPE Y\n",
            "requires_kernel_config CONFIG_A\nrequires_kernel_config CONFIG_A\n",
        ];
        for source in cases {
            let err = parse_str(source).unwrap_err();
            assert!(err.is_duplicate(), "{source:?} gave {err}");
            assert_eq!(err.line(), 2, "{source:?}");
        }
    }

    #[test]
    fn first_error_wins() {
        let err = parse_str("key 30 A\nbogus\nkey 30 B\n").unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn error_location_uses_filename() {
        let err = parse_str("\n\nkey 30 A\nkey 30 A\n").unwrap_err();
        assert_eq!(err.location.filename, "test.kl");
        assert_eq!(
            err.to_string(),
            "test.kl:4: Duplicate entry for key scan code '30'."
        );
    }

    #[test]
    fn comment_only_file_is_empty_layout() {
        let map = parse_str("# nothing here\n\n   \t\n# still nothing").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn last_line_without_newline() {
        let map = parse_str("key 30 A\nkey 31 B").unwrap();
        assert_eq!(map.map_key(31, 0).unwrap().key_code, FixedLabels::B);
    }

    #[test]
    fn crlf_line_endings() {
        let map = parse_str("key 30 A\r\nled 1 CAPS_LOCK\r\n").unwrap();
        assert!(map.map_key(30, 0).is_some());
        assert_eq!(map.find_scan_code_for_led(FixedLabels::LED_CAPS_LOCK), Some(1));
    }

    #[test]
    fn scan_code_zero_is_stored_but_unreachable() {
        let map = parse_str("key 0 A\n").unwrap();
        assert_eq!(map.keys_by_scan_code().count(), 1);
        assert_eq!(map.map_key(0, 0), None);
    }
}
