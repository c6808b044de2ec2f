//! Wire parameter schema and coercion

use crate::error::{NimbusError, NimbusResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Wire format of `date` parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Declared wire type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Boolean,
    /// `yyyy-MM-dd`
    Date,
    Float,
    Integer,
    Long,
    Short,
    String,
    /// Comma-separated values of the element type
    List(&'static CommandType),
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandType::Boolean => f.write_str("boolean"),
            CommandType::Date => f.write_str("date"),
            CommandType::Float => f.write_str("float"),
            CommandType::Integer => f.write_str("integer"),
            CommandType::Long => f.write_str("long"),
            CommandType::Short => f.write_str("short"),
            CommandType::String => f.write_str("string"),
            CommandType::List(element) => write!(f, "list of {element}"),
        }
    }
}

impl CommandType {
    /// Convert one raw wire value.
    pub fn parse(&self, name: &str, raw: &str) -> NimbusResult<ParamValue> {
        let invalid = || NimbusError::InvalidParameterValue {
            name: name.to_string(),
            reason: format!("expected {self}, got '{raw}'"),
        };
        let trimmed = raw.trim();

        let value = match self {
            CommandType::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    ParamValue::Boolean(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    ParamValue::Boolean(false)
                } else {
                    return Err(invalid());
                }
            }
            CommandType::Date => ParamValue::Date(
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())?,
            ),
            CommandType::Float => ParamValue::Float(
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(invalid)?,
            ),
            CommandType::Integer => ParamValue::Integer(trimmed.parse().map_err(|_| invalid())?),
            CommandType::Long => ParamValue::Long(trimmed.parse().map_err(|_| invalid())?),
            CommandType::Short => ParamValue::Short(trimmed.parse().map_err(|_| invalid())?),
            CommandType::String => ParamValue::String(raw.to_string()),
            CommandType::List(element) => ParamValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| element.parse(name, item))
                    .collect::<NimbusResult<Vec<_>>>()?,
            ),
        };
        Ok(value)
    }
}

/// A bound, typed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Boolean(bool),
    Date(NaiveDate),
    Float(f64),
    Integer(i32),
    Long(i64),
    Short(i16),
    String(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integral value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Long(v) => Some(*v),
            ParamValue::Integer(v) => Some(i64::from(*v)),
            ParamValue::Short(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParamValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Default applied when an optional parameter is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Str(&'static str),
}

impl ParamDefault {
    pub fn to_value(self) -> ParamValue {
        match self {
            ParamDefault::Boolean(v) => ParamValue::Boolean(v),
            ParamDefault::Integer(v) => ParamValue::Integer(v),
            ParamDefault::Long(v) => ParamValue::Long(v),
            ParamDefault::Str(v) => ParamValue::String(v.to_string()),
        }
    }
}

/// One entry of a command's static parameter schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub ty: CommandType,
    pub required: bool,
    pub default: Option<ParamDefault>,
    pub description: &'static str,
}

impl ParameterSpec {
    pub const fn required(name: &'static str, ty: CommandType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            description,
        }
    }

    pub const fn optional(name: &'static str, ty: CommandType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
            description,
        }
    }

    pub const fn with_default(mut self, default: ParamDefault) -> Self {
        self.default = Some(default);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(
            CommandType::Long.parse("zoneid", " 42 ").unwrap(),
            ParamValue::Long(42)
        );
        assert_eq!(
            CommandType::Boolean.parse("forced", "TRUE").unwrap(),
            ParamValue::Boolean(true)
        );
        assert_eq!(
            CommandType::Short.parse("n", "-3").unwrap(),
            ParamValue::Short(-3)
        );
        assert_eq!(
            CommandType::String.parse("name", " keep spaces ").unwrap(),
            ParamValue::String(" keep spaces ".into())
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for (ty, raw) in [
            (CommandType::Long, "abc"),
            (CommandType::Integer, "99999999999"),
            (CommandType::Short, "70000"),
            (CommandType::Boolean, "yes"),
            (CommandType::Float, "NaN"),
            (CommandType::Date, "2024-02-30"),
        ] {
            let err = ty.parse("p", raw).unwrap_err();
            assert!(
                matches!(err, NimbusError::InvalidParameterValue { ref name, .. } if name == "p"),
                "{ty} accepted '{raw}'"
            );
        }
    }

    #[test]
    fn test_parse_list() {
        static LONGS: CommandType = CommandType::List(&CommandType::Long);
        assert_eq!(
            LONGS.parse("ids", "1, 2,,3").unwrap(),
            ParamValue::List(vec![
                ParamValue::Long(1),
                ParamValue::Long(2),
                ParamValue::Long(3)
            ])
        );
        assert!(LONGS.parse("ids", "1,x").is_err());
    }

    #[test]
    fn test_parse_date() {
        let leap = CommandType::Date.parse("startdate", "2024-02-29").unwrap();
        assert_eq!(leap.as_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(serde_json::to_string(&leap).unwrap(), "\"2024-02-29\"");

        for raw in ["2023-02-29", "2024-13-01", "2024/01/01", "yesterday"] {
            assert!(CommandType::Date.parse("startdate", raw).is_err(), "accepted '{raw}'");
        }
    }
}
