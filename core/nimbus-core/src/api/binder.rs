//! Raw wire parameters → typed, validated values

use crate::api::param::{ParamValue, ParameterSpec};
use crate::error::{NimbusError, NimbusResult};
use std::collections::HashMap;
use tracing::debug;

/// Parameters as received on the wire: name → raw string.
pub type RawParams = HashMap<String, String>;

/// Bind `raw` against `schema`.
///
/// - required and absent (or blank) → `MissingParameter`
/// - present but not convertible → `InvalidParameterValue`
/// - optional and absent → the declared default, otherwise unset
/// - names outside the schema are ignored
pub fn bind(schema: &[ParameterSpec], raw: &RawParams) -> NimbusResult<BoundParams> {
    let mut values = HashMap::with_capacity(schema.len());

    for spec in schema {
        let present = raw.get(spec.name).filter(|value| !value.trim().is_empty());
        match present {
            Some(value) => {
                values.insert(spec.name, spec.ty.parse(spec.name, value)?);
            }
            None if spec.required => {
                return Err(NimbusError::MissingParameter(spec.name.to_string()));
            }
            None => {
                if let Some(default) = spec.default {
                    values.insert(spec.name, default.to_value());
                }
            }
        }
    }

    for name in raw.keys() {
        if !schema.iter().any(|spec| spec.name == name.as_str()) {
            debug!(parameter = %name, "ignoring undeclared parameter");
        }
    }

    Ok(BoundParams { values })
}

/// Output of [`bind`]; every value already has its declared type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    values: HashMap<&'static str, ParamValue>,
}

impl BoundParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn long(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_i64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name).and_then(ParamValue::as_str).map(str::to_string)
    }

    pub fn longs(&self, name: &str) -> Option<Vec<i64>> {
        self.get(name)
            .and_then(ParamValue::as_list)
            .map(|items| items.iter().filter_map(ParamValue::as_i64).collect())
    }

    /// Value of a required parameter; absent only if the schema and the
    /// command disagree.
    pub fn require_long(&self, name: &str) -> NimbusResult<i64> {
        self.long(name)
            .ok_or_else(|| NimbusError::MissingParameter(name.to_string()))
    }

    pub fn require_string(&self, name: &str) -> NimbusResult<String> {
        self.string(name)
            .ok_or_else(|| NimbusError::MissingParameter(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::param::{CommandType, ParamDefault};

    const SCHEMA: &[ParameterSpec] = &[
        ParameterSpec::required("zoneid", CommandType::Long, "zone"),
        ParameterSpec::required("url", CommandType::String, "url"),
        ParameterSpec::optional("podid", CommandType::Long, "pod"),
        ParameterSpec::optional("page", CommandType::Integer, "page")
            .with_default(ParamDefault::Integer(1)),
        ParameterSpec::optional("ids", CommandType::List(&CommandType::Long), "ids"),
    ];

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_bind_full() {
        let bound = bind(
            SCHEMA,
            &raw(&[("zoneid", "1"), ("url", "http://h"), ("ids", "4,5"), ("extra", "x")]),
        )
        .unwrap();
        assert_eq!(bound.require_long("zoneid").unwrap(), 1);
        assert_eq!(bound.require_string("url").unwrap(), "http://h");
        assert_eq!(bound.long("podid"), None);
        assert_eq!(bound.long("page"), Some(1));
        assert_eq!(bound.longs("ids"), Some(vec![4, 5]));
        assert!(!bound.contains("extra"));
    }

    #[test]
    fn test_missing_required() {
        let err = bind(SCHEMA, &raw(&[("url", "http://h")])).unwrap_err();
        assert!(matches!(err, NimbusError::MissingParameter(name) if name == "zoneid"));

        // blank counts as absent
        let err = bind(SCHEMA, &raw(&[("zoneid", "1"), ("url", "  ")])).unwrap_err();
        assert!(matches!(err, NimbusError::MissingParameter(name) if name == "url"));
    }

    #[test]
    fn test_invalid_value() {
        let err = bind(SCHEMA, &raw(&[("zoneid", "one"), ("url", "u")])).unwrap_err();
        assert!(matches!(err, NimbusError::InvalidParameterValue { name, .. } if name == "zoneid"));
    }

    #[test]
    fn test_optional_blank_is_unset() {
        let bound = bind(SCHEMA, &raw(&[("zoneid", "1"), ("url", "u"), ("podid", "")])).unwrap();
        assert!(!bound.contains("podid"));
    }
}
