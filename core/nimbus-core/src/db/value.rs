//! 쿼리 파라미터 값
//!
//! 모든 리터럴은 positional placeholder(`?`)로 바인딩되며,
//! SQL 텍스트에 직접 삽입되지 않습니다.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value};
use std::fmt;

/// 쿼리 파라미터 값
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int32(v) => Some(i64::from(*v)),
            ScalarValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(v) => Some(v),
            _ => None,
        }
    }
}

/// 로그 출력용 표현 (실행 SQL에는 절대 사용하지 않음)
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "'{}'", v.replace('\'', "''")),
            ScalarValue::Boolean(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
        }
    }
}

impl ToSql for ScalarValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            ScalarValue::Null => Value::Null,
            ScalarValue::Int32(v) => Value::Integer(i64::from(*v)),
            ScalarValue::Int64(v) => Value::Integer(*v),
            ScalarValue::Float64(v) => Value::Real(*v),
            ScalarValue::Utf8(v) => Value::Text(v.clone()),
            ScalarValue::Boolean(v) => Value::Integer(i64::from(*v)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// 파라미터 변환 트레이트
pub trait IntoParam {
    fn into_scalar(self) -> ScalarValue;
}

impl IntoParam for ScalarValue {
    fn into_scalar(self) -> ScalarValue {
        self
    }
}

impl IntoParam for i16 {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int32(i32::from(self))
    }
}

impl IntoParam for i32 {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int32(self)
    }
}

impl IntoParam for i64 {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Int64(self)
    }
}

impl IntoParam for f64 {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Float64(self)
    }
}

impl IntoParam for &str {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Utf8(self.to_string())
    }
}

impl IntoParam for &String {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Utf8(self.clone())
    }
}

impl IntoParam for String {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Utf8(self)
    }
}

impl IntoParam for bool {
    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Boolean(self)
    }
}

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_scalar(self) -> ScalarValue {
        match self {
            Some(v) => v.into_scalar(),
            None => ScalarValue::Null,
        }
    }
}
