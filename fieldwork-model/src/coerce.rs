//! Built-in scalar adapters.
//!
//! Each function is a pure `fn(&Value) -> Result<Value, String>`: the `Err`
//! string is the rejection reason, and the field layer attaches the path
//! and the offending value. All of them are idempotent on their own output.

use crate::Value;
use fieldwork_types::{ByteString, Timestamp};
use regex_lite::Regex;
use std::sync::LazyLock;

type Coerced = Result<Value, String>;

// 2^63 is exactly representable; every integral f64 below it fits an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

static SLUG_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("slug strip pattern is valid"));
static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("slug separator pattern is valid"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").expect("email pattern is valid")
});

pub(crate) fn integer(raw: &Value) -> Coerced {
    match raw {
        Value::Integer(_) => Ok(raw.clone()),
        Value::Float(f) => integral(*f).map(Value::Integer),
        Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::Integer(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) => integral(f).map(Value::Integer),
                Err(_) => Err(format!("{s:?} is not an integer")),
            }
        }
        other => Err(format!("{} is not an integer", other.type_name())),
    }
}

fn integral(f: f64) -> Result<i64, String> {
    if f.is_finite() && f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
        Ok(f as i64)
    } else {
        Err(format!("{f} has no exact integer value"))
    }
}

pub(crate) fn float(raw: &Value) -> Coerced {
    match raw {
        Value::Float(f) if f.is_finite() => Ok(raw.clone()),
        Value::Float(f) => Err(format!("{f} is not finite")),
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        Value::Text(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(format!("{s:?} is not a finite number")),
        },
        other => Err(format!("{} is not a number", other.type_name())),
    }
}

/// Numbers must be exactly `0` or `1`. The `yes`/`no`/`on`/`off` and
/// `"1"`/`"0"` text forms are accepted as an extension.
pub(crate) fn boolean(raw: &Value) -> Coerced {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::Integer(0) => Ok(Value::Bool(false)),
        Value::Integer(1) => Ok(Value::Bool(true)),
        Value::Float(f) if *f == 0.0 => Ok(Value::Bool(false)),
        Value::Float(f) if *f == 1.0 => Ok(Value::Bool(true)),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("{s:?} is not a boolean")),
        },
        Value::Integer(_) | Value::Float(_) => Err("only 0 and 1 convert to a boolean".into()),
        other => Err(format!("{} is not a boolean", other.type_name())),
    }
}

pub(crate) fn text(raw: &Value) -> Coerced {
    let text = match raw {
        Value::Text(_) => return Ok(raw.clone()),
        Value::Null => return Err("null has no text form".into()),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 => format!("{f:.1}"),
        Value::Float(f) => f.to_string(),
        Value::Bytes(b) => b.to_base64(),
        Value::Timestamp(ts) => ts.to_iso8601(),
        Value::List(_) | Value::Map(_) | Value::Entity(_) => raw.to_json().to_string(),
    };
    Ok(Value::Text(text))
}

pub(crate) fn slug(raw: &Value) -> Coerced {
    let Value::Text(text) = self::text(raw)? else {
        return Err("slug source has no text form".into());
    };
    Ok(Value::Text(slugify(&text)))
}

fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_owned()
}

pub(crate) fn bytes(raw: &Value) -> Coerced {
    match raw {
        Value::Bytes(_) => Ok(raw.clone()),
        Value::Text(s) => ByteString::from_base64(s)
            .map(Value::Bytes)
            .map_err(|e| e.to_string()),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Integer(i) => {
                    u8::try_from(*i).map_err(|_| format!("{i} is outside the byte range 0-255"))
                }
                other => Err(format!("{} is not a byte", other.type_name())),
            })
            .collect::<Result<Vec<u8>, String>>()
            .map(Value::from),
        other => Err(format!("{} is not a byte sequence", other.type_name())),
    }
}

pub(crate) fn timestamp(raw: &Value) -> Coerced {
    let parsed = match raw {
        Value::Timestamp(ts) => Timestamp::try_from_datetime(*ts.as_datetime()),
        Value::Text(s) => Timestamp::parse(s),
        Value::Integer(secs) => Timestamp::from_epoch_seconds(*secs),
        Value::Float(secs) => Timestamp::from_epoch_f64(*secs),
        other => return Err(format!("{} is not a timestamp", other.type_name())),
    };
    parsed.map(Value::Timestamp).map_err(|e| e.to_string())
}

/// The empty string is a legitimate "no URL" value and is kept as-is.
pub(crate) fn url(raw: &Value) -> Coerced {
    match raw {
        Value::Text(s) if s.is_empty() => Ok(raw.clone()),
        Value::Text(s) => url::Url::parse(s)
            .map(|_| raw.clone())
            .map_err(|e| format!("{s:?} is not a valid URL: {e}")),
        other => Err(format!("{} is not a URL", other.type_name())),
    }
}

pub(crate) fn email(raw: &Value) -> Coerced {
    match raw {
        Value::Text(s) if EMAIL.is_match(s) => Ok(raw.clone()),
        Value::Text(s) => Err(format!("{s:?} is not an email address")),
        other => Err(format!("{} is not an email address", other.type_name())),
    }
}
