//! # Textual coercions for configuration fields.
//!
//! [`FromConfig`] turns the string a provider (or a declared default) produced into
//! the field's type. Supported out of the box:
//! - `bool`: `true` / `false`, case-insensitive
//! - signed and unsigned integers, `f32` / `f64`
//! - [`Duration`]: human-readable, number plus unit (`750ms`, `2s`, `5m`, `1h 30m`)
//! - `String`, `PathBuf`: passthrough
//! - `Option<T>`: the inner coercion wrapped in `Some`; a key that no provider has
//!   and that declares no default yields `None` instead of a missing-config error

use std::path::PathBuf;
use std::time::Duration;

/// Parses a configuration value from its textual form.
pub trait FromConfig: Sized {
    /// Name of the target type used in parse errors.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Coerces `raw`; the error is a short reason.
    fn from_config(raw: &str) -> Result<Self, String>;

    /// Value for a key that is absent with no default; `None` makes it an error.
    fn missing() -> Option<Self> {
        None
    }
}

impl FromConfig for String {
    fn from_config(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromConfig for PathBuf {
    fn from_config(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

impl FromConfig for bool {
    fn from_config(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err("expected true or false".to_string())
        }
    }
}

impl FromConfig for Duration {
    fn from_config(raw: &str) -> Result<Self, String> {
        humantime::parse_duration(raw.trim()).map_err(|e| e.to_string())
    }
}

impl<T: FromConfig> FromConfig for Option<T> {
    fn type_name() -> &'static str {
        T::type_name()
    }

    fn from_config(raw: &str) -> Result<Self, String> {
        T::from_config(raw).map(Some)
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

macro_rules! from_config_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromConfig for $ty {
                fn from_config(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_config_via_from_str!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
