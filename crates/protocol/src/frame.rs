use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::SharedStr;

/// Identity of a frame within one trace.
///
/// Importers pick whatever is stable for their format: a numeric index into
/// a symbol table, or a string such as `"name:file:line"`. Two descriptors
/// with equal keys are the same frame.
///
/// Any JSON integer that fits in an `i64` becomes an `Index`. Other numbers
/// (fractions, out-of-range integers) keep their decimal text as a `Name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum FrameKey {
    Index(i64),
    Name(SharedStr),
}

impl<'de> Deserialize<'de> for FrameKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FrameKeyVisitor;

        impl Visitor<'_> for FrameKeyVisitor {
            type Value = FrameKey;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a number or a string frame key")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FrameKey, E> {
                Ok(FrameKey::Index(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FrameKey, E> {
                Ok(i64::try_from(v).map_or_else(|_| FrameKey::from(v.to_string()), FrameKey::Index))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<FrameKey, E> {
                // Exactly representable integers only; 2^63 itself is out of range.
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Ok(FrameKey::Index(v as i64))
                } else {
                    Ok(FrameKey::from(v.to_string()))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FrameKey, E> {
                Ok(FrameKey::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<FrameKey, E> {
                Ok(FrameKey::from(v))
            }
        }

        deserializer.deserialize_any(FrameKeyVisitor)
    }
}

impl std::fmt::Display for FrameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for FrameKey {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for FrameKey {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<String> for FrameKey {
    fn from(name: String) -> Self {
        Self::Name(name.into())
    }
}

impl From<SharedStr> for FrameKey {
    fn from(name: SharedStr) -> Self {
        Self::Name(name)
    }
}

/// A call-site descriptor as produced by importers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub key: FrameKey,
    /// Function or method name, e.g. `ActiveRecord##to_hash`.
    pub name: SharedStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SharedStr>,
    /// 1-based line in `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-based column in `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

impl FrameInfo {
    /// A descriptor keyed by its own name, with no source location.
    pub fn named(name: impl Into<SharedStr>) -> Self {
        let name = name.into();
        Self {
            key: FrameKey::Name(name.clone()),
            name,
            file: None,
            line: None,
            col: None,
        }
    }

    pub fn with_location(
        mut self,
        file: impl Into<SharedStr>,
        line: Option<u32>,
        col: Option<u32>,
    ) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.col = col;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_deserializes_numbers_and_strings() {
        let keys: Vec<FrameKey> = serde_json::from_str(r#"[3, "main"]"#).unwrap();
        assert_eq!(keys, vec![FrameKey::Index(3), FrameKey::from("main")]);
    }

    #[test]
    fn key_accepts_any_json_number() {
        let keys: Vec<FrameKey> =
            serde_json::from_str(r#"[-1, 2.5, 3.0, 18446744073709551615]"#).unwrap();
        assert_eq!(
            keys,
            vec![
                FrameKey::Index(-1),
                FrameKey::from("2.5"),
                FrameKey::Index(3),
                FrameKey::from("18446744073709551615"),
            ]
        );

        let info: FrameInfo = serde_json::from_str(r#"{"key":-1,"name":"neg"}"#).unwrap();
        assert_eq!(info.key, FrameKey::Index(-1));
        assert_eq!(serde_json::to_string(&info).unwrap(), r#"{"key":-1,"name":"neg"}"#);
    }

    #[test]
    fn optional_location_is_omitted() {
        let json = serde_json::to_string(&FrameInfo::named("main")).unwrap();
        assert_eq!(json, r#"{"key":"main","name":"main"}"#);

        let info = FrameInfo::named("f").with_location("f.rs", Some(10), None);
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"key":"f","name":"f","file":"f.rs","line":10}"#);
    }

    #[test]
    fn key_display() {
        assert_eq!(FrameKey::Index(7).to_string(), "#7");
        assert_eq!(FrameKey::from("a").to_string(), "a");
    }
}
