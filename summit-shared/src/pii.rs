use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for personal identifiers (national ID numbers, phone numbers)
/// that hides all but the last four characters in Debug/Display output.
///
/// Serialization is transparent: API responses carry the real value, while
/// `tracing::info!("{:?}", participant)` never leaks it.
#[derive(Clone, Deserialize, PartialEq, Eq, Default)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn redacted(&self) -> String {
        let value = self.0.as_ref();
        let visible: String = value
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let hidden = value.chars().count().saturating_sub(4);
        format!("{}{}", "*".repeat(hidden), visible)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_all_but_tail() {
        let nik = Masked("5201234567890001".to_string());
        assert_eq!(format!("{:?}", nik), "************0001");
        assert_eq!(nik.to_string(), "************0001");
    }

    #[test]
    fn test_short_values_are_left_visible() {
        let short = Masked("123".to_string());
        assert_eq!(format!("{:?}", short), "123");
    }

    #[test]
    fn test_serialize_is_transparent() {
        let nik = Masked("5201234567890001".to_string());
        let json = serde_json::to_string(&nik).unwrap();
        assert_eq!(json, "\"5201234567890001\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "5201234567890001");
    }
}
