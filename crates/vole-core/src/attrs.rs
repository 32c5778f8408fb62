use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Ints(Vec<i64>),
    Float(f64),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Ints(v) => write!(f, "{:?}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Named attributes of one operator call, e.g. `axis = -1`.
///
/// The same type carries both the raw user attributes and the normalized
/// copy the normalizer returns; only the normalized copy travels past the
/// normalizer. `name` is not an attribute of the computation: graph mode
/// uses it to name the produced values, eager mode ignores it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
    name: Option<String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style integer attribute.
    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.values.insert(key.to_string(), AttrValue::Int(value));
        self
    }

    pub fn ints(mut self, key: &str, value: Vec<i64>) -> Self {
        self.values.insert(key.to_string(), AttrValue::Ints(value));
        self
    }

    pub fn float(mut self, key: &str, value: f64) -> Self {
        self.values.insert(key.to_string(), AttrValue::Float(value));
        self
    }

    /// Name the values this call produces (graph mode only).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Copy of the computational attributes, with the display name dropped.
    pub fn without_name(&self) -> Self {
        Self {
            values: self.values.clone(),
            name: None,
        }
    }

    pub fn set(&mut self, key: &str, value: AttrValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Integer attribute, `None` when absent, an error when it has another kind.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttrValue::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(Error::AttributeType {
                name: key.to_string(),
                expected: "an integer",
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_int() {
        let a = Attributes::new().int("axis", -2).float("eps", 1e-5);
        assert_eq!(a.get_int("axis").unwrap(), Some(-2));
        assert_eq!(a.get_int("missing").unwrap(), None);
        assert!(matches!(
            a.get_int("eps"),
            Err(Error::AttributeType { .. })
        ));
    }

    #[test]
    fn test_without_name() {
        let a = Attributes::new().int("axis", 0).named("out");
        let b = a.without_name();
        assert_eq!(b.name(), None);
        assert_eq!(b.get_int("axis").unwrap(), Some(0));
    }

    #[test]
    fn test_display_is_sorted() {
        let a = Attributes::new().int("start", 0).int("axis", 1);
        assert_eq!(a.to_string(), "{axis=1, start=0}");
    }
}
