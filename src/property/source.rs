use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use super::{PropertyValue, Scalar};

/// Failure of a property source to answer a lookup
#[derive(Debug, Error)]
pub enum PropertySourceError {
    #[error("property source unavailable: {0}")]
    Unavailable(String),
}

/// Anything a filter can be evaluated against.
///
/// Implementations must look keys up case-insensitively. A lookup only needs
/// to be atomic on its own; no consistency across several lookups is assumed.
pub trait PropertySource {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError>;
}

impl<P: PropertySource + ?Sized> PropertySource for &P {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        (**self).property(key)
    }
}

impl<P: PropertySource + ?Sized> PropertySource for Arc<P> {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        (**self).property(key)
    }
}

impl<P: PropertySource> PropertySource for RwLock<P> {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        let guard = self
            .read()
            .map_err(|e| PropertySourceError::Unavailable(e.to_string()))?;
        let value = guard.property(key)?.map(Cow::into_owned);
        Ok(value.map(Cow::Owned))
    }
}

fn find_ignore_case<'a, I>(entries: I, key: &str) -> Option<&'a PropertyValue>
where
    I: IntoIterator<Item = (&'a String, &'a PropertyValue)>,
{
    let key = key.to_lowercase();
    entries
        .into_iter()
        .find(|(k, _)| k.to_lowercase() == key)
        .map(|(_, v)| v)
}

impl<S: BuildHasher> PropertySource for HashMap<String, PropertyValue, S> {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        let found = self.get(key).or_else(|| find_ignore_case(self, key));
        Ok(found.map(Cow::Borrowed))
    }
}

impl PropertySource for BTreeMap<String, PropertyValue> {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        let found = self.get(key).or_else(|| find_ignore_case(self, key));
        Ok(found.map(Cow::Borrowed))
    }
}

/// Owned property map with case-insensitive keys.
///
/// Keys keep the spelling of their most recent insertion; inserting a key
/// that differs only in case replaces the existing entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, (String, PropertyValue)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let key = key.into();
        self.entries
            .insert(key.to_lowercase(), (key, value.into()))
            .map(|(_, v)| v)
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(&key.to_lowercase()).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(&key.to_lowercase()).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_lowercase())
    }

    pub fn clear(&mut self) {
        self.entries.clear()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with their original key spelling, ordered by folded key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }
}

impl PropertySource for Properties {
    fn property(&self, key: &str) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
        Ok(self.get(key).map(Cow::Borrowed))
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> Extend<(K, V)> for Properties {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde_json::{Map, Value};

    fn json_scalar(v: &Value) -> Option<Scalar> {
        match v {
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Arrays become multi-valued properties holding their scalar elements.
    /// A nested object is present but has no value a comparison can match.
    /// `null` counts as absent.
    fn json_property(v: &Value) -> Option<PropertyValue> {
        match v {
            Value::Array(xs) => Some(PropertyValue::List(
                xs.iter().filter_map(json_scalar).collect(),
            )),
            Value::Object(_) => Some(PropertyValue::List(Vec::new())),
            v => json_scalar(v).map(PropertyValue::Scalar),
        }
    }

    impl PropertySource for Map<String, Value> {
        fn property(
            &self,
            key: &str,
        ) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
            let found = self.get(key).or_else(|| {
                let key = key.to_lowercase();
                self.iter()
                    .find(|(k, _)| k.to_lowercase() == key)
                    .map(|(_, v)| v)
            });
            Ok(found.and_then(json_property).map(Cow::Owned))
        }
    }

    impl PropertySource for Value {
        fn property(
            &self,
            key: &str,
        ) -> Result<Option<Cow<'_, PropertyValue>>, PropertySourceError> {
            match self {
                Value::Object(map) => map.property(key),
                _ => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_fold_key_case() {
        let mut props = Properties::new();
        props.insert("cn", "Babs Jensen");
        assert_eq!(props.get("CN"), Some(&PropertyValue::from("Babs Jensen")));

        let old = props.insert("Cn", "Tim Howes");
        assert_eq!(old, Some(PropertyValue::from("Babs Jensen")));
        assert_eq!(props.len(), 1);
        assert_eq!(props.iter().next().map(|(k, _)| k), Some("Cn"));
    }

    #[test]
    fn test_hash_map_lookup_ignores_case() {
        let mut map = HashMap::new();
        map.insert("Service.TestProperty".to_string(), PropertyValue::from("YES"));
        let found = map.property("service.testproperty").unwrap();
        assert_eq!(found.as_deref(), Some(&PropertyValue::from("YES")));
        assert!(map.property("missing").unwrap().is_none());
    }

    #[test]
    fn test_poisoned_lock_is_an_adapter_failure() {
        let shared = Arc::new(RwLock::new(Properties::new().with("cn", "x")));
        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(
            shared.property("cn"),
            Err(PropertySourceError::Unavailable(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_object_as_source() {
        let v = serde_json::json!({
            "Name": "x",
            "ranking": 3,
            "weight": 0.5,
            "tags": ["a", 1, null],
            "nested": {"a": 1},
            "nothing": null,
        });
        let get = |k: &str| v.property(k).unwrap().map(Cow::into_owned);
        assert_eq!(get("name"), Some(PropertyValue::from("x")));
        assert_eq!(get("RANKING"), Some(PropertyValue::from(3i64)));
        assert_eq!(get("weight"), Some(PropertyValue::from(0.5)));
        assert_eq!(
            get("tags"),
            Some(PropertyValue::List(vec![
                Scalar::Str("a".into()),
                Scalar::Int(1)
            ]))
        );
        assert_eq!(get("nested"), None);
        assert_eq!(get("nothing"), None);
    }
}
