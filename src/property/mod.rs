mod source;

pub use source::{Properties, PropertySource, PropertySourceError};

use std::fmt::{self, Display};

/// A single property value as seen by the evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Numeric view of this scalar, parsing strings on a best-effort basis
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::Int(i) => Some(Number::Int(*i)),
            Scalar::Float(f) => Some(Number::Float(*f)),
            Scalar::Str(s) => Number::parse(s),
            Scalar::Bool(_) => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{s}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A property: either one scalar or an ordered, multi-valued list of scalars
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl PropertyValue {
    /// Iterate over every scalar held by this property, in order
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> {
        match self {
            PropertyValue::Scalar(s) => std::slice::from_ref(s).iter(),
            PropertyValue::List(xs) => xs.iter(),
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, PropertyValue::List(_))
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(s) => write!(f, "{s}"),
            PropertyValue::List(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! scalar_from {
    ($($t:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                fn from(x: $t) -> Self {
                    Scalar::$variant(<$conv>::from(x))
                }
            }

            impl From<$t> for PropertyValue {
                fn from(x: $t) -> Self {
                    PropertyValue::Scalar(Scalar::from(x))
                }
            }
        )*
    };
}

scalar_from! {
    String => Str as String,
    &str => Str as String,
    i64 => Int as i64,
    i32 => Int as i64,
    u32 => Int as i64,
    i16 => Int as i64,
    u16 => Int as i64,
    f64 => Float as f64,
    f32 => Float as f64,
    bool => Bool as bool,
}

impl From<Scalar> for PropertyValue {
    fn from(s: Scalar) -> Self {
        PropertyValue::Scalar(s)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for PropertyValue {
    fn from(xs: Vec<T>) -> Self {
        PropertyValue::List(xs.into_iter().map(Into::into).collect())
    }
}

/// Best-effort number used by `<=` and `>=`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Some(Number::Int(i));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Number::Float(f)),
            _ => None,
        }
    }

    pub(crate) fn partial_cmp(self, other: Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_number_parse() {
        assert_eq!(Number::parse("10"), Some(Number::Int(10)));
        assert_eq!(Number::parse(" -3 "), Some(Number::Int(-3)));
        assert_eq!(Number::parse("4.1"), Some(Number::Float(4.1)));
        assert_eq!(Number::parse("ten"), None);
        assert_eq!(Number::parse("inf"), None);
    }

    #[test]
    fn test_mixed_number_ordering() {
        assert_eq!(
            Number::Int(9).partial_cmp(Number::Float(9.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::Int(10).partial_cmp(Number::Int(10)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_scalars_iterates_lists_in_order() {
        let v = PropertyValue::from(vec!["Babs Jensen", "1"]);
        let xs: Vec<String> = v.scalars().map(ToString::to_string).collect();
        assert_eq!(xs, vec!["Babs Jensen", "1"]);
        assert!(v.is_multi_valued());
        assert_eq!(v.to_string(), "[Babs Jensen, 1]");
    }
}
