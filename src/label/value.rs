//! Per-type label decoding.
//!
//! Every decodable type implements [`Labeled`]. Scalars parse the single
//! label at their path; containers discover their entries from the label
//! keys beneath their path; structs register their fields with
//! [`labeled_struct!`](crate::labeled_struct).

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use super::duration;
use super::path::{LabelPath, Lookup};
use super::DecodeError;

/// A value that can be read from, and written to, a flat label map.
pub trait Labeled {
    /// True for types stored in a single label value.
    const SCALAR: bool = false;

    /// Overwrite the parts of `self` addressed by labels beneath `path`.
    /// Parts with no label keep their current value.
    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError>;

    /// Write `self` as labels beneath `path` under `prefix`.
    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>);

    /// Parse a single raw label value. Only meaningful for scalars.
    fn parse_scalar(&mut self, key: &str, raw: &str) -> Result<(), DecodeError> {
        Err(DecodeError::new(key, raw, "not a scalar field"))
    }

    /// Render as a single raw label value. Only meaningful for scalars.
    fn scalar_text(&self) -> Option<String> {
        None
    }
}

macro_rules! scalar_impl {
    ($($ty:ty),* $(,)?) => {$(
        impl Labeled for $ty {
            const SCALAR: bool = true;

            fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
                match lookup.value(path) {
                    Some((key, raw)) => self.parse_scalar(&key, raw),
                    None => Ok(()),
                }
            }

            fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
                out.insert(path.qualify(prefix), self.to_string());
            }

            fn parse_scalar(&mut self, key: &str, raw: &str) -> Result<(), DecodeError> {
                *self = raw
                    .trim()
                    .parse::<$ty>()
                    .map_err(|e| DecodeError::new(key, raw, e.to_string()))?;
                Ok(())
            }

            fn scalar_text(&self) -> Option<String> {
                Some(self.to_string())
            }
        }
    )*};
}

scalar_impl!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl Labeled for bool {
    const SCALAR: bool = true;

    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        match lookup.value(path) {
            Some((key, raw)) => self.parse_scalar(&key, raw),
            None => Ok(()),
        }
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        out.insert(path.qualify(prefix), self.to_string());
    }

    fn parse_scalar(&mut self, key: &str, raw: &str) -> Result<(), DecodeError> {
        *self = match raw.trim() {
            "true" => true,
            "false" => false,
            _ => return Err(DecodeError::new(key, raw, "expected \"true\" or \"false\"")),
        };
        Ok(())
    }

    fn scalar_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl Labeled for String {
    const SCALAR: bool = true;

    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        if let Some((_, raw)) = lookup.value(path) {
            *self = raw.to_string();
        }
        Ok(())
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        out.insert(path.qualify(prefix), self.clone());
    }

    fn parse_scalar(&mut self, _key: &str, raw: &str) -> Result<(), DecodeError> {
        *self = raw.to_string();
        Ok(())
    }

    fn scalar_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl Labeled for Duration {
    const SCALAR: bool = true;

    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        match lookup.value(path) {
            Some((key, raw)) => self.parse_scalar(&key, raw),
            None => Ok(()),
        }
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        out.insert(path.qualify(prefix), duration::format(*self));
    }

    fn parse_scalar(&mut self, key: &str, raw: &str) -> Result<(), DecodeError> {
        *self = duration::parse(raw).map_err(|reason| DecodeError::new(key, raw, reason))?;
        Ok(())
    }

    fn scalar_text(&self) -> Option<String> {
        Some(duration::format(*self))
    }
}

/// Allocated only when at least one label exists beneath its path.
impl<T: Labeled + Default> Labeled for Option<T> {
    const SCALAR: bool = T::SCALAR;

    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        let present = if T::SCALAR {
            lookup.value(path).is_some()
        } else {
            lookup.has_subtree(path)
        };
        if !present {
            return Ok(());
        }
        let mut inner = self.take().unwrap_or_default();
        let result = inner.decode(lookup, path);
        *self = Some(inner);
        result
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        if let Some(inner) = self {
            encode_present(inner, prefix, path, out);
        }
    }

    fn parse_scalar(&mut self, key: &str, raw: &str) -> Result<(), DecodeError> {
        let mut inner = T::default();
        inner.parse_scalar(key, raw)?;
        *self = Some(inner);
        Ok(())
    }

    fn scalar_text(&self) -> Option<String> {
        self.as_ref().and_then(Labeled::scalar_text)
    }
}

/// Scalar lists read `a,b,c` from the list's own key; any list reads
/// indexed entries `[0]`, `[1]`, ... in index order, skipping gaps.
impl<T: Labeled + Default> Labeled for Vec<T> {
    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        if T::SCALAR {
            if let Some((key, raw)) = lookup.value(path) {
                let mut items = Vec::new();
                if raw.trim().is_empty() {
                    *self = items;
                    return Ok(());
                }
                for part in raw.split(',') {
                    let mut item = T::default();
                    item.parse_scalar(&key, part.trim())?;
                    items.push(item);
                }
                *self = items;
                return Ok(());
            }
        }

        let indices = lookup.indices(path);
        if indices.is_empty() {
            return Ok(());
        }
        let mut items = Vec::with_capacity(indices.len());
        for i in indices {
            let mut item = T::default();
            item.decode(lookup, &path.index(i))?;
            items.push(item);
        }
        *self = items;
        Ok(())
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        if self.is_empty() {
            return;
        }
        if T::SCALAR {
            let texts: Option<Vec<String>> = self.iter().map(Labeled::scalar_text).collect();
            if let Some(texts) = texts {
                let joinable = texts
                    .iter()
                    .all(|t| !t.contains(',') && t.trim() == t && !t.is_empty());
                if joinable {
                    out.insert(path.qualify(prefix), texts.join(","));
                    return;
                }
            }
        }
        for (i, item) in self.iter().enumerate() {
            encode_present(item, prefix, &path.index(i), out);
        }
    }
}

/// Entries are discovered from the keys beneath the map's path and merged
/// into any entries already present.
impl<T: Labeled + Default> Labeled for BTreeMap<String, T> {
    fn decode(&mut self, lookup: &Lookup<'_>, path: &LabelPath) -> Result<(), DecodeError> {
        for key in lookup.keys(path) {
            let child = path.field(&key);
            self.entry(key).or_default().decode(lookup, &child)?;
        }
        Ok(())
    }

    fn encode(&self, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
        for (key, value) in self {
            encode_present(value, prefix, &path.field(key), out);
        }
    }
}

/// Encode a value that must survive decoding even when it holds nothing
/// but defaults: an empty composite is written as `<path>=true`, which
/// allocates it again on decode.
fn encode_present<T: Labeled>(value: &T, prefix: &str, path: &LabelPath, out: &mut HashMap<String, String>) {
    let mut written = HashMap::new();
    value.encode(prefix, path, &mut written);
    if written.is_empty() && !T::SCALAR {
        out.insert(path.qualify(prefix), "true".to_string());
    } else {
        out.extend(written);
    }
}

/// Implements [`Labeled`] for a struct by listing its fields and the label
/// segment each one is addressed by.
///
/// ```ignore
/// labeled_struct!(Router {
///     rule => "rule",
///     entry_points => "entrypoints",
/// });
/// ```
#[macro_export]
macro_rules! labeled_struct {
    ($ty:ty { $($field:ident => $name:literal),* $(,)? }) => {
        impl $crate::label::Labeled for $ty {
            fn decode(
                &mut self,
                lookup: &$crate::label::Lookup<'_>,
                path: &$crate::label::LabelPath,
            ) -> Result<(), $crate::label::DecodeError> {
                $( $crate::label::Labeled::decode(&mut self.$field, lookup, &path.field($name))?; )*
                Ok(())
            }

            fn encode(
                &self,
                prefix: &str,
                path: &$crate::label::LabelPath,
                out: &mut std::collections::HashMap<String, String>,
            ) {
                $( $crate::label::Labeled::encode(&self.$field, prefix, &path.field($name), out); )*
            }
        }
    };
}
