//! Named state arrays.
//!
//! A [`FieldMap`] is the container every process reads state from and
//! returns tendencies in. All arithmetic is element-wise and
//! shape-preserving; mismatched names or lengths are reported as errors
//! instead of silently creating or dropping entries.

use indexmap::IndexMap;
use nalgebra::DVector;

use crate::{CsError, CsResult};

/// One physical variable on its grid. "Shape" is the vector length.
pub type Field = DVector<f64>;

/// Insertion-ordered mapping from variable name to [`Field`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldMap {
    fields: IndexMap<String, Field>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with the same names and shapes as `other`, filled with zeros.
    pub fn zeros_like(other: &FieldMap) -> Self {
        other
            .fields
            .iter()
            .map(|(name, f)| (name.clone(), Field::zeros(f.len())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Like [`get`](Self::get) but a missing name is an error.
    pub fn require(&self, name: &str) -> CsResult<&Field> {
        self.fields.get(name).ok_or_else(|| CsError::UnknownVariable {
            name: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace without any shape check.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Option<Field> {
        self.fields.insert(name.into(), field)
    }

    /// `self[k] += factor * other[k]` for every `k` in `other`.
    ///
    /// Every name in `other` must already exist in `self` with the same
    /// length; the map is left untouched if any entry fails that check.
    pub fn add_scaled(&mut self, other: &FieldMap, factor: f64) -> CsResult<()> {
        self.check_covers(other)?;
        for (name, delta) in &other.fields {
            if let Some(target) = self.fields.get_mut(name) {
                target.axpy(factor, delta, 1.0);
            }
        }
        Ok(())
    }

    pub fn add_assign(&mut self, other: &FieldMap) -> CsResult<()> {
        self.add_scaled(other, 1.0)
    }

    pub fn sub_assign(&mut self, other: &FieldMap) -> CsResult<()> {
        self.add_scaled(other, -1.0)
    }

    pub fn scale(&mut self, factor: f64) {
        for f in self.fields.values_mut() {
            *f *= factor;
        }
    }

    /// Checks that every entry of `other` names a variable of `self` with a
    /// matching length.
    pub fn check_covers(&self, other: &FieldMap) -> CsResult<()> {
        for (name, f) in &other.fields {
            let existing = self.require(name)?;
            check_shape(name, existing.len(), f.len())?;
        }
        Ok(())
    }

    /// Largest absolute element-wise difference over `names`, or over every
    /// entry of `self` when `names` is `None`.
    pub fn max_abs_diff(&self, other: &FieldMap, names: Option<&[String]>) -> CsResult<f64> {
        let mut worst: f64 = 0.0;
        let mut visit = |name: &str| -> CsResult<()> {
            let a = self.require(name)?;
            let b = other.require(name)?;
            check_shape(name, a.len(), b.len())?;
            let d = (a - b).amax();
            worst = worst.max(d);
            Ok(())
        };
        match names {
            Some(names) => names.iter().try_for_each(|n| visit(n))?,
            None => self.fields.keys().try_for_each(|n| visit(n))?,
        }
        Ok(worst)
    }
}

fn check_shape(name: &str, expected: usize, actual: usize) -> CsResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CsError::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

impl FromIterator<(String, Field)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a Field);
    type IntoIter = indexmap::map::Iter<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &[f64])]) -> FieldMap {
        entries
            .iter()
            .map(|(n, v)| (n.to_string(), Field::from_column_slice(v)))
            .collect()
    }

    #[test]
    fn zeros_like_keeps_names_and_shapes() {
        let m = map(&[("Ts", &[1.0, 2.0, 3.0]), ("q", &[4.0])]);
        let z = FieldMap::zeros_like(&m);
        assert_eq!(z.names().collect::<Vec<_>>(), vec!["Ts", "q"]);
        assert_eq!(z.get("Ts").unwrap().len(), 3);
        assert_eq!(z.get("q").unwrap()[0], 0.0);
    }

    #[test]
    fn add_scaled_updates_named_entries_only() {
        let mut m = map(&[("Ts", &[1.0, 2.0]), ("q", &[4.0])]);
        let d = map(&[("Ts", &[1.0, 1.0])]);
        m.add_scaled(&d, 10.0).unwrap();
        assert_eq!(m.get("Ts").unwrap().as_slice(), &[11.0, 12.0]);
        assert_eq!(m.get("q").unwrap()[0], 4.0);
    }

    #[test]
    fn add_rejects_unknown_name_without_partial_update() {
        let mut m = map(&[("Ts", &[1.0])]);
        let d = map(&[("Ts", &[1.0]), ("Tatm", &[2.0])]);
        let err = m.add_assign(&d).unwrap_err();
        assert_eq!(
            err,
            CsError::UnknownVariable {
                name: "Tatm".to_string()
            }
        );
        assert_eq!(m.get("Ts").unwrap()[0], 1.0);
    }

    #[test]
    fn add_rejects_shape_mismatch() {
        let mut m = map(&[("Ts", &[1.0, 2.0])]);
        let d = map(&[("Ts", &[1.0])]);
        assert!(matches!(
            m.sub_assign(&d),
            Err(CsError::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn max_abs_diff_over_selected_names() {
        let a = map(&[("Ts", &[1.0, 2.0]), ("q", &[0.0])]);
        let b = map(&[("Ts", &[1.5, 1.0]), ("q", &[10.0])]);
        assert_eq!(a.max_abs_diff(&b, None).unwrap(), 10.0);
        let only_ts = vec!["Ts".to_string()];
        assert_eq!(a.max_abs_diff(&b, Some(&only_ts)).unwrap(), 1.0);
    }
}
