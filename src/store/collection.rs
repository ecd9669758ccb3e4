use serde::{Deserialize, Serialize};

/// A flat, ordered table of records with predicate-based access.
///
/// No validation happens here; referential checks belong to the relation builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    rows: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(rows: Vec<T>) -> Self {
        Self { rows }
    }
}

impl<T> Collection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find<P>(&self, pred: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.iter().filter(|row| pred(row)).collect()
    }

    pub fn find_one<P>(&self, pred: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows.iter().find(|row| pred(row))
    }

    pub fn insert(&mut self, record: T) {
        self.rows.push(record);
    }

    /// Applies `patch` to every matching row. Returns the number of rows touched.
    pub fn update<P, F>(&mut self, pred: P, mut patch: F) -> usize
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut touched = 0;
        for row in self.rows.iter_mut().filter(|row| pred(row)) {
            patch(row);
            touched += 1;
        }
        touched
    }

    /// Replaces the first matching row, or appends `record` when none matches.
    /// Returns true when a row was inserted.
    pub fn upsert<P>(&mut self, pred: P, record: T) -> bool
    where
        P: Fn(&T) -> bool,
    {
        match self.rows.iter_mut().find(|row| pred(row)) {
            Some(row) => {
                *row = record;
                false
            }
            None => {
                self.rows.push(record);
                true
            }
        }
    }

    /// Removes every matching row. Returns the number removed.
    pub fn delete<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&T) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| !pred(row));
        before - self.rows.len()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
