//! Array helpers over slices. Every function returns a new `Vec`; inputs are
//! never modified.

use serde_json::Value;

/// Values that can be falsy: `false`, `0`, `NaN`, `""`, `null` and `None`.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! int_truthy {
    ($($ty:ty),*) => {
        $(impl Truthy for $ty {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

int_truthy!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n.is_truthy()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

/// A single item or a list of items, as accepted by [`concat`] and [`flatten`].
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            OneOrMany::One(item) => vec![item].into_iter(),
            OneOrMany::Many(items) => items.into_iter(),
        }
    }
}

/// Copy of `items` with every falsy element removed.
pub fn compact<T: Truthy + Clone>(items: &[T]) -> Vec<T> {
    items.iter().filter(|item| item.is_truthy()).cloned().collect()
}

/// Concatenate items and lists of items into one list.
pub fn concat<T: Clone>(parts: &[OneOrMany<T>]) -> Vec<T> {
    let mut result = Vec::new();
    for part in parts {
        match part {
            OneOrMany::One(item) => result.push(item.clone()),
            OneOrMany::Many(items) => result.extend(items.iter().cloned()),
        }
    }
    result
}

/// Flatten one level deep.
pub fn flatten<T>(items: Vec<OneOrMany<T>>) -> Vec<T> {
    items.into_iter().flatten().collect()
}

/// Keep the first occurrence of every element.
pub fn uniq<T: PartialEq + Clone>(items: &[T]) -> Vec<T> {
    let mut result: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !result.contains(item) {
            result.push(item.clone());
        }
    }
    result
}

/// Elements of `items` that are not in `remove`.
pub fn without<T: PartialEq + Clone>(items: &[T], remove: &[T]) -> Vec<T> {
    items
        .iter()
        .filter(|item| !contains(remove, item))
        .cloned()
        .collect()
}

pub fn contains<T: PartialEq>(items: &[T], item: &T) -> bool {
    items.iter().any(|candidate| candidate == item)
}

/// Symmetric difference; elements of `first` come first.
pub fn difference<T: PartialEq + Clone>(first: &[T], second: &[T]) -> Vec<T> {
    let mut result = without(first, second);
    result.extend(without(second, first));
    result
}

/// Remove the elements of `to_toggle` found in `existing` and add the others.
pub fn toggle<T: PartialEq + Clone>(existing: &[T], to_toggle: &[T]) -> Vec<T> {
    let mut result = without(existing, to_toggle);
    result.extend(without(to_toggle, existing));
    result
}
