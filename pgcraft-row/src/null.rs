//! Nullable column wrappers.
//!
//! [`Null<T>`] distinguishes SQL `NULL` from a present value, the way the
//! driver-side nullable types do. In the row-literal encoding an invalid
//! wrapper renders as the bare literal `NULL`, while a valid empty string
//! still renders as `""` — the two are not interchangeable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// A value that may be SQL `NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null<T> {
    /// The wrapped value; meaningful only when `valid` is set.
    pub value: T,
    /// Whether `value` is present (false means SQL NULL).
    pub valid: bool,
}

impl<T> Null<T> {
    /// Wrap a present value.
    pub fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    /// The SQL NULL of this wrapper type.
    pub fn none() -> Self
    where
        T: Default,
    {
        Self::default()
    }

    /// Borrow the value when present.
    pub fn get(&self) -> Option<&T> {
        self.valid.then_some(&self.value)
    }

    /// Convert into an `Option`, consuming the wrapper.
    pub fn into_option(self) -> Option<T> {
        self.valid.then_some(self.value)
    }
}

impl<T> From<Option<T>> for Null<T>
where
    T: Default,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => Self::new(value),
            None => Self::none(),
        }
    }
}

pub type NullBool = Null<bool>;
pub type NullText = Null<String>;
pub type NullInt2 = Null<i16>;
pub type NullInt4 = Null<i32>;
pub type NullInt8 = Null<i64>;
pub type NullByte = Null<u8>;
pub type NullFloat4 = Null<f32>;
pub type NullFloat8 = Null<f64>;
pub type NullDate = Null<NaiveDate>;
pub type NullTime = Null<NaiveTime>;
pub type NullTimestamp = Null<NaiveDateTime>;
pub type NullTimestamptz = Null<DateTime<Utc>>;
pub type NullUuid = Null<Uuid>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let n = NullInt4::new(7);
        assert!(n.valid);
        assert_eq!(n.get(), Some(&7));

        let none = NullInt4::none();
        assert!(!none.valid);
        assert_eq!(none.get(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(NullText::from(Some("x".to_owned())).into_option(), Some("x".to_owned()));
        assert_eq!(NullText::from(None).into_option(), None);
    }
}
