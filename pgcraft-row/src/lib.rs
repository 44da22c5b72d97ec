//! Row-literal codec for PostgreSQL composite values.
//!
//! Serializes and deserializes records to and from the composite textual
//! form `(v1,"v2",…)`, driven by positional `#[row(…)]` field tags.
//!
//! ```
//! use pgcraft_derive::Row;
//!
//! #[derive(Debug, Default, PartialEq, Row)]
//! struct Address {
//!     #[row(1)]
//!     street: String,
//!     #[row(2, omitempty)]
//!     city: String,
//!     #[row(3, omitempty)]
//!     zip_code: i64,
//! }
//!
//! let addr = Address { street: "123 Main St".into(), city: "Springfield".into(), zip_code: 12345 };
//! let literal = pgcraft_row::to_string(&addr)?;
//! assert_eq!(literal, r#"("123 Main St","Springfield",12345)"#);
//! assert_eq!(pgcraft_row::from_str::<Address>(&literal)?, addr);
//! # Ok::<(), pgcraft_row::Error>(())
//! ```

pub mod error;
pub mod lexer;
pub mod null;
pub mod tag;
pub mod value;
pub mod writer;

mod codec;

pub use codec::{from_str, from_str_strict, is_valid, to_string, to_string_with, token_count, EncodeOptions};
pub use error::{Error, RowResult};
pub use lexer::{parse_row_literal, Token};
pub use null::{
    Null, NullBool, NullByte, NullDate, NullFloat4, NullFloat8, NullInt2, NullInt4, NullInt8,
    NullText, NullTime, NullTimestamp, NullTimestamptz, NullUuid,
};
pub use tag::{parse_tag, FieldDef, Layout, Row, TagOptions};
pub use value::{FromRowText, ToRowText};

// The derive macro shares the trait's name, in separate namespaces.
#[cfg(feature = "derive")]
pub use pgcraft_derive::Row;
