//! Record-level encode and decode.
//!
//! Drives a [`Row`] record through its layout and the value converter,
//! enforcing the `required`, `default` and `omitempty` tag semantics.

use crate::error::{Error, RowResult};
use crate::lexer::parse_row_literal;
use crate::tag::Row;
use crate::writer::build;

/// Decode a row literal into a record.
///
/// Tokens are matched to fields by 1-based position. Positions without a
/// field are skipped; empty tokens on fields with a `default` take the
/// default; fields beyond the token count take their default when they have
/// one. A `required` field that ends up unset fails with a validation error
/// naming the first such field.
///
/// # Example
///
/// ```
/// use pgcraft_derive::Row;
///
/// #[derive(Debug, Default, PartialEq, Row)]
/// struct Address {
///     #[row(1)]
///     street: String,
///     #[row(2)]
///     city: String,
///     #[row(3)]
///     zip_code: i64,
/// }
///
/// let addr: Address = pgcraft_row::from_str(r#"("123 Main St","Springfield",12345)"#)?;
/// assert_eq!(addr.street, "123 Main St");
/// assert_eq!(addr.zip_code, 12345);
/// # Ok::<(), pgcraft_row::Error>(())
/// ```
pub fn from_str<T: Row>(data: &str) -> RowResult<T> {
    let tokens = parse_row_literal(data)?;
    decode_tokens(&tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>())
}

/// Like [`from_str`], but fails when the row carries more values than the
/// record's highest tagged position.
pub fn from_str_strict<T: Row>(data: &str) -> RowResult<T> {
    let tokens = parse_row_literal(data)?;
    let layout = T::row_layout()?;
    if tokens.len() > layout.max_position() {
        return Err(Error::validation(
            "",
            "",
            "row has more values than struct has tagged fields",
        ));
    }
    decode_tokens(&tokens.iter().map(|t| t.value.as_str()).collect::<Vec<_>>())
}

fn decode_tokens<T: Row>(values: &[&str]) -> RowResult<T> {
    let layout = T::row_layout()?;
    let mut record = T::default();

    // Required positions not yet satisfied, ordered so the first missing
    // field reported is deterministic.
    let mut missing: Vec<(usize, &'static str)> = layout
        .iter()
        .filter(|(_, f)| f.options.required)
        .map(|(p, f)| (p, f.def.name))
        .collect();

    for (i, value) in values.iter().enumerate() {
        let position = i + 1;
        let Some(field) = layout.get(position) else {
            continue;
        };
        missing.retain(|(p, _)| *p != position);

        let value = match (&field.options.default, value.is_empty()) {
            (Some(default), true) => default.as_str(),
            _ => value,
        };
        (field.def.decode)(&mut record, value)
            .map_err(|e| e.with_field(field.def.name, position))?;
    }

    // Defaults for fields beyond the token count.
    for (position, field) in layout.iter() {
        if position <= values.len() {
            continue;
        }
        if let Some(default) = &field.options.default {
            (field.def.decode)(&mut record, default)
                .map_err(|e| e.with_field(field.def.name, position))?;
            missing.retain(|(p, _)| *p != position);
        }
    }

    if let Some((position, name)) = missing.first() {
        return Err(Error::validation(
            *name,
            "",
            format!("required field at position {position} is missing"),
        ));
    }

    Ok(record)
}

/// Options for [`to_string_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// Encode zero-valued fields even when they carry `omitempty`.
    pub include_empty: bool,
    /// Emit `""` for every position without a field, up to the maximum.
    pub fill_gaps: bool,
}

/// Encode a record as a row literal.
///
/// Fields are walked in ascending position order. A zero-valued field with
/// `omitempty` is skipped; sparse gaps between emitted positions are padded
/// with `""` so positional alignment survives on the receiving side. A
/// record with no tagged fields encodes as `()`.
pub fn to_string<T: Row>(record: &T) -> RowResult<String> {
    let layout = T::row_layout()?;
    if layout.is_empty() {
        return Ok("()".to_owned());
    }

    let mut values: Vec<String> = Vec::with_capacity(layout.len());
    let mut last_included = 0usize;

    for (position, field) in layout.iter() {
        if field.options.omit_empty && (field.def.is_zero)(record) {
            continue;
        }

        for gap in last_included + 1..position {
            // A position occupied by an omitted field produces no
            // placeholder; a genuinely vacant position does.
            if let Some(skipped) = layout.get(gap) {
                if skipped.options.omit_empty && (skipped.def.is_zero)(record) {
                    continue;
                }
            }
            values.push("\"\"".to_owned());
        }

        let encoded = (field.def.encode)(record).map_err(|e| match e {
            Error::Encode { reason, .. } => Error::Encode {
                field: field.def.name.to_owned(),
                position,
                reason,
            },
            other => Error::Encode {
                field: field.def.name.to_owned(),
                position,
                reason: other.to_string(),
            },
        })?;
        values.push(encoded);
        last_included = position;
    }

    Ok(build(&values))
}

/// Encode a record with explicit control over `omitempty` and gap filling.
pub fn to_string_with<T: Row>(record: &T, opts: EncodeOptions) -> RowResult<String> {
    let layout = T::row_layout()?;
    if layout.is_empty() {
        return Ok("()".to_owned());
    }

    let mut values: Vec<String> = Vec::new();
    for position in 1..=layout.max_position() {
        let Some(field) = layout.get(position) else {
            if opts.fill_gaps {
                values.push("\"\"".to_owned());
            }
            continue;
        };

        if !opts.include_empty && field.options.omit_empty && (field.def.is_zero)(record) {
            if opts.fill_gaps {
                values.push("\"\"".to_owned());
            }
            continue;
        }

        let encoded = (field.def.encode)(record).map_err(|e| Error::Encode {
            field: field.def.name.to_owned(),
            position,
            reason: e.to_string(),
        })?;
        values.push(encoded);
    }

    Ok(build(&values))
}

/// Whether the input is a well-formed row literal.
pub fn is_valid(data: &str) -> bool {
    parse_row_literal(data).is_ok()
}

/// The number of tokens in a row literal, or `None` when it does not parse.
pub fn token_count(data: &str) -> Option<usize> {
    parse_row_literal(data).ok().map(|tokens| tokens.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{FieldDef, Layout};
    use crate::value::{FromRowText, ToRowText};

    // A hand-written Row impl; the derive is exercised in the integration
    // tests where the crate can be referenced by name.
    #[derive(Debug, Default, PartialEq)]
    struct Address {
        street: String,
        city: String,
        zip_code: i64,
    }

    static ADDRESS_FIELDS: &[FieldDef<Address>] = &[
        FieldDef {
            name: "street",
            tag: "1",
            decode: |r, s| {
                r.street = FromRowText::from_row_text(s)?;
                Ok(())
            },
            encode: |r| r.street.to_row_text(),
            is_zero: |r| r.street.is_zero(),
        },
        FieldDef {
            name: "city",
            tag: "2,omitempty",
            decode: |r, s| {
                r.city = FromRowText::from_row_text(s)?;
                Ok(())
            },
            encode: |r| r.city.to_row_text(),
            is_zero: |r| r.city.is_zero(),
        },
        FieldDef {
            name: "zip_code",
            tag: "3,omitempty",
            decode: |r, s| {
                r.zip_code = FromRowText::from_row_text(s)?;
                Ok(())
            },
            encode: |r| r.zip_code.to_row_text(),
            is_zero: |r| r.zip_code.is_zero(),
        },
    ];

    impl Row for Address {
        fn row_fields() -> &'static [FieldDef<Self>] {
            ADDRESS_FIELDS
        }

        fn row_layout() -> crate::RowResult<&'static Layout<Self>> {
            static LAYOUT: std::sync::OnceLock<crate::RowResult<Layout<Address>>> =
                std::sync::OnceLock::new();
            match LAYOUT.get_or_init(|| Layout::build(Address::row_fields())) {
                Ok(layout) => Ok(layout),
                Err(e) => Err(e.clone()),
            }
        }
    }

    #[test]
    fn test_decode_simple() {
        let addr: Address = from_str(r#"("123 Main St","Springfield",12345)"#).unwrap();
        assert_eq!(
            addr,
            Address {
                street: "123 Main St".into(),
                city: "Springfield".into(),
                zip_code: 12345,
            }
        );
    }

    #[test]
    fn test_encode_omitempty_tail() {
        let addr = Address {
            street: "A \"B\"".into(),
            city: String::new(),
            zip_code: 0,
        };
        assert_eq!(to_string(&addr).unwrap(), r#"("A \"B\"")"#);
    }

    #[test]
    fn test_encode_include_empty() {
        let addr = Address {
            street: "A".into(),
            city: String::new(),
            zip_code: 0,
        };
        let out = to_string_with(&addr, EncodeOptions { include_empty: true, fill_gaps: false }).unwrap();
        assert_eq!(out, r#"("A","",0)"#);
    }

    #[test]
    fn test_extra_tokens_ignored_by_default() {
        let addr: Address = from_str(r#"(a,b,3,extra)"#).unwrap();
        assert_eq!(addr.zip_code, 3);
    }

    #[test]
    fn test_strict_rejects_extra_tokens() {
        let err = from_str_strict::<Address>(r#"(a,b,3,extra)"#).unwrap_err();
        match err {
            Error::Validation { message, .. } => {
                assert!(message.contains("more values"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_and_token_count() {
        assert!(is_valid("(a,b)"));
        assert!(!is_valid("a,b"));
        assert_eq!(token_count("(a,b,c)"), Some(3));
        assert_eq!(token_count("oops"), None);
    }
}
