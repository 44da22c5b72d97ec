//! Positional field tags and per-type field layouts.
//!
//! A field tag has the form `position[,option…]` where the position is a
//! 1-based integer and the recognized options are `omitempty`, `required`
//! and `default=<literal>`. `#[derive(Row)]` collects the tags of a record
//! type into a static field table; [`Layout::build`] parses and validates
//! them once per type.

use std::collections::BTreeMap;

use crate::error::{Error, RowResult};

/// Parsed options from a field tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagOptions {
    /// The 1-indexed position in the row.
    pub position: usize,
    /// Omit the field during encode when it holds its zero value.
    pub omit_empty: bool,
    /// Fail decode when the field is missing from the input.
    pub required: bool,
    /// Default literal applied when the token is empty or absent.
    pub default: Option<String>,
}

/// Parse a field tag value.
///
/// Examples: `"1"`, `"2,omitempty"`, `"3,required"`, `"4,default=0.0"`.
pub fn parse_tag(tag: &str) -> RowResult<TagOptions> {
    let mut opts = TagOptions::default();

    if tag.is_empty() || tag == "-" {
        return Ok(opts);
    }

    let parts = split_tag_parts(tag);
    let Some(first) = parts.first() else {
        return Err(Error::validation("", tag, "empty tag value"));
    };

    let position: usize = first
        .trim()
        .parse()
        .map_err(|_| Error::validation("", tag, "position must be a positive integer"))?;
    if position < 1 {
        return Err(Error::validation("", tag, "position must be >= 1 (1-indexed)"));
    }
    opts.position = position;

    for part in &parts[1..] {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            match key.trim() {
                "default" => opts.default = Some(value.trim().to_owned()),
                other => {
                    return Err(Error::validation(
                        "",
                        tag,
                        format!("unknown option: {other}"),
                    ))
                }
            }
        } else {
            match part {
                "omitempty" => opts.omit_empty = true,
                "required" => opts.required = true,
                other => {
                    return Err(Error::validation(
                        "",
                        tag,
                        format!("unknown option: {other}"),
                    ))
                }
            }
        }
    }

    if opts.required && opts.omit_empty {
        return Err(Error::validation(
            "",
            tag,
            "conflicting options: required and omitempty",
        ));
    }
    if opts.required && opts.default.is_some() {
        return Err(Error::validation(
            "",
            tag,
            "conflicting options: required and default",
        ));
    }

    Ok(opts)
}

/// Split a tag on commas, respecting quoted and backslash-escaped sections
/// so that default literals may contain commas.
fn split_tag_parts(tag: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;

    for ch in tag.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                current.push(ch);
            }
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            ',' if !in_quote => {
                parts.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Static per-field entry of a record's field table, produced by
/// `#[derive(Row)]`.
///
/// The decode/encode/is-zero hooks are plain function pointers generated for
/// the concrete field type, so the codec never inspects types at runtime.
pub struct FieldDef<T: ?Sized> {
    /// Field name, used in error messages.
    pub name: &'static str,
    /// The raw tag text, parsed by [`Layout::build`].
    pub tag: &'static str,
    /// Decode a token value into the field.
    pub decode: fn(&mut T, &str) -> RowResult<()>,
    /// Encode the field into its row-literal element form.
    pub encode: fn(&T) -> RowResult<String>,
    /// Whether the field currently holds its zero value.
    pub is_zero: fn(&T) -> bool,
}

impl<T: ?Sized> std::fmt::Debug for FieldDef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// A field table entry bound to its parsed tag options.
pub struct BoundField<T: 'static> {
    pub def: &'static FieldDef<T>,
    pub options: TagOptions,
}

impl<T: 'static> std::fmt::Debug for BoundField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundField")
            .field("def", &self.def)
            .field("options", &self.options)
            .finish()
    }
}

/// Position-indexed field layout for a record type.
///
/// Positions are unique and ≥ 1 but may be sparse. Built on first use and
/// cached per type behind a `OnceLock` inside the derived impl; rebuilding
/// is observationally equivalent, the cache is only a shortcut.
pub struct Layout<T: 'static> {
    fields: BTreeMap<usize, BoundField<T>>,
    max_position: usize,
}

impl<T: 'static> std::fmt::Debug for Layout<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("fields", &self.fields)
            .field("max_position", &self.max_position)
            .finish()
    }
}

impl<T: 'static> Layout<T> {
    /// Parse and validate a static field table into a layout.
    pub fn build(defs: &'static [FieldDef<T>]) -> RowResult<Self> {
        let mut fields: BTreeMap<usize, BoundField<T>> = BTreeMap::new();
        let mut max_position = 0;

        for def in defs {
            if def.tag.is_empty() || def.tag == "-" {
                continue;
            }
            let options = parse_tag(def.tag).map_err(|e| e.with_field(def.name, 0))?;
            let position = options.position;
            if let Some(existing) = fields.get(&position) {
                return Err(Error::validation(
                    def.name,
                    def.tag,
                    format!(
                        "duplicate position {position} (also used by field {})",
                        existing.def.name
                    ),
                ));
            }
            max_position = max_position.max(position);
            fields.insert(position, BoundField { def, options });
        }

        Ok(Self {
            fields,
            max_position,
        })
    }

    /// Look up the field mapped to a 1-based position.
    pub fn get(&self, position: usize) -> Option<&BoundField<T>> {
        self.fields.get(&position)
    }

    /// Iterate fields in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BoundField<T>)> {
        self.fields.iter().map(|(p, f)| (*p, f))
    }

    /// The highest declared position, or 0 for an empty layout.
    pub fn max_position(&self) -> usize {
        self.max_position
    }

    /// Number of tagged fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the layout has no tagged fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A record type that can pass through the row codec.
///
/// Implemented by `#[derive(Row)]`, which generates the static field table
/// and a cached layout accessor. The derive requires `Default` (decode
/// starts from a zero record) and `PartialEq` (zero-value detection of
/// nested composites).
pub trait Row: Default + 'static {
    /// The static field table for this type.
    fn row_fields() -> &'static [FieldDef<Self>];

    /// The parsed, cached layout for this type.
    fn row_layout() -> RowResult<&'static Layout<Self>>;
}
