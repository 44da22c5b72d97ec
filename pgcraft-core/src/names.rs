//! Identifier mapping: singularization, snake/camel conversion with
//! initialism preservation, and reserved-word-safe short names.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;

/// Rust keywords, primitive type names and the locals used by generated
/// code. A synthesized identifier matching one of these is unusable.
static RESERVED: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        // keywords
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
        "type", "union", "unsafe", "use", "where", "while",
        // primitive type names
        "bool", "char", "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "str", "u8",
        "u16", "u32", "u64", "u128", "usize",
        // locals used by generated code
        "ctx", "db", "e", "err", "res", "row", "rows", "sqlstr",
    ]
    .into_iter()
    .collect()
});

/// Initialisms preserved all-caps during camel conversion, before any
/// configured additions.
const DEFAULT_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DB", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS",
    "ID", "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP",
    "TLS", "TTL", "UDP", "UI", "UID", "URI", "URL", "UTF8", "UUID", "VM", "XML", "XMPP", "XSRF",
    "XSS",
];

/// Whether an identifier collides with a keyword, builtin type, or a local
/// used by generated code.
pub fn is_reserved(s: &str) -> bool {
    RESERVED.contains(s)
}

/// Name conversion with a per-run initialism table and a memoized short
/// name map, so the same input always yields the same identifier within a
/// run.
pub struct NameMapper {
    initialisms: BTreeSet<String>,
    shorts: RefCell<BTreeMap<String, String>>,
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl NameMapper {
    pub fn new() -> Self {
        Self {
            initialisms: DEFAULT_INITIALISMS.iter().map(|s| s.to_string()).collect(),
            shorts: RefCell::new(BTreeMap::new()),
        }
    }

    /// Register extra initialisms; names are uppercased on the way in.
    pub fn add_initialisms<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim().to_uppercase();
            if !name.is_empty() {
                self.initialisms.insert(name);
            }
        }
    }

    /// Singularize a name. Names containing `_` are split on the last
    /// segment and only the suffix is singularized: `book_tags` becomes
    /// `book_tag`.
    pub fn singularize(&self, s: &str) -> String {
        match s.rfind('_') {
            Some(i) => format!("{}{}", &s[..=i], singular(&s[i + 1..])),
            None => singular(s),
        }
    }

    /// Pluralize a name, for derived query function names.
    pub fn pluralize(&self, s: &str) -> String {
        plural(s)
    }

    /// Convert to snake_case, splitting camel humps and lowering
    /// initialism runs (`BookID` → `book_id`).
    pub fn snake(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut out = String::with_capacity(s.len() + 4);
        for (i, &c) in chars.iter().enumerate() {
            if c == '_' {
                out.push('_');
                continue;
            }
            if c.is_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
                {
                    if !out.ends_with('_') {
                        out.push('_');
                    }
                }
            }
            out.extend(c.to_lowercase());
        }
        out
    }

    /// Convert parts to an exported PascalCase identifier, honoring the
    /// initialism table (`book_id` → `BookID`).
    pub fn camel_export(&self, parts: &[&str]) -> String {
        let joined = parts.join("_");
        let mut out = String::with_capacity(joined.len());
        for word in joined.split(['_', ' ', '.']).filter(|w| !w.is_empty()) {
            out.push_str(&self.export_word(word));
        }
        out
    }

    /// The unexported-first camelCase variant.
    pub fn camel(&self, parts: &[&str]) -> String {
        let exported = self.camel_export(parts);
        let mut chars = exported.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => exported,
        }
    }

    fn export_word(&self, word: &str) -> String {
        let upper = word.to_uppercase();
        if self.initialisms.contains(&upper) {
            return upper;
        }
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.as_str().to_lowercase().chars())
                .collect(),
            None => String::new(),
        }
    }

    /// A deterministic short identifier for a type name: the lowered first
    /// letter, doubled until it no longer collides with a reserved token.
    /// The choice is memoized per identifier for stability.
    pub fn short(&self, type_name: &str) -> String {
        if let Some(existing) = self.shorts.borrow().get(type_name) {
            return existing.clone();
        }
        let mut s: String = type_name
            .chars()
            .next()
            .map(|c| c.to_lowercase().collect())
            .unwrap_or_else(|| "x".to_owned());
        while is_reserved(&s) {
            s = format!("{s}{s}");
        }
        self.shorts
            .borrow_mut()
            .insert(type_name.to_owned(), s.clone());
        s
    }

    /// A safe snake_case field or parameter identifier; reserved words get
    /// the conflict suffix appended.
    pub fn ident(&self, s: &str, conflict: &str) -> String {
        let snake = self.snake(s);
        if is_reserved(&snake) {
            format!("{snake}_{}", conflict.to_lowercase())
        } else {
            snake
        }
    }
}

fn singular(s: &str) -> String {
    let lower = s.to_lowercase();
    if lower.ends_with("ies") && s.len() > 3 {
        return format!("{}y", &s[..s.len() - 3]);
    }
    for suffix in ["ses", "xes", "zes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return s[..s.len() - 2].to_owned();
        }
    }
    // -ss, -us and -is nouns (address, status, basis) are not plurals.
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") || !lower.ends_with('s') {
        return s.to_owned();
    }
    s[..s.len() - 1].to_owned()
}

fn plural(s: &str) -> String {
    let lower = s.to_lowercase();
    if lower.ends_with('y') && s.len() > 1 {
        let before: Vec<char> = s.chars().collect();
        let prev = before[before.len() - 2];
        if !matches!(prev, 'a' | 'e' | 'i' | 'o' | 'u') {
            return format!("{}ies", &s[..s.len() - 1]);
        }
    }
    for suffix in ["s", "x", "z", "ch", "sh"] {
        if lower.ends_with(suffix) {
            return format!("{s}es");
        }
    }
    format!("{s}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize() {
        let n = NameMapper::new();
        assert_eq!(n.singularize("books"), "book");
        assert_eq!(n.singularize("tags"), "tag");
        assert_eq!(n.singularize("book_tags"), "book_tag");
        assert_eq!(n.singularize("categories"), "category");
        assert_eq!(n.singularize("addresses"), "address");
        assert_eq!(n.singularize("status"), "status");
        assert_eq!(n.singularize("data"), "data");
    }

    #[test]
    fn test_pluralize() {
        let n = NameMapper::new();
        assert_eq!(n.pluralize("book"), "books");
        assert_eq!(n.pluralize("category"), "categories");
        assert_eq!(n.pluralize("box"), "boxes");
        assert_eq!(n.pluralize("day"), "days");
    }

    #[test]
    fn test_camel_export() {
        let n = NameMapper::new();
        assert_eq!(n.camel_export(&["books"]), "Books");
        assert_eq!(n.camel_export(&["book_tags"]), "BookTags");
        assert_eq!(n.camel_export(&["book_id"]), "BookID");
        assert_eq!(n.camel_export(&["api_key"]), "APIKey");
        assert_eq!(n.camel_export(&["uuid_val"]), "UUIDVal");
        assert_eq!(n.camel_export(&["process", "status"]), "ProcessStatus");
    }

    #[test]
    fn test_camel() {
        let n = NameMapper::new();
        assert_eq!(n.camel(&["book_id"]), "bookID");
        assert_eq!(n.camel(&["first_name"]), "firstName");
    }

    #[test]
    fn test_custom_initialism() {
        let mut n = NameMapper::new();
        n.add_initialisms(["acme"]);
        assert_eq!(n.camel_export(&["acme_code"]), "ACMECode");
    }

    #[test]
    fn test_snake() {
        let n = NameMapper::new();
        assert_eq!(n.snake("BookTag"), "book_tag");
        assert_eq!(n.snake("BookID"), "book_id");
        assert_eq!(n.snake("APIKey"), "api_key");
        assert_eq!(n.snake("already_snake"), "already_snake");
    }

    #[test]
    fn test_short_doubles_reserved() {
        let n = NameMapper::new();
        assert_eq!(n.short("Author"), "a");
        // 'e' is a generated-code local, so it doubles.
        assert_eq!(n.short("Event"), "ee");
        // Memoized: same answer on re-query.
        assert_eq!(n.short("Event"), "ee");
    }

    #[test]
    fn test_ident_conflict_suffix() {
        let n = NameMapper::new();
        assert_eq!(n.ident("title", "Val"), "title");
        assert_eq!(n.ident("type", "Val"), "type_val");
        assert_eq!(n.ident("Match", "Val"), "match_val");
    }

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved("fn"));
        assert!(is_reserved("sqlstr"));
        assert!(is_reserved("i32"));
        assert!(!is_reserved("author"));
    }
}
