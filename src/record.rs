//! Field descriptor tables for configuration records.
//!
//! A configuration type implements [`Record`] by listing its fields with the
//! [`Fields`] builder. Each entry carries the field identifier, optional tags,
//! and either a mutable handle to a leaf value or the nested record's own
//! table:
//!
//! ```ignore
//! impl Record for ServerConfig {
//!     fn fields(&mut self) -> Fields<'_> {
//!         Fields::new()
//!             .leaf("host", &mut self.host)
//!             .leaf("port", &mut self.port)
//!             .tag("flag", "p port")
//!             .tag("desc", "port to listen on")
//!             .optional("token", &mut self.token)
//!             .nested("tls", &mut self.tls)
//!     }
//! }
//! ```
//!
//! Disjoint field borrows let one table hold a handle to every leaf at once.

use std::any::Any;
use std::fmt::{self, Display};
use std::path::PathBuf;

/// A configuration record whose leaf fields can be enumerated and written.
pub trait Record {
    /// Describe every field, in declaration order.
    fn fields(&mut self) -> Fields<'_>;
}

/// A value type that can live in a leaf field.
///
/// Implemented for the primitive scalars up to 64 bits and `String`; loads
/// pass through JSON numbers, which stop there. Implement it for your own
/// enums to make them bindable:
///
/// ```ignore
/// impl Scalar for Mode {
///     fn parse_flag(raw: &str) -> Result<Self, String> {
///         raw.parse().map_err(|e: ParseModeError| e.to_string())
///     }
/// }
/// ```
pub trait Scalar: Any + Clone + Display {
    /// Parse a flag or environment variable value.
    fn parse_flag(raw: &str) -> Result<Self, String>;

    /// Whether the flag may be given without a value (`--debug`).
    fn is_switch() -> bool {
        false
    }
}

macro_rules! scalar_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                fn parse_flag(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

scalar_from_str!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, String,
);

impl Scalar for bool {
    fn parse_flag(raw: &str) -> Result<Self, String> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(format!("invalid boolean '{raw}'")),
        }
    }

    fn is_switch() -> bool {
        true
    }
}

/// Object-safe handle to one leaf field's storage.
pub trait Leaf {
    /// The current value, for downcasting by [`assign_from`](Leaf::assign_from).
    fn value(&self) -> &dyn Any;
    /// Copy `other`'s value into this field. Returns `false` on a type mismatch.
    fn assign_from(&mut self, other: &dyn Leaf) -> bool;
    /// Parse and store a raw flag value.
    fn set_raw(&mut self, raw: &str) -> Result<(), String>;
    /// Display form of the current value; `None` for an unset optional.
    fn render(&self) -> Option<String>;
    fn is_switch(&self) -> bool;
    fn type_name(&self) -> &'static str;
}

struct ScalarRef<'a, T>(&'a mut T);

impl<T: Scalar> Leaf for ScalarRef<'_, T> {
    fn value(&self) -> &dyn Any {
        &*self.0
    }

    fn assign_from(&mut self, other: &dyn Leaf) -> bool {
        match other.value().downcast_ref::<T>() {
            Some(v) => {
                *self.0 = v.clone();
                true
            }
            None => false,
        }
    }

    fn set_raw(&mut self, raw: &str) -> Result<(), String> {
        *self.0 = T::parse_flag(raw)?;
        Ok(())
    }

    fn render(&self) -> Option<String> {
        Some(self.0.to_string())
    }

    fn is_switch(&self) -> bool {
        T::is_switch()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

struct OptionalRef<'a, T>(&'a mut Option<T>);

impl<T: Scalar> Leaf for OptionalRef<'_, T> {
    fn value(&self) -> &dyn Any {
        &*self.0
    }

    fn assign_from(&mut self, other: &dyn Leaf) -> bool {
        match other.value().downcast_ref::<Option<T>>() {
            Some(v) => {
                *self.0 = v.clone();
                true
            }
            None => false,
        }
    }

    fn set_raw(&mut self, raw: &str) -> Result<(), String> {
        *self.0 = Some(T::parse_flag(raw)?);
        Ok(())
    }

    fn render(&self) -> Option<String> {
        self.0.as_ref().map(|v| v.to_string())
    }

    fn is_switch(&self) -> bool {
        T::is_switch()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Option<T>>()
    }
}

// PathBuf has no Display impl, so it gets its own handle.
struct PathRef<'a>(&'a mut PathBuf);

impl Leaf for PathRef<'_> {
    fn value(&self) -> &dyn Any {
        &*self.0
    }

    fn assign_from(&mut self, other: &dyn Leaf) -> bool {
        match other.value().downcast_ref::<PathBuf>() {
            Some(v) => {
                self.0.clone_from(v);
                true
            }
            None => false,
        }
    }

    fn set_raw(&mut self, raw: &str) -> Result<(), String> {
        *self.0 = PathBuf::from(raw);
        Ok(())
    }

    fn render(&self) -> Option<String> {
        Some(self.0.display().to_string())
    }

    fn is_switch(&self) -> bool {
        false
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<PathBuf>()
    }
}

/// What a field holds.
pub enum FieldKind<'a> {
    Leaf(Box<dyn Leaf + 'a>),
    Nested {
        fields: Fields<'a>,
        /// Embedded records lose their name segment when flattening is on.
        embedded: bool,
    },
}

/// One entry of a record's descriptor table.
pub struct Field<'a> {
    pub ident: &'static str,
    pub tags: Vec<(&'static str, &'static str)>,
    pub kind: FieldKind<'a>,
}

impl Field<'_> {
    /// Value of the tag stored under `key`, if any.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| *value)
    }
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            FieldKind::Leaf(leaf) => leaf.type_name(),
            FieldKind::Nested { .. } => "<nested>",
        };
        f.debug_struct("Field")
            .field("ident", &self.ident)
            .field("tags", &self.tags)
            .field("kind", &kind)
            .finish()
    }
}

/// Builder for a record's descriptor table.
#[derive(Debug, Default)]
pub struct Fields<'a> {
    entries: Vec<Field<'a>>,
}

impl<'a> Fields<'a> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn push(mut self, ident: &'static str, kind: FieldKind<'a>) -> Self {
        self.entries.push(Field {
            ident,
            tags: Vec::new(),
            kind,
        });
        self
    }

    /// A scalar leaf field.
    pub fn leaf<T: Scalar>(self, ident: &'static str, value: &'a mut T) -> Self {
        self.push(ident, FieldKind::Leaf(Box::new(ScalarRef(value))))
    }

    /// An `Option` leaf. Flags set it to `Some`; it renders as unset while `None`.
    pub fn optional<T: Scalar>(self, ident: &'static str, value: &'a mut Option<T>) -> Self {
        self.push(ident, FieldKind::Leaf(Box::new(OptionalRef(value))))
    }

    /// A path leaf.
    pub fn path(self, ident: &'static str, value: &'a mut PathBuf) -> Self {
        self.push(ident, FieldKind::Leaf(Box::new(PathRef(value))))
    }

    /// A nested record; its identifier prefixes every name inside it.
    pub fn nested<R: Record + ?Sized>(self, ident: &'static str, record: &'a mut R) -> Self {
        let fields = record.fields();
        self.push(
            ident,
            FieldKind::Nested {
                fields,
                embedded: false,
            },
        )
    }

    /// A nested record whose prefix is dropped when [`FlagOptions::flatten`](crate::FlagOptions)
    /// is set.
    pub fn embedded<R: Record + ?Sized>(self, ident: &'static str, record: &'a mut R) -> Self {
        let fields = record.fields();
        self.push(
            ident,
            FieldKind::Nested {
                fields,
                embedded: true,
            },
        )
    }

    /// Attach a `key: value` tag to the most recently added field.
    pub fn tag(mut self, key: &'static str, value: &'static str) -> Self {
        if let Some(last) = self.entries.last_mut() {
            last.tags.push((key, value));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for Fields<'a> {
    type Item = Field<'a>;
    type IntoIter = std::vec::IntoIter<Field<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestConfig;

    #[test]
    fn table_lists_fields_in_order() {
        let mut config = TestConfig::default();
        let idents: Vec<&str> = config.fields().into_iter().map(|f| f.ident).collect();
        assert_eq!(idents, vec!["host", "port", "debug", "database"]);
    }

    #[test]
    fn tag_attaches_to_last_field() {
        let mut a = 1i32;
        let mut b = 2i32;
        let fields = Fields::new()
            .leaf("a", &mut a)
            .leaf("b", &mut b)
            .tag("flag", "bee");
        let entries: Vec<Field<'_>> = fields.into_iter().collect();
        assert_eq!(entries[0].tag("flag"), None);
        assert_eq!(entries[1].tag("flag"), Some("bee"));
    }

    #[test]
    fn tag_on_empty_table_is_ignored() {
        let fields = Fields::new().tag("flag", "x");
        assert!(fields.is_empty());
    }

    #[test]
    fn leaf_writes_through_to_storage() {
        let mut port = 80u16;
        {
            let mut entries: Vec<Field<'_>> =
                Fields::new().leaf("port", &mut port).into_iter().collect();
            let FieldKind::Leaf(leaf) = &mut entries[0].kind else {
                panic!("expected leaf");
            };
            leaf.set_raw("8080").unwrap();
        }
        assert_eq!(port, 8080);
    }

    #[test]
    fn set_raw_rejects_bad_number() {
        let mut port = 80u16;
        let mut entries: Vec<Field<'_>> =
            Fields::new().leaf("port", &mut port).into_iter().collect();
        let FieldKind::Leaf(leaf) = &mut entries[0].kind else {
            panic!("expected leaf");
        };
        assert!(leaf.set_raw("eighty").is_err());
    }

    #[test]
    fn assign_from_copies_same_type() {
        let mut src = String::from("source");
        let mut dst = String::from("dest");
        {
            let mut a: Vec<Field<'_>> = Fields::new().leaf("s", &mut src).into_iter().collect();
            let mut b: Vec<Field<'_>> = Fields::new().leaf("d", &mut dst).into_iter().collect();
            let (FieldKind::Leaf(from), FieldKind::Leaf(to)) = (&mut a[0].kind, &mut b[0].kind)
            else {
                panic!("expected leaves");
            };
            assert!(to.assign_from(&**from));
        }
        assert_eq!(dst, "source");
    }

    #[test]
    fn assign_from_rejects_other_type() {
        let mut src = 1u8;
        let mut dst = String::from("dest");
        let mut a: Vec<Field<'_>> = Fields::new().leaf("s", &mut src).into_iter().collect();
        let mut b: Vec<Field<'_>> = Fields::new().leaf("d", &mut dst).into_iter().collect();
        let (FieldKind::Leaf(from), FieldKind::Leaf(to)) = (&mut a[0].kind, &mut b[0].kind) else {
            panic!("expected leaves");
        };
        assert!(!to.assign_from(&**from));
    }

    #[test]
    fn optional_renders_none_as_unset() {
        let mut url: Option<String> = None;
        let mut entries: Vec<Field<'_>> =
            Fields::new().optional("url", &mut url).into_iter().collect();
        let FieldKind::Leaf(leaf) = &mut entries[0].kind else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.render(), None);
        leaf.set_raw("pg://").unwrap();
        assert_eq!(leaf.render(), Some("pg://".to_string()));
    }

    #[test]
    fn bool_parses_common_spellings() {
        assert_eq!(bool::parse_flag("TRUE"), Ok(true));
        assert_eq!(bool::parse_flag("0"), Ok(false));
        assert!(bool::parse_flag("maybe").is_err());
        assert!(bool::is_switch());
        assert!(!u16::is_switch());
    }
}
