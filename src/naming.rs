//! Naming rules for struct-bound flags.
//!
//! A field identifier is split into words, lowercased and joined with the flag
//! divider: `pool_size` and `PoolSize` both become `pool-size`. A naming tag on
//! the field can replace, alias, absolutize or exclude that name.

use std::fmt;
use std::sync::Arc;

/// Per-field validation hook run by the flag layer before a parsed value is
/// written into the record. Receives the flag name and the raw value.
pub type FieldValidator = Arc<dyn Fn(&str, &str) -> Result<(), String> + Send + Sync>;

/// Settings that control how flag names are derived from a record.
///
/// Every setting is independent; [`Default`] gives the conventional values.
#[derive(Clone)]
pub struct FlagOptions {
    /// Tag key holding the flag name override (default `"flag"`).
    pub tag: String,
    /// Tag key holding the flag's usage text (default `"desc"`).
    pub desc_tag: String,
    /// Joins words and nesting levels in a flag name (default `"-"`).
    pub divider: String,
    /// Replaces `divider` in derived environment variable names (default `"_"`).
    pub env_divider: String,
    /// Environment variable prefix. Empty disables env binding.
    pub env_prefix: String,
    /// Prepended verbatim to every flag name not tagged with `~`.
    pub prefix: String,
    /// Embedded records contribute no name segment when set.
    pub flatten: bool,
    pub validator: Option<FieldValidator>,
}

impl Default for FlagOptions {
    fn default() -> Self {
        Self {
            tag: "flag".into(),
            desc_tag: "desc".into(),
            divider: "-".into(),
            env_divider: "_".into(),
            env_prefix: String::new(),
            prefix: String::new(),
            flatten: false,
            validator: None,
        }
    }
}

impl fmt::Debug for FlagOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagOptions")
            .field("tag", &self.tag)
            .field("desc_tag", &self.desc_tag)
            .field("divider", &self.divider)
            .field("env_divider", &self.env_divider)
            .field("env_prefix", &self.env_prefix)
            .field("prefix", &self.prefix)
            .field("flatten", &self.flatten)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl FlagOptions {
    /// Environment variable bound to `flag_name`, or `None` when no env prefix is set.
    ///
    /// `server-port` with prefix `APP_` and env divider `_` → `APP_SERVER_PORT`.
    pub fn env_name(&self, flag_name: &str) -> Option<String> {
        if self.env_prefix.is_empty() {
            return None;
        }
        let body = if self.divider.is_empty() {
            flag_name.to_string()
        } else {
            flag_name.replace(&self.divider, &self.env_divider)
        };
        Some(format!("{}{}", self.env_prefix, body.to_uppercase()))
    }
}

/// Parsed form of a naming tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagTag {
    /// `-`: the field gets no flag.
    Skip,
    /// No tag, or an empty one: use the computed name.
    Computed,
    /// An explicit name, with optional aliases.
    Named {
        name: String,
        aliases: Vec<String>,
        /// Set by a leading `~`; the name ignores every prefix.
        absolute: bool,
    },
}

impl FlagTag {
    /// Parse a raw tag value. Only the part before the first `,` is a name;
    /// anything after it is reserved for options.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return FlagTag::Computed;
        };
        let head = raw.split(',').next().unwrap_or_default().trim();
        match head {
            "-" => FlagTag::Skip,
            "" => FlagTag::Computed,
            _ => {
                let mut names = head.split_whitespace();
                let first = names.next().unwrap_or_default();
                let aliases = names.map(str::to_string).collect();
                match first.strip_prefix('~') {
                    Some(rest) => FlagTag::Named {
                        name: rest.to_string(),
                        aliases,
                        absolute: true,
                    },
                    None => FlagTag::Named {
                        name: first.to_string(),
                        aliases,
                        absolute: false,
                    },
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_numeric() {
        CharClass::Digit
    } else {
        CharClass::Other
    }
}

/// Split an identifier into words.
///
/// Runs of the same character class form a word; `_` and `-` separate words
/// and are dropped. An uppercase run followed by lowercase letters hands its
/// last capital to the next word, so `PDFLoader` → `["PDF", "Loader"]`.
pub fn split_words(ident: &str) -> Vec<String> {
    // Each run remembers whether an explicit separator preceded it.
    let mut runs: Vec<(Vec<char>, bool)> = Vec::new();
    let mut last: Option<CharClass> = None;
    let mut separated = false;

    for c in ident.chars() {
        if c == '_' || c == '-' {
            last = None;
            separated = true;
            continue;
        }
        let class = classify(c);
        match runs.last_mut() {
            Some((run, _)) if last == Some(class) => run.push(c),
            _ => runs.push((vec![c], separated)),
        }
        last = Some(class);
        separated = false;
    }

    for i in 0..runs.len().saturating_sub(1) {
        let upper_then_lower = runs[i].0.first().is_some_and(|c| c.is_uppercase())
            && runs[i + 1].0.first().is_some_and(|c| c.is_lowercase())
            && !runs[i + 1].1;
        if upper_then_lower && let Some(c) = runs[i].0.pop() {
            runs[i + 1].0.insert(0, c);
        }
    }

    runs.into_iter()
        .filter(|(run, _)| !run.is_empty())
        .map(|(run, _)| run.into_iter().collect())
        .collect()
}

/// Convert an identifier to flag case: `ThisIsACamel` → `this-is-a-camel`.
pub fn camel_to_flag(ident: &str, divider: &str) -> String {
    split_words(ident).join(divider).to_lowercase()
}

/// The name a leaf contributes, before nested prefixes are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafName {
    pub name: String,
    pub aliases: Vec<String>,
    pub absolute: bool,
}

/// Name of a leaf field from its identifier and (optional) tag.
/// Returns `None` when the tag excludes the field.
pub fn leaf_name(ident: &str, tag: Option<&str>, options: &FlagOptions) -> Option<LeafName> {
    match FlagTag::parse(tag) {
        FlagTag::Skip => None,
        FlagTag::Computed => Some(LeafName {
            name: camel_to_flag(ident, &options.divider),
            aliases: Vec::new(),
            absolute: false,
        }),
        FlagTag::Named {
            name,
            aliases,
            absolute,
        } => Some(LeafName {
            name,
            aliases,
            absolute,
        }),
    }
}
