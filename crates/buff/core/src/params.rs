//! Per-character parameter tables and the path resolver.
//!
//! A [`ParameterTable`] is the numeric data a source formula reads through
//! symbolic paths such as `skill.hit1` or `passive.stacks[2]`. It stands in
//! for the live game state the source project would otherwise read, so the
//! resolver makes one deliberate approximation: a path that ends on a
//! per-tier list without choosing a tier picks the last (highest) tier.
//!
//! Resolution never defaults to zero. A missing field, an out-of-range index
//! or a non-numeric leaf is reported as `None` and the caller decides.

use std::collections::BTreeMap;

use crate::scan;

/// A node of a parameter table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum ParamValue {
    /// Hole in a tier list (`null` in JSON).
    Null,
    Number(f64),
    /// Ordered tiers (levels, ranks, refinements).
    List(Vec<ParamValue>),
    Table(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Best-case numeric reading of this node.
    ///
    /// Numbers read as themselves; lists yield their last numeric entry.
    pub fn last_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::List(items) => items.iter().rev().find_map(Self::as_number),
            Self::Null | Self::Table(_) => None,
        }
    }

    fn step(&self, step: &Step) -> Option<&ParamValue> {
        match (self, step) {
            (Self::Table(fields), Step::Field(name)) => fields.get(name),
            (Self::Table(fields), Step::Index(index)) => fields.get(&index.to_string()),
            (Self::List(items), Step::Index(index)) => items.get(*index),
            (Self::List(items), Step::Field(name)) => items.get(name.parse::<usize>().ok()?),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(values: Vec<f64>) -> Self {
        Self::List(values.into_iter().map(Self::Number).collect())
    }
}

/// One step of an access path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// `.name` or `["name"]`
    Field(String),
    /// `[n]`
    Index(usize),
}

/// A parsed access path: a root field followed by field/index steps.
///
/// ```
/// # use buff_core::params::{AccessPath, Step};
/// let path = AccessPath::parse("group.member[2]").unwrap();
/// assert_eq!(path.root, "group");
/// assert_eq!(path.steps, vec![Step::Field("member".into()), Step::Index(2)]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPath {
    pub root: String,
    pub steps: Vec<Step>,
}

impl AccessPath {
    /// Parses `path`, returning `None` for anything that is not a plain
    /// access path (calls, operators, computed subscripts).
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        let root_len = scan::identifier_len(path, 0);
        if root_len == 0 {
            return None;
        }

        let bytes = path.as_bytes();
        let mut steps = Vec::new();
        let mut at = root_len;
        while at < bytes.len() {
            match bytes[at] {
                b'.' => {
                    let len = scan::identifier_len(path, at + 1);
                    if len == 0 {
                        return None;
                    }
                    steps.push(Step::Field(path[at + 1..at + 1 + len].to_owned()));
                    at += 1 + len;
                }
                b'[' => {
                    let close = scan::find_matching_close(path, at)?;
                    let inner = path[at + 1..close].trim();
                    let step = match scan::unquote(inner) {
                        Some(key) => Step::Field(key.to_owned()),
                        None => Step::Index(inner.parse().ok()?),
                    };
                    steps.push(step);
                    at = close + 1;
                }
                _ => return None,
            }
        }

        Some(Self {
            root: path[..root_len].to_owned(),
            steps,
        })
    }

    /// Steps from the table root, treating `root` as the first field.
    pub fn full_steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.push(Step::Field(self.root.clone()));
        steps.extend(self.steps.iter().cloned());
        steps
    }

    fn ends_with_index(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Index(_)))
    }
}

/// Numeric data for one character, addressed by access path.
///
/// Supplied by the caller, read-only for the engine, one instance per
/// translation unit.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ParameterTable {
    fields: BTreeMap<String, ParamValue>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: BTreeMap<String, ParamValue>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inserts `value` at a dotted path, creating intermediate tables.
    ///
    /// Returns `false` if the path is malformed or crosses a non-table node.
    pub fn insert(&mut self, path: &str, value: impl Into<ParamValue>) -> bool {
        let Some(parsed) = AccessPath::parse(path) else {
            return false;
        };
        let mut names = Vec::with_capacity(parsed.steps.len() + 1);
        names.push(parsed.root);
        for step in parsed.steps {
            match step {
                Step::Field(name) => names.push(name),
                Step::Index(_) => return false,
            }
        }

        let Some((leaf, parents)) = names.split_last() else {
            return false;
        };
        let mut fields = &mut self.fields;
        for name in parents {
            let node = fields
                .entry(name.clone())
                .or_insert_with(|| ParamValue::Table(BTreeMap::new()));
            match node {
                ParamValue::Table(inner) => fields = inner,
                _ => return false,
            }
        }
        fields.insert(leaf.clone(), value.into());
        true
    }

    /// Builder-style [`insert`](Self::insert), ignoring malformed paths.
    pub fn with(mut self, path: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(path, value);
        self
    }

    /// Walks `steps` from the table root.
    pub fn node(&self, steps: &[Step]) -> Option<&ParamValue> {
        let (first, rest) = steps.split_first()?;
        let Step::Field(name) = first else {
            return None;
        };
        rest.iter()
            .try_fold(self.fields.get(name)?, |node, step| node.step(step))
    }

    /// Resolves a parsed path to a number.
    ///
    /// An explicit trailing index is honored. A path ending on a tier list
    /// without one selects the last numeric tier.
    pub fn resolve_path(&self, path: &AccessPath) -> Option<f64> {
        match self.node(&path.full_steps())? {
            ParamValue::Number(value) => Some(*value),
            list @ ParamValue::List(_) if !path.ends_with_index() => list.last_number(),
            _ => None,
        }
    }
}

/// Returns the raw node at `path` (e.g. a whole tier list).
pub fn resolve_value<'a>(path: &str, table: &'a ParameterTable) -> Option<&'a ParamValue> {
    table.node(&AccessPath::parse(path)?.full_steps())
}

/// Resolves `path` (e.g. `"group.member[2]"`) against `table`.
///
/// Returns `None` when the path is malformed or any step is not traversable.
pub fn resolve(path: &str, table: &ParameterTable) -> Option<f64> {
    table.resolve_path(&AccessPath::parse(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ParameterTable {
        ParameterTable::new()
            .with("skill.hit1", 12.0)
            .with("skill.tiers", vec![0.1, 0.2, 0.3])
            .with("burst.stacks", vec![1.0, 2.0])
            .with("passive.bonus", ParamValue::List(vec![
                ParamValue::Number(5.0),
                ParamValue::Number(7.0),
                ParamValue::Null,
            ]))
    }

    #[test]
    fn resolves_plain_numbers() {
        assert_eq!(resolve("skill.hit1", &table()), Some(12.0));
    }

    #[test]
    fn explicit_index_is_honored() {
        assert_eq!(resolve("skill.tiers[0]", &table()), Some(0.1));
        assert_eq!(resolve("skill.tiers[3]", &table()), None);
    }

    #[test]
    fn absent_index_selects_last_tier() {
        assert_eq!(resolve("skill.tiers", &table()), Some(0.3));
        assert_eq!(resolve("passive.bonus", &table()), Some(7.0));
    }

    #[test]
    fn untraversable_paths_are_not_found() {
        let table = table();
        assert_eq!(resolve("skill.missing", &table), None);
        assert_eq!(resolve("skill", &table), None);
        assert_eq!(resolve("skill.hit1.deeper", &table), None);
        assert_eq!(resolve("passive.bonus[2]", &table), None);
        assert_eq!(resolve("skill.hit1 + 1", &table), None);
        assert_eq!(resolve("", &table), None);
    }

    #[test]
    fn raw_nodes_expose_tier_lists() {
        let table = table();
        assert_eq!(
            resolve_value("burst.stacks", &table),
            Some(&ParamValue::from(vec![1.0, 2.0]))
        );
        assert!(resolve_value("burst.none", &table).is_none());
    }

    #[test]
    fn quoted_subscripts_are_fields() {
        let path = AccessPath::parse(r#"skill["hit1"]"#).unwrap();
        assert_eq!(table().resolve_path(&path), Some(12.0));
    }

    #[test]
    fn insert_refuses_to_cross_leaves() {
        let mut table = table();
        assert!(!table.insert("skill.hit1.deeper", 1.0));
        assert!(!table.insert("skill.tiers[0]", 1.0));
        assert!(table.insert("skill.hit2", 3.0));
        assert_eq!(resolve("skill.hit2", &table), Some(3.0));
    }
}
