use crate::{Entity, Value};
use std::collections::HashSet;
use std::fmt;

/// One difference between two entity instances.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDiff {
    /// Present only on the left-hand instance.
    OnlyLeft { name: String, value: Value },
    /// Present only on the right-hand instance.
    OnlyRight { name: String, value: Value },
    Changed {
        name: String,
        left: Value,
        right: Value,
    },
}

impl FieldDiff {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::OnlyLeft { name, .. } | Self::OnlyRight { name, .. } | Self::Changed { name, .. } => {
                name
            }
        }
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnlyLeft { name, value } => write!(f, "- {name}: {value}"),
            Self::OnlyRight { name, value } => write!(f, "+ {name}: {value}"),
            Self::Changed { name, left, right } => write!(f, "~ {name}: {left} -> {right}"),
        }
    }
}

impl Entity {
    /// Field-by-field differences against `other`, in this entity's
    /// declaration order followed by extras. Fields only `other`'s schema
    /// declares come last.
    #[must_use]
    pub fn diff(&self, other: &Entity) -> Vec<FieldDiff> {
        let mut diffs = Vec::new();

        let names = self
            .schema()
            .field_names()
            .chain(self.extras().keys().map(String::as_str))
            .chain(other.schema().field_names())
            .chain(other.extras().keys().map(String::as_str));

        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                continue;
            }
            match (self.present(name), other.present(name)) {
                (Some(left), Some(right)) if left == right => {}
                (Some(left), Some(right)) => diffs.push(FieldDiff::Changed {
                    name: name.to_owned(),
                    left: left.clone(),
                    right: right.clone(),
                }),
                (Some(value), None) => diffs.push(FieldDiff::OnlyLeft {
                    name: name.to_owned(),
                    value: value.clone(),
                }),
                (None, Some(value)) => diffs.push(FieldDiff::OnlyRight {
                    name: name.to_owned(),
                    value: value.clone(),
                }),
                (None, None) => {}
            }
        }
        diffs
    }

    fn present(&self, name: &str) -> Option<&Value> {
        self.values().get(name).or_else(|| self.extras().get(name))
    }
}
