//! Collection adaptation: each element through the element kind.

use crate::error::{ModelError, ModelResult};
use crate::kind::FieldKind;
use crate::Value;

/// Adapts every element of a list, in order.
///
/// Fails fast on the first bad element with its index appended to `path`,
/// so a nested failure reads `bookmarks[1].uri`. Anything other than a list
/// is rejected whole; a single scalar is never wrapped.
pub(crate) fn adapt_collection(element: &FieldKind, raw: &Value, path: &str) -> ModelResult<Value> {
    let Value::List(items) = raw else {
        return Err(ModelError::adaptation(
            path,
            raw,
            format!("expected a list of {}, found {}", element.tag(), raw.type_name()),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| element.adapt_at(item, &format!("{path}[{i}]")))
        .collect::<ModelResult<Vec<_>>>()
        .map(Value::List)
}
