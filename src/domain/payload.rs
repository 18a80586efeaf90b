//! Traversal helpers for decoded response bodies.
//!
//! Response bodies are handled as [`serde_json::Value`] trees: a tagged union of
//! object, array, string, number, bool and null. Payloads come from
//! deserialized wire data and are therefore acyclic.

use serde_json::Value;

/// Visits every string leaf in `value` and collects mutable handles to the ones
/// accepted by `predicate`.
///
/// Object keys are not visited, only values. Order follows the tree walk and
/// carries no meaning.
pub fn collect_strings_mut<'a, P>(value: &'a mut Value, predicate: &P) -> Vec<&'a mut String>
where
    P: Fn(&str) -> bool,
{
    let mut out = Vec::new();
    walk(value, predicate, &mut out);
    out
}

fn walk<'a, P>(value: &'a mut Value, predicate: &P, out: &mut Vec<&'a mut String>)
where
    P: Fn(&str) -> bool,
{
    match value {
        Value::String(s) => {
            if predicate(s) {
                out.push(s);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, predicate, out);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                walk(item, predicate, out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
