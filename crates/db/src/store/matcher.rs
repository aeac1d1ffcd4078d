//! Query, projection, and update evaluation for [`super::MemoryStore`].
//!
//! Covers the subset of MongoDB semantics the application relies on. Anything
//! outside it is rejected with [`DocumentError::UnsupportedQuery`] rather than
//! silently matching.

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document};

use crate::error::DocumentError;

const ID: &str = "_id";

/// Whether `document` satisfies `filter`.
pub(super) fn matches(document: &Document, filter: &Document) -> Result<bool, DocumentError> {
    for (key, condition) in filter {
        let satisfied = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    all &= matches(document, clause)?;
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    any |= matches(document, clause)?;
                }
                any
            }
            "$nor" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    any |= matches(document, clause)?;
                }
                !any
            }
            op if op.starts_with('$') => {
                return Err(DocumentError::unsupported(format!(
                    "top-level operator {op}"
                )));
            }
            path => field_matches(lookup(document, path)?, condition)?,
        };

        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(operator: &str, condition: &'a Bson) -> Result<Vec<&'a Document>, DocumentError> {
    let Bson::Array(items) = condition else {
        return Err(DocumentError::unsupported(format!(
            "{operator} expects an array"
        )));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(DocumentError::unsupported(format!(
                "{operator} expects an array of documents"
            ))),
        })
        .collect()
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool, DocumentError> {
    match condition {
        Bson::Document(operators) if is_operator_document(operators)? => {
            for (operator, operand) in operators {
                if !apply_operator(value, operator, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        expected => Ok(equals_or_contains(value, expected)),
    }
}

fn is_operator_document(document: &Document) -> Result<bool, DocumentError> {
    let operators = document.keys().filter(|k| k.starts_with('$')).count();
    if operators == 0 {
        Ok(false)
    } else if operators == document.len() {
        Ok(true)
    } else {
        Err(DocumentError::unsupported(
            "operators mixed with plain fields in a condition",
        ))
    }
}

fn apply_operator(value: Option<&Bson>, operator: &str, operand: &Bson) -> Result<bool, DocumentError> {
    let result = match operator {
        "$eq" => equals_or_contains(value, operand),
        "$ne" => !equals_or_contains(value, operand),
        "$gt" => compares(value, operand, Ordering::is_gt),
        "$gte" => compares(value, operand, Ordering::is_ge),
        "$lt" => compares(value, operand, Ordering::is_lt),
        "$lte" => compares(value, operand, Ordering::is_le),
        "$in" => in_list(value, operand)?,
        "$nin" => !in_list(value, operand)?,
        "$exists" => truthy(operand)? == value.is_some(),
        other => return Err(DocumentError::unsupported(format!("operator {other}"))),
    };
    Ok(result)
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> Result<bool, DocumentError> {
    let Bson::Array(candidates) = operand else {
        return Err(DocumentError::unsupported("$in/$nin expects an array"));
    };
    Ok(candidates
        .iter()
        .any(|candidate| equals_or_contains(value, candidate)))
}

/// Equality with MongoDB's array rule: an array field matches when any
/// element equals the expected value. A missing field equals `null`.
fn equals_or_contains(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(actual) => {
            values_equal(actual, expected)
                || matches!(actual, Bson::Array(items) if items.iter().any(|item| values_equal(item, expected)))
        }
    }
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    match value {
        None => false,
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare(item, operand).is_some_and(accept)),
        Some(actual) => compare(actual, operand).is_some_and(accept),
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn truthy(value: &Bson) -> Result<bool, DocumentError> {
    match value {
        Bson::Boolean(b) => Ok(*b),
        Bson::Int32(n) => Ok(*n != 0),
        Bson::Int64(n) => Ok(*n != 0),
        Bson::Double(n) => Ok(*n != 0.0),
        other => Err(DocumentError::unsupported(format!(
            "expected a boolean or number, got {other}"
        ))),
    }
}

/// Resolve a dotted path. Numeric segments index into arrays; a field name
/// applied to an array is rejected.
pub(super) fn lookup<'a>(document: &'a Document, path: &str) -> Result<Option<&'a Bson>, DocumentError> {
    let mut segments = path.split('.');
    let Some(mut current) = segments.next().and_then(|head| document.get(head)) else {
        return Ok(None);
    };
    for segment in segments {
        let next = match current {
            Bson::Document(inner) => inner.get(segment),
            Bson::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index),
                Err(_) => {
                    return Err(DocumentError::unsupported(format!(
                        "path '{path}' reaches into an array by field name"
                    )));
                }
            },
            _ => None,
        };
        let Some(next) = next else {
            return Ok(None);
        };
        current = next;
    }
    Ok(Some(current))
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> Result<(), DocumentError> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));
            match child {
                Bson::Document(inner) => set_path(inner, rest, value),
                _ => Err(DocumentError::unsupported(format!(
                    "cannot create field '{rest}' inside non-document '{head}'"
                ))),
            }
        }
    }
}

fn remove_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = document.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

/// Apply an inclusion or exclusion projection.
pub(super) fn project(document: &Document, projection: &Document) -> Result<Document, DocumentError> {
    if projection.is_empty() {
        return Ok(document.clone());
    }

    let id_flag = projection.get(ID).map(truthy).transpose()?;
    let keep_id = id_flag.unwrap_or(true);

    let mut included = Vec::new();
    let mut excluded = Vec::new();
    for (path, flag) in projection.iter().filter(|(k, _)| k.as_str() != ID) {
        if truthy(flag)? {
            included.push(path.as_str());
        } else {
            excluded.push(path.as_str());
        }
    }

    if !included.is_empty() && !excluded.is_empty() {
        return Err(DocumentError::unsupported(
            "projection mixes inclusion and exclusion",
        ));
    }

    // `{_id: 1}` on its own is an inclusion projection.
    let inclusion = !included.is_empty() || (excluded.is_empty() && id_flag == Some(true));
    if !inclusion {
        let mut projected = document.clone();
        for path in excluded {
            remove_path(&mut projected, path);
        }
        if !keep_id {
            projected.remove(ID);
        }
        return Ok(projected);
    }

    let mut projected = Document::new();
    if keep_id {
        if let Some(id) = document.get(ID) {
            projected.insert(ID, id.clone());
        }
    }
    for path in included {
        if let Some(value) = lookup(document, path)? {
            set_path(&mut projected, path, value.clone())?;
        }
    }
    Ok(projected)
}

/// Apply a `$set` update. Returns whether any field changed.
///
/// The update is all-or-nothing: on error `document` is left untouched.
pub(super) fn apply_update(document: &mut Document, update: &Document) -> Result<bool, DocumentError> {
    let mut staged = document.clone();
    let changed = set_fields(&mut staged, update)?;
    if changed {
        *document = staged;
    }
    Ok(changed)
}

fn set_fields(document: &mut Document, update: &Document) -> Result<bool, DocumentError> {
    let mut changed = false;
    for (operator, fields) in update {
        if operator != "$set" {
            return Err(DocumentError::unsupported(format!("update operator {operator}")));
        }
        let Bson::Document(fields) = fields else {
            return Err(DocumentError::unsupported("$set expects a document"));
        };

        for (path, value) in fields {
            if lookup(document, path)? == Some(value) {
                continue;
            }
            if path == ID {
                return Err(DocumentError::unsupported("_id is immutable"));
            }
            set_path(document, path, value.clone())?;
            changed = true;
        }
    }
    Ok(changed)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use mongodb::bson::doc;
    use proptest::prelude::*;

    // Property: equality and $ne partition every document.
    proptest! {
        #[test]
        fn prop_ne_is_negation_of_eq(stored in any::<i32>(), queried in any::<i32>()) {
            let document = doc! { "value": stored };
            let eq_filter = doc! { "value": queried };
            let ne_filter = doc! { "value": { "$ne": queried } };
            let eq = matches(&document, &eq_filter).unwrap();
            let ne = matches(&document, &ne_filter).unwrap();
            prop_assert_eq!(eq, stored == queried);
            prop_assert_ne!(eq, ne);
        }
    }

    // Property: range operators agree with integer ordering.
    proptest! {
        #[test]
        fn prop_range_operators_follow_ordering(stored in any::<i64>(), bound in any::<i32>()) {
            let document = doc! { "value": stored };
            let bound_wide = i64::from(bound);
            let below = matches(&document, &doc! { "value": { "$lt": bound } }).unwrap();
            let at_or_above = matches(&document, &doc! { "value": { "$gte": bound } }).unwrap();
            prop_assert_eq!(below, (stored as f64) < (bound_wide as f64));
            prop_assert_eq!(at_or_above, (stored as f64) >= (bound_wide as f64));
        }
    }

    // Property: a $set patch converges; the document then matches the patch
    // and re-applying it changes nothing.
    proptest! {
        #[test]
        fn prop_set_converges(
            initial in "[a-z]{0,8}",
            target in "[a-z]{0,8}",
        ) {
            let mut document = doc! { "_id": 1, "field": initial.clone() };
            let update = doc! { "$set": { "field": target.clone() } };

            let first = apply_update(&mut document, &update).unwrap();
            prop_assert_eq!(first, initial != target);

            let matched = matches(&document, &doc! { "field": target }).unwrap();
            prop_assert!(matched);
            let second = apply_update(&mut document, &update).unwrap();
            prop_assert!(!second);
        }
    }
}
