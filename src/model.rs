use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record of a remote table — an opaque field→value mapping.
/// The designated primary-key field (default `id`) identifies a row across
/// its lifetime; nothing else about the shape is assumed.
pub type Row = Map<String, Value>;

/// Look up a row's primary key. A missing or null key counts as absent.
pub fn row_key<'a>(row: &'a Row, key_field: &str) -> Option<&'a Value> {
    match row.get(key_field) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    }
}

/// A row-level change notification from the backend's realtime feed.
/// Delete carries the old row, used only for its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert { new: Row },
    Update { new: Row },
    Delete { old: Row },
}

impl ChangeEvent {
    /// The primary key the event is about, or None if the payload lacks it.
    pub fn key<'a>(&'a self, key_field: &str) -> Option<&'a Value> {
        match self {
            ChangeEvent::Insert { new } | ChangeEvent::Update { new } => row_key(new, key_field),
            ChangeEvent::Delete { old } => row_key(old, key_field),
        }
    }

    /// The row payload the event carries.
    pub fn row(&self) -> &Row {
        match self {
            ChangeEvent::Insert { new } | ChangeEvent::Update { new } => new,
            ChangeEvent::Delete { old } => old,
        }
    }
}

/// The closed set of filter operators. Dispatch is a fixed match — an
/// unknown operator is unrepresentable, not a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
}

/// One filter condition: `field <op> operand`. Conditions in a filter list
/// combine with AND only; there is no OR and no nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub operand: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, operand: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            operand: operand.into(),
        }
    }

    /// Evaluate this condition against a row's current field values.
    /// A missing field evaluates as null. Never panics.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => values_equal(value, &self.operand),
            FilterOp::Neq => !values_equal(value, &self.operand),
            FilterOp::Gt => matches!(compare_values(value, &self.operand), Some(Ordering::Greater)),
            FilterOp::Gte => matches!(
                compare_values(value, &self.operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => matches!(compare_values(value, &self.operand), Some(Ordering::Less)),
            FilterOp::Lte => matches!(
                compare_values(value, &self.operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Like => like_match(value, &self.operand, false),
            FilterOp::Ilike => like_match(value, &self.operand, true),
            FilterOp::Is => match &self.operand {
                Value::Null => value.is_null(),
                Value::Bool(b) => value.as_bool() == Some(*b),
                _ => false,
            },
            FilterOp::In => self
                .operand
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(value, c))),
        }
    }
}

/// A row matches when every condition evaluates true.
pub fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Where null/missing order-field values sort relative to non-null ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nulls {
    First,
    #[default]
    Last,
}

/// Sort order for a collection: field, direction, and null placement.
/// Ties among equal non-null values are left unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub field: String,
    pub direction: Direction,
    pub nulls: Nulls,
}

impl OrderSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
            nulls: Nulls::default(),
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
            nulls: Nulls::default(),
        }
    }

    pub fn nulls(mut self, nulls: Nulls) -> Self {
        self.nulls = nulls;
        self
    }

    /// Compare two rows under this order. Null placement applies before
    /// direction; incomparable non-null values compare equal.
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let va = a.get(&self.field).filter(|v| !v.is_null());
        let vb = b.get(&self.field).filter(|v| !v.is_null());
        match (va, vb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => match self.nulls {
                Nulls::First => Ordering::Less,
                Nulls::Last => Ordering::Greater,
            },
            (Some(_), None) => match self.nulls {
                Nulls::First => Ordering::Greater,
                Nulls::Last => Ordering::Less,
            },
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
                match self.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            }
        }
    }
}

/// Equality with numeric unification: `1` and `1.0` are equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Value::Number(x), Value::Number(y)) = (a, b) {
        return match (x.as_f64(), y.as_f64()) {
            (Some(xf), Some(yf)) => xf == yf,
            _ => x == y,
        };
    }
    a == b
}

/// Ordering over scalar JSON values. Numbers compare numerically, strings
/// lexicographically, booleans false < true. Anything else — cross-type
/// pairs, arrays, objects — is incomparable and yields None.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// SQL LIKE/ILIKE: `%` matches any run of characters, `_` any single one.
/// Non-string value or pattern never matches.
fn like_match(value: &Value, pattern: &Value, case_insensitive: bool) -> bool {
    let (Some(text), Some(pat)) = (value.as_str(), pattern.as_str()) else {
        return false;
    };
    if case_insensitive {
        let text: Vec<char> = text.to_lowercase().chars().collect();
        let pat: Vec<char> = pat.to_lowercase().chars().collect();
        sql_like(&text, &pat)
    } else {
        let text: Vec<char> = text.chars().collect();
        let pat: Vec<char> = pat.chars().collect();
        sql_like(&text, &pat)
    }
}

/// Two-pointer LIKE matcher with backtracking to the last `%`.
fn sql_like(text: &[char], pat: &[char]) -> bool {
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None; // (pat idx after %, text idx it consumed to)

    while t < text.len() {
        if p < pat.len() && (pat[p] == '_' || pat[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pat.len() && pat[p] == '%' {
            star = Some((p + 1, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            // Widen the last % by one character and retry.
            p = sp;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '%' {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn key_lookup() {
        let r = row(json!({"id": 7, "status": "open"}));
        assert_eq!(row_key(&r, "id"), Some(&json!(7)));
        assert_eq!(row_key(&r, "uuid"), None);

        let null_key = row(json!({"id": null}));
        assert_eq!(row_key(&null_key, "id"), None);
    }

    #[test]
    fn event_key_uses_old_row_for_delete() {
        let ev = ChangeEvent::Delete {
            old: row(json!({"id": 3})),
        };
        assert_eq!(ev.key("id"), Some(&json!(3)));

        let ev = ChangeEvent::Update {
            new: row(json!({"id": 4})),
        };
        assert_eq!(ev.key("id"), Some(&json!(4)));
    }

    #[test]
    fn eq_unifies_numeric_types() {
        let r = row(json!({"n": 1}));
        assert!(Filter::new("n", FilterOp::Eq, json!(1.0)).matches(&r));
        assert!(!Filter::new("n", FilterOp::Neq, json!(1.0)).matches(&r));
    }

    #[test]
    fn comparison_operators() {
        let r = row(json!({"age": 30, "name": "bob"}));
        assert!(Filter::new("age", FilterOp::Gt, json!(20)).matches(&r));
        assert!(Filter::new("age", FilterOp::Gte, json!(30)).matches(&r));
        assert!(!Filter::new("age", FilterOp::Lt, json!(30)).matches(&r));
        assert!(Filter::new("age", FilterOp::Lte, json!(30)).matches(&r));
        assert!(Filter::new("name", FilterOp::Gt, json!("alice")).matches(&r));
    }

    #[test]
    fn cross_type_comparison_never_matches() {
        let r = row(json!({"age": 30}));
        assert!(!Filter::new("age", FilterOp::Gt, json!("20")).matches(&r));
        assert!(!Filter::new("age", FilterOp::Lte, json!("99")).matches(&r));
    }

    #[test]
    fn missing_field_evaluates_as_null() {
        let r = row(json!({"id": 1}));
        assert!(Filter::new("deleted_at", FilterOp::Is, Value::Null).matches(&r));
        assert!(!Filter::new("deleted_at", FilterOp::Eq, json!("x")).matches(&r));
    }

    #[test]
    fn is_operator() {
        let r = row(json!({"archived": false, "deleted_at": null}));
        assert!(Filter::new("archived", FilterOp::Is, json!(false)).matches(&r));
        assert!(!Filter::new("archived", FilterOp::Is, json!(true)).matches(&r));
        assert!(Filter::new("deleted_at", FilterOp::Is, Value::Null).matches(&r));
        // non-null/bool operand is meaningless for IS
        assert!(!Filter::new("archived", FilterOp::Is, json!("false")).matches(&r));
    }

    #[test]
    fn in_operator() {
        let r = row(json!({"status": "open"}));
        assert!(Filter::new("status", FilterOp::In, json!(["open", "pending"])).matches(&r));
        assert!(!Filter::new("status", FilterOp::In, json!(["closed"])).matches(&r));
        // non-array operand
        assert!(!Filter::new("status", FilterOp::In, json!("open")).matches(&r));
    }

    #[test]
    fn like_patterns() {
        let r = row(json!({"name": "Maria Souza"}));
        assert!(Filter::new("name", FilterOp::Like, json!("Maria%")).matches(&r));
        assert!(Filter::new("name", FilterOp::Like, json!("%Souza")).matches(&r));
        assert!(Filter::new("name", FilterOp::Like, json!("%ria%")).matches(&r));
        assert!(Filter::new("name", FilterOp::Like, json!("Mari_ Souza")).matches(&r));
        assert!(!Filter::new("name", FilterOp::Like, json!("maria%")).matches(&r));
        assert!(Filter::new("name", FilterOp::Ilike, json!("maria%")).matches(&r));
        assert!(!Filter::new("name", FilterOp::Like, json!("Maria")).matches(&r));
    }

    #[test]
    fn like_backtracks_across_percent() {
        let r = row(json!({"s": "abcbc"}));
        assert!(Filter::new("s", FilterOp::Like, json!("a%bc")).matches(&r));
        assert!(Filter::new("s", FilterOp::Like, json!("%")).matches(&r));
        assert!(!Filter::new("s", FilterOp::Like, json!("a%d")).matches(&r));
    }

    #[test]
    fn like_on_non_string_is_false() {
        let r = row(json!({"n": 42}));
        assert!(!Filter::new("n", FilterOp::Like, json!("4%")).matches(&r));
    }

    #[test]
    fn matches_all_is_conjunction() {
        let r = row(json!({"status": "open", "age": 30}));
        let filters = vec![
            Filter::new("status", FilterOp::Eq, json!("open")),
            Filter::new("age", FilterOp::Gte, json!(18)),
        ];
        assert!(matches_all(&filters, &r));

        let filters = vec![
            Filter::new("status", FilterOp::Eq, json!("open")),
            Filter::new("age", FilterOp::Lt, json!(18)),
        ];
        assert!(!matches_all(&filters, &r));
        assert!(matches_all(&[], &r)); // empty filter matches everything
    }

    #[test]
    fn order_asc_desc() {
        let a = row(json!({"created_at": 1}));
        let b = row(json!({"created_at": 2}));
        assert_eq!(OrderSpec::asc("created_at").compare(&a, &b), Ordering::Less);
        assert_eq!(
            OrderSpec::desc("created_at").compare(&a, &b),
            Ordering::Greater
        );
    }

    #[test]
    fn order_null_placement() {
        let with = row(json!({"seen_at": 5}));
        let without = row(json!({}));
        let null = row(json!({"seen_at": null}));

        let last = OrderSpec::asc("seen_at");
        assert_eq!(last.compare(&with, &without), Ordering::Less);
        assert_eq!(last.compare(&null, &with), Ordering::Greater);
        assert_eq!(last.compare(&null, &without), Ordering::Equal);

        let first = OrderSpec::asc("seen_at").nulls(Nulls::First);
        assert_eq!(first.compare(&with, &without), Ordering::Greater);
        assert_eq!(first.compare(&null, &with), Ordering::Less);
    }

    #[test]
    fn order_incomparable_values_tie() {
        let a = row(json!({"v": "abc"}));
        let b = row(json!({"v": 12}));
        assert_eq!(OrderSpec::asc("v").compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn change_event_serde_shape() {
        let ev = ChangeEvent::Insert {
            new: row(json!({"id": 1})),
        };
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "INSERT");
        let back: ChangeEvent = serde_json::from_value(v).unwrap();
        assert_eq!(back, ev);
    }
}
