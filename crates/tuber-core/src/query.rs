use serde::Serialize;
use serde_json::Value;

/// Field access by name, used to evaluate a `Query` against a record.
/// Unknown and unset fields read as `Value::Null`.
pub trait Fields {
    fn field(&self, name: &str) -> Value;
}

pub enum Matcher {
    Exact(Value),
    Predicate(Box<dyn Fn(&Value) -> bool>),
}

impl Matcher {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Exact(expected) => expected == value,
            Matcher::Predicate(predicate) => predicate(value),
        }
    }
}

/// A conjunction of per-field filters.
///
/// ```ignore
/// let query = Query::new()
///     .eq("provider", Provider::Lastfm)
///     .not_null("youtube_id");
/// ```
#[derive(Default)]
pub struct Query {
    filters: Vec<(String, Matcher)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.filters.push((field.to_string(), Matcher::Exact(value)));
        self
    }

    pub fn matching(mut self, field: &str, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.filters
            .push((field.to_string(), Matcher::Predicate(Box::new(predicate))));
        self
    }

    pub fn is_null(self, field: &str) -> Self {
        self.eq(field, Value::Null)
    }

    pub fn not_null(self, field: &str) -> Self {
        self.matching(field, |value| !value.is_null())
    }

    pub fn one_of(self, field: &str, values: Vec<String>) -> Self {
        self.matching(field, move |value| {
            value
                .as_str()
                .map_or(false, |value| values.iter().any(|candidate| candidate == value))
        })
    }

    pub fn matches<R: Fields>(&self, record: &R) -> bool {
        self.filters
            .iter()
            .all(|(field, matcher)| matcher.matches(&record.field(field)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Row {
        id: &'static str,
        video: Option<&'static str>,
    }

    impl Fields for Row {
        fn field(&self, name: &str) -> Value {
            match name {
                "id" => json!(self.id),
                "video" => json!(self.video),
                _ => Value::Null,
            }
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let row = Row { id: "a", video: None };
        assert!(Query::new().matches(&row));
    }

    #[test]
    fn test_filters_are_combined_with_and() {
        let query = Query::new()
            .not_null("video")
            .one_of("id", vec!["a".to_string(), "b".to_string()]);

        assert!(query.matches(&Row { id: "a", video: Some("v1") }));
        assert!(!query.matches(&Row { id: "a", video: None }));
        assert!(!query.matches(&Row { id: "c", video: Some("v2") }));
    }

    #[test]
    fn test_exact_and_null_filters() {
        let row = Row { id: "a", video: None };
        assert!(Query::new().eq("id", "a").is_null("video").matches(&row));
        assert!(!Query::new().eq("id", "b").matches(&row));
        assert!(Query::new().is_null("missing").matches(&row));
    }
}
