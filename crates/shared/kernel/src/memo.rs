//! Call memoization: remembers the last materialized argument set per unit
//! (and per element, for element-bound features) so a reload can skip
//! re-invocation when effective inputs did not change.

use crate::action::Invocation;
use bootlace_domain::Value;
use bootlace_page::ElementId;
use moka::sync::Cache;
use std::fmt;
use std::sync::Arc;

pub(crate) type MemoKey = (Arc<str>, Option<ElementId>);

/// Instance-scoped argument cache, bounded so eviction can only cause a
/// redundant re-invocation, never a wrongly skipped one.
pub(crate) struct CallMemoCache {
    cache: Cache<MemoKey, Value>,
}

impl fmt::Debug for CallMemoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallMemoCache").field("entries", &self.cache.entry_count()).finish()
    }
}

impl CallMemoCache {
    pub(crate) fn new(capacity: u64) -> Self {
        Self { cache: Cache::new(capacity) }
    }

    /// Whether the cached serialization for `key` equals `serialized`.
    pub(crate) fn matches(&self, key: &MemoKey, serialized: &Value) -> bool {
        self.cache.get(key).is_some_and(|previous| previous == *serialized)
    }

    pub(crate) fn store(&self, key: MemoKey, serialized: Value) {
        self.cache.insert(key, serialized);
    }
}

/// Default argument serializer: the element handle collapses to its stable
/// identity token, dependency values pass through unchanged.
#[must_use]
pub fn default_serialize_args(invocation: &Invocation) -> Value {
    let mut parts = Vec::with_capacity(invocation.args.len() + 1);
    if let Some(element) = &invocation.element {
        parts.push(Value::String(element.token()));
    }
    parts.extend(invocation.args.iter().cloned());
    Value::Array(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootlace_page::Page;
    use serde_json::json;

    #[test]
    fn serializer_passes_values_through_in_order() {
        let invocation =
            Invocation { element: None, args: vec![json!(1), json!("two"), json!(null)] };
        assert_eq!(default_serialize_args(&invocation), json!([1, "two", null]));
    }

    #[test]
    fn serializer_substitutes_element_token() {
        let page = Page::new();
        let child = page.append_child(page.root(), "div");
        let invocation =
            Invocation { element: Some(page.element(child)), args: vec![json!("x")] };
        assert_eq!(default_serialize_args(&invocation), json!([child.token(), "x"]));
    }

    #[test]
    fn cache_detects_changed_arguments() {
        let cache = CallMemoCache::new(16);
        let key: MemoKey = (Arc::from("unit"), None);

        assert!(!cache.matches(&key, &json!([1])), "empty cache never matches");
        cache.store(key.clone(), json!([1]));
        assert!(cache.matches(&key, &json!([1])));
        assert!(!cache.matches(&key, &json!([2])));
    }

    #[test]
    fn cache_keys_are_element_scoped() {
        let page = Page::new();
        let a = page.append_child(page.root(), "div");
        let b = page.append_child(page.root(), "div");

        let cache = CallMemoCache::new(16);
        cache.store((Arc::from("unit"), Some(a)), json!([1]));

        assert!(cache.matches(&(Arc::from("unit"), Some(a)), &json!([1])));
        assert!(!cache.matches(&(Arc::from("unit"), Some(b)), &json!([1])));
    }
}
