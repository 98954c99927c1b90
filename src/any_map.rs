use std::{any::Any, collections::HashMap};

/// A value that can live in an [`AnyMap`]: type-erased, shareable across
/// threads and deep-cloneable through the trait object.
pub trait CloneableAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_box(&self) -> Box<dyn CloneableAny>;
}

impl<T: Any + Clone + Send + Sync> CloneableAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_box(&self) -> Box<dyn CloneableAny> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn CloneableAny> {
    fn clone(&self) -> Self {
        // Dispatch through the vtable; `self.clone_box()` would pick the
        // blanket impl for `Box<dyn CloneableAny>` itself.
        (**self).clone_box()
    }
}

/// String-keyed map of arbitrary values.
#[derive(Clone, Default)]
pub struct AnyMap {
    // If the map is never written, no need to carry around an empty HashMap.
    // That's 3 words. Instead, this is only 1 word.
    map: Option<Box<HashMap<String, Box<dyn CloneableAny>>>>,
}

impl AnyMap {
    pub const fn new() -> Self {
        Self { map: None }
    }

    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.map
            .as_ref()
            .and_then(|map| map.get(key))
            .and_then(|b| (**b).as_any().downcast_ref())
    }

    /// Inserts `val` under `key`, returning the previous value if it had the
    /// same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(
        &mut self,
        key: impl Into<String>,
        val: T,
    ) -> Option<T> {
        self.map
            .get_or_insert_with(Box::default)
            .insert(key.into(), Box::new(val))
            .and_then(|b| b.into_any().downcast().ok().map(|b| *b))
    }

    /// Removes and returns the value under `key` if it is a `T`. A value of
    /// another type stays in place.
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        let map = self.map.as_mut()?;
        if !map.get(key).is_some_and(|b| (**b).as_any().is::<T>()) {
            return None;
        }
        map.remove(key)
            .and_then(|b| b.into_any().downcast().ok().map(|b| *b))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.as_ref().is_some_and(|map| map.contains_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.map.as_ref().is_none_or(|map| map.is_empty())
    }

    pub fn len(&self) -> usize {
        self.map.as_ref().map_or(0, |map| map.len())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.iter().flat_map(|map| map.keys())
    }

    /// Whether storage has been allocated yet.
    pub(crate) fn is_allocated(&self) -> bool {
        self.map.is_some()
    }
}

impl std::fmt::Debug for AnyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_allocates() {
        let mut map = AnyMap::new();
        assert!(!map.is_allocated());
        assert!(map.get::<i32>("missing").is_none());
        assert!(!map.is_allocated());

        map.insert("count", 1i32);
        assert!(map.is_allocated());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_returns_previous_value_of_same_type() {
        let mut map = AnyMap::new();
        assert_eq!(map.insert("count", 5i32), None);
        assert_eq!(map.insert("count", 9i32), Some(5));
        assert_eq!(map.insert("count", "nine"), None);
        assert_eq!(map.get::<&str>("count"), Some(&"nine"));
    }

    #[test]
    fn clone_is_deep() {
        let mut a = AnyMap::new();
        a.insert("list", vec![1, 2]);

        let mut b = a.clone();
        b.insert("list", vec![3]);

        assert_eq!(a.get::<Vec<i32>>("list"), Some(&vec![1, 2]));
        assert_eq!(b.get::<Vec<i32>>("list"), Some(&vec![3]));
    }
}
