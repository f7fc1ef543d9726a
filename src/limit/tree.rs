use std::collections::HashMap;

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    children: HashMap<String, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

/// # Segment trie with longest-registered-prefix lookup.
///
/// ```text
/// insert(["api"], A), insert(["api", "v1", "users"], U)
///
/// root ─ api (A) ─ v1 ─ users (U)
///
/// get(["api", "v1"])               → A   (v1 carries no value)
/// get(["api", "v1", "users", "7"]) → U   (trailing segments ignored)
/// get(["docs"])                    → None
/// ```
#[derive(Debug)]
pub struct PrefixTree<V> {
    root: Node<V>,
    len: usize,
}

impl<V> PrefixTree<V> {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }

    /// Stores `value` at the path; returns the value it replaced.
    ///
    /// An empty path stores at the root, matching every lookup.
    pub fn insert<I, S>(&mut self, segments: I, value: V) -> Option<V>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut node = &mut self.root;
        for seg in segments {
            node = node.children.entry(seg.as_ref().to_owned()).or_default();
        }
        let prev = node.value.replace(value);
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    /// Value of the deepest registered node along the path.
    pub fn get<I, S>(&self, segments: I) -> Option<&V>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut node = &self.root;
        let mut best = node.value.as_ref();
        for seg in segments {
            match node.children.get(seg.as_ref()) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(v) = node.value.as_ref() {
                best = Some(v);
            }
        }
        best
    }

    /// True when a value is stored at exactly this path.
    pub fn contains<I, S>(&self, segments: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut node = &self.root;
        for seg in segments {
            match node.children.get(seg.as_ref()) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.value.is_some()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PrefixTree<&'static str> {
        let mut t = PrefixTree::new();
        t.insert(["api"], "api");
        t.insert(["api", "v1", "users"], "users");
        t.insert(["static"], "static");
        t
    }

    #[test]
    fn longest_registered_prefix_wins() {
        let t = tree();
        assert_eq!(t.get(["api", "v1", "users", "42"]), Some(&"users"));
        assert_eq!(t.get(["api", "v1", "users"]), Some(&"users"));
        assert_eq!(t.get(["api", "v1"]), Some(&"api"));
        assert_eq!(t.get(["api", "v2", "users"]), Some(&"api"));
        assert_eq!(t.get(["docs"]), None);
        assert_eq!(t.get(Vec::<&str>::new()), None);
    }

    #[test]
    fn root_value_is_the_fallback() {
        let mut t = tree();
        t.insert(Vec::<&str>::new(), "default");
        assert_eq!(t.get(["docs", "intro"]), Some(&"default"));
        assert_eq!(t.get(["static", "app.js"]), Some(&"static"));
    }

    #[test]
    fn insert_replaces_and_counts_once() {
        let mut t = tree();
        assert_eq!(t.len(), 3);
        assert_eq!(t.insert(["api"], "api2"), Some("api"));
        assert_eq!(t.len(), 3);
        assert!(t.contains(["api", "v1", "users"]));
        assert!(!t.contains(["api", "v1"]));
    }
}
