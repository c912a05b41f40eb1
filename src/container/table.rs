use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::key::Key;
use crate::provider::Provider;

pub(crate) type Candidates = SmallVec<[Arc<dyn Provider>; 2]>;

/// Ordered provider lists by key.
///
/// Explicit registrations are pushed to the front of their list, implicit
/// ones to the back. Resolution also files the provider it picked under
/// the request's own key so the next identical request is a single lookup.
#[derive(Default)]
pub(crate) struct ProviderTable {
    lists: HashMap<Key, Vec<Arc<dyn Provider>>, ahash::RandomState>,
    registered: Vec<Arc<dyn Provider>>,
    seen: HashSet<usize, ahash::RandomState>,
}

fn address(provider: &Arc<dyn Provider>) -> usize {
    Arc::as_ptr(provider) as *const () as usize
}

impl ProviderTable {
    pub(crate) fn candidates(&self, key: &Key) -> Option<Candidates> {
        self.lists
            .get(key)
            .filter(|list| !list.is_empty())
            .map(|list| list.iter().cloned().collect())
    }

    pub(crate) fn first_match(&self, keys: &[Key], mut accept: impl FnMut(&Arc<dyn Provider>) -> bool) -> Option<Arc<dyn Provider>> {
        keys.iter()
            .filter_map(|key| self.lists.get(key))
            .flat_map(|list| list.iter())
            .find(|provider| accept(provider))
            .cloned()
    }

    pub(crate) fn insert(&mut self, key: Key, provider: Arc<dyn Provider>, front: bool) {
        if self.seen.insert(address(&provider)) {
            self.registered.push(provider.clone());
        }
        let list = self.lists.entry(key).or_default();
        if front {
            list.insert(0, provider);
        } else {
            list.push(provider);
        }
    }

    /// Files `provider` as the only entry for `key` unless it already has one.
    pub(crate) fn cache(&mut self, key: Key, provider: Arc<dyn Provider>) {
        let list = self.lists.entry(key).or_default();
        if list.is_empty() {
            list.push(provider);
        }
    }

    /// Every provider once, in the order they were first inserted.
    pub(crate) fn unique_providers(&self) -> &[Arc<dyn Provider>] {
        &self.registered
    }

    pub(crate) fn len(&self) -> usize {
        self.lists.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::{Arg, Object};
    use crate::container::Container;
    use crate::error::DiResult;
    use crate::key::TypeTag;

    struct Fixed {
        explicit: bool,
    }

    impl Provider for Fixed {
        fn is_user_registered(&self) -> bool {
            self.explicit
        }

        fn can_invoke(&self, _ty: TypeTag, args: &[Arg]) -> bool {
            args.is_empty()
        }

        fn invoke(&self, _container: &Container, _ty: TypeTag, _args: &[Arg]) -> DiResult<Object> {
            Ok(Object::plain(self.explicit))
        }
    }

    fn key() -> Key {
        Key::simple("", TypeTag::of::<bool>())
    }

    #[test]
    fn explicit_providers_go_first() {
        let mut table = ProviderTable::default();
        table.insert(key(), Arc::new(Fixed { explicit: false }), false);
        table.insert(key(), Arc::new(Fixed { explicit: true }), true);

        let candidates = table.candidates(&key()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].is_user_registered());
    }

    #[test]
    fn shared_providers_are_listed_once() {
        let mut table = ProviderTable::default();
        let provider: Arc<dyn Provider> = Arc::new(Fixed { explicit: true });
        table.insert(key(), provider.clone(), true);
        table.insert(Key::simple("other", TypeTag::of::<bool>()), provider.clone(), true);
        table.cache(Key::simple("third", TypeTag::of::<bool>()), provider);

        assert_eq!(table.unique_providers().len(), 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn cache_never_replaces() {
        let mut table = ProviderTable::default();
        table.insert(key(), Arc::new(Fixed { explicit: true }), true);
        table.cache(key(), Arc::new(Fixed { explicit: false }));

        let candidates = table.candidates(&key()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].is_user_registered());
    }
}
