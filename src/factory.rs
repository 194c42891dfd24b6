use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{Equivalent, IndexMap};

use crate::config::{EvictionPolicy, FactoryConfig};
use crate::error::Error;
use crate::Result;

/// Creates results from an argument and caches them.
///
/// After the first call for an argument, every later call for the same
/// argument returns the same `Arc` without calling the production function
/// again, until the entry is evicted. A production that fails is not cached.
///
/// `F` is the production function itself, so the factory is `Send` whenever
/// `F` is, and `F` may borrow local data.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use convenience::CachingFactory;
///
/// let mut squares = CachingFactory::new(|n: &u64| n * n);
/// let first = squares.get(12);
/// assert_eq!(*first, 144);
/// assert!(Arc::ptr_eq(&first, &squares.get(12)));
/// ```
pub struct CachingFactory<A, R, F> {
    factory: F,
    cache:   Cache<A, R>,
}

impl<A, R, F> CachingFactory<A, R, F>
where
    A: Eq + Hash,
{
    /// Creates an unbounded factory with an infallible production function.
    pub fn new(factory: F) -> Self
    where
        F: FnMut(&A) -> R,
    {
        Self::with_config(factory, FactoryConfig::default())
    }

    /// Creates a factory with an infallible production function and the given cache settings.
    pub fn with_config(factory: F, config: FactoryConfig) -> Self
    where
        F: FnMut(&A) -> R,
    {
        Self { factory, cache: Cache::new(config) }
    }

    /// Creates an unbounded factory whose production function may fail.
    pub fn fallible<E>(factory: F) -> Self
    where
        F: FnMut(&A) -> Result<R, E>,
    {
        Self::fallible_with_config(factory, FactoryConfig::default())
    }

    /// Creates a factory whose production function may fail, with the given cache settings.
    pub fn fallible_with_config<E>(factory: F, config: FactoryConfig) -> Self
    where
        F: FnMut(&A) -> Result<R, E>,
    {
        Self { factory, cache: Cache::new(config) }
    }

    /// Creates a factory from a production function which may be absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use convenience::{CachingFactory, Error};
    ///
    /// let missing = CachingFactory::<i32, i32, _>::from_optional(None::<fn(&i32) -> i32>);
    /// assert_eq!(missing.unwrap_err(), Error::NullArgument("factory"));
    /// ```
    pub fn from_optional(factory: Option<F>) -> Result<Self>
    where
        F: FnMut(&A) -> R,
    {
        factory.map(Self::new).ok_or(Error::NullArgument("factory"))
    }

    /// Returns the result for `arg`, producing it on a cache miss.
    pub fn get(&mut self, arg: A) -> Arc<R>
    where
        F: FnMut(&A) -> R,
    {
        let factory = &mut self.factory;
        match self.cache.get_or_try_insert_with(arg, |arg| Ok::<R, Infallible>(factory(arg))) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Returns the result for `arg`, producing it on a cache miss.
    ///
    /// An error from the production function is returned as is and leaves
    /// the cache untouched.
    pub fn try_get<E>(&mut self, arg: A) -> Result<Arc<R>, E>
    where
        F: FnMut(&A) -> Result<R, E>,
    {
        let factory = &mut self.factory;
        self.cache.get_or_try_insert_with(arg, |arg| factory(arg))
    }

    /// Returns the cached result for `arg` without producing or touching recency.
    pub fn peek<Q>(&self, arg: &Q) -> Option<Arc<R>>
    where
        Q: ?Sized + Hash + Equivalent<A>,
    {
        self.cache.peek(arg)
    }

    /// Returns `true` if a result for `arg` is cached.
    #[inline]
    pub fn contains<Q>(&self, arg: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<A>,
    {
        self.cache.contains(arg)
    }

    /// Evicts the cached result for `arg`. The next lookup produces it again.
    pub fn evict<Q>(&mut self, arg: &Q) -> Option<Arc<R>>
    where
        Q: ?Sized + Hash + Equivalent<A>,
    {
        self.cache.evict(arg)
    }

    /// Evicts every cached result.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<A, R, F> CachingFactory<A, R, F> {
    /// Return the number of cached results.
    #[inline]
    pub fn len(&self) -> usize {
        self.cache.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.entries.is_empty()
    }

    /// Returns the cache settings.
    #[inline]
    pub fn config(&self) -> &FactoryConfig {
        &self.cache.config
    }
}

impl<A, R, F> fmt::Debug for CachingFactory<A, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingFactory")
            .field("len", &self.len())
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}

/// A [`CachingFactory`] taking two arguments.
///
/// Both arguments together form the cache key, so `get(1, 2)` and
/// `get(2, 1)` are different entries.
///
/// # Examples
///
/// ```
/// use convenience::CachingFactory2;
///
/// let mut join = CachingFactory2::new(|a: &String, b: &String| format!("{}{}", a, b));
/// assert_eq!(*join.get("foo".into(), "bar".into()), "foobar");
/// assert_eq!(join.len(), 1);
/// join.evict(&"foo".to_string(), &"bar".to_string());
/// assert!(join.is_empty());
/// ```
pub struct CachingFactory2<A1, A2, R, F> {
    factory: F,
    cache:   Cache<(A1, A2), R>,
}

impl<A1, A2, R, F> CachingFactory2<A1, A2, R, F>
where
    A1: Eq + Hash,
    A2: Eq + Hash,
{
    /// Creates an unbounded factory with an infallible production function.
    pub fn new(factory: F) -> Self
    where
        F: FnMut(&A1, &A2) -> R,
    {
        Self::with_config(factory, FactoryConfig::default())
    }

    /// Creates a factory with an infallible production function and the given cache settings.
    pub fn with_config(factory: F, config: FactoryConfig) -> Self
    where
        F: FnMut(&A1, &A2) -> R,
    {
        Self { factory, cache: Cache::new(config) }
    }

    /// Creates an unbounded factory whose production function may fail.
    pub fn fallible<E>(factory: F) -> Self
    where
        F: FnMut(&A1, &A2) -> Result<R, E>,
    {
        Self::fallible_with_config(factory, FactoryConfig::default())
    }

    /// Creates a factory whose production function may fail, with the given cache settings.
    pub fn fallible_with_config<E>(factory: F, config: FactoryConfig) -> Self
    where
        F: FnMut(&A1, &A2) -> Result<R, E>,
    {
        Self { factory, cache: Cache::new(config) }
    }

    /// Creates a factory from a production function which may be absent.
    pub fn from_optional(factory: Option<F>) -> Result<Self>
    where
        F: FnMut(&A1, &A2) -> R,
    {
        factory.map(Self::new).ok_or(Error::NullArgument("factory"))
    }

    /// Returns the result for `(a1, a2)`, producing it on a cache miss.
    pub fn get(&mut self, a1: A1, a2: A2) -> Arc<R>
    where
        F: FnMut(&A1, &A2) -> R,
    {
        let factory = &mut self.factory;
        match self.cache.get_or_try_insert_with((a1, a2), |(a1, a2)| Ok::<R, Infallible>(factory(a1, a2))) {
            Ok(result) => result,
            Err(never) => match never {},
        }
    }

    /// Returns the result for `(a1, a2)`, producing it on a cache miss.
    ///
    /// A production error is returned as is and nothing is cached.
    pub fn try_get<E>(&mut self, a1: A1, a2: A2) -> Result<Arc<R>, E>
    where
        F: FnMut(&A1, &A2) -> Result<R, E>,
    {
        let factory = &mut self.factory;
        self.cache.get_or_try_insert_with((a1, a2), |(a1, a2)| factory(a1, a2))
    }

    /// Returns the cached result for `(a1, a2)` without producing or touching recency.
    pub fn peek(&self, a1: &A1, a2: &A2) -> Option<Arc<R>> {
        self.cache.peek(&KeyRef(a1, a2))
    }

    /// Returns `true` if a result for `(a1, a2)` is cached.
    pub fn contains(&self, a1: &A1, a2: &A2) -> bool {
        self.cache.contains(&KeyRef(a1, a2))
    }

    /// Evicts the cached result for `(a1, a2)`.
    pub fn evict(&mut self, a1: &A1, a2: &A2) -> Option<Arc<R>> {
        self.cache.evict(&KeyRef(a1, a2))
    }

    /// Evicts every cached result.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl<A1, A2, R, F> CachingFactory2<A1, A2, R, F> {
    /// Return the number of cached results.
    #[inline]
    pub fn len(&self) -> usize {
        self.cache.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cache.entries.is_empty()
    }

    /// Returns the cache settings.
    #[inline]
    pub fn config(&self) -> &FactoryConfig {
        &self.cache.config
    }
}

impl<A1, A2, R, F> fmt::Debug for CachingFactory2<A1, A2, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingFactory2")
            .field("len", &self.len())
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}

/// Result store shared by both factories.
struct Cache<K, R> {
    entries: IndexMap<K, Arc<R>>,
    config:  FactoryConfig,
}

impl<K, R> Cache<K, R>
where
    K: Eq + Hash,
{
    fn new(config: FactoryConfig) -> Self {
        Self { entries: IndexMap::new(), config }
    }

    fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        produce: impl FnOnce(&K) -> Result<R, E>,
    ) -> Result<Arc<R>, E> {
        if let Some(index) = self.entries.get_index_of(&key) {
            tracing::trace!(len = self.entries.len(), "factory hit");
            let index = match self.config.policy {
                EvictionPolicy::Lru => {
                    let last = self.entries.len() - 1;
                    self.entries.move_index(index, last);
                    last
                }
                EvictionPolicy::Fifo => index,
            };
            return Ok(Arc::clone(&self.entries[index]));
        }

        tracing::trace!(len = self.entries.len(), "factory miss");
        let result = match produce(&key) {
            Ok(result) => Arc::new(result),
            Err(err) => {
                tracing::debug!("factory production failed");
                return Err(err);
            }
        };
        if self.config.is_full(self.entries.len()) {
            self.entries.shift_remove_index(0);
            tracing::debug!(policy = ?self.config.policy, len = self.entries.len(), "factory evicted entry at capacity");
        }
        self.entries.insert(key, Arc::clone(&result));
        Ok(result)
    }

    fn peek<Q>(&self, key: &Q) -> Option<Arc<R>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.get(key).cloned()
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.contains_key(key)
    }

    fn evict<Q>(&mut self, key: &Q) -> Option<Arc<R>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        // Insertion order only matters to a bounded cache.
        let evicted = if self.config.capacity.is_some() {
            self.entries.shift_remove(key)
        } else {
            self.entries.swap_remove(key)
        };
        if evicted.is_some() {
            tracing::trace!(len = self.entries.len(), "factory evicted entry");
        }
        evicted
    }

    fn clear(&mut self) {
        tracing::debug!(len = self.entries.len(), "factory cleared");
        self.entries.clear();
    }
}

/// Borrowed form of a `(A1, A2)` key. Hashes exactly like the tuple.
struct KeyRef<'a, A1, A2>(&'a A1, &'a A2);

impl<A1: Hash, A2: Hash> Hash for KeyRef<'_, A1, A2> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

impl<A1: Eq, A2: Eq> Equivalent<(A1, A2)> for KeyRef<'_, A1, A2> {
    fn equivalent(&self, key: &(A1, A2)) -> bool {
        *self.0 == key.0 && *self.1 == key.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::hash_map::DefaultHasher;
    use std::num::NonZeroUsize;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Foo {
        arg: i32,
    }

    fn counted(count: &Rc<Cell<usize>>) -> impl FnMut(&i32) -> Foo {
        let count = Rc::clone(count);
        move |&arg| {
            count.set(count.get() + 1);
            Foo { arg }
        }
    }

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn result_is_created_only_once() {
        let count = Rc::new(Cell::new(0));
        let mut factory = CachingFactory::new(counted(&count));

        let foo1 = factory.get(1);
        for _ in 0..10 {
            assert!(Arc::ptr_eq(&foo1, &factory.get(1)));
        }
        assert_eq!(count.get(), 1);
        assert_eq!(foo1.arg, 1);

        for _ in 0..11 {
            factory.get(2);
        }
        assert_eq!(count.get(), 2);

        assert!(factory.evict(&1).is_some());
        assert!(factory.evict(&1).is_none());
        let foo3 = factory.get(1);
        assert_eq!(count.get(), 3);
        assert!(!Arc::ptr_eq(&foo1, &foo3));
    }

    #[test]
    fn two_arg_factory_result_is_created_only_once() {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let mut factory = CachingFactory2::new(move |&a1: &i32, &a2: &i32| {
            counter.set(counter.get() + 1);
            Foo { arg: a1 * 10 + a2 }
        });

        let foo1 = factory.get(1, 2);
        for _ in 0..10 {
            assert!(Arc::ptr_eq(&foo1, &factory.get(1, 2)));
        }
        assert_eq!(count.get(), 1);

        for _ in 0..11 {
            factory.get(3, 4);
        }
        assert_eq!(count.get(), 2);
        assert_eq!(factory.get(2, 1).arg, 21);
        assert_eq!(count.get(), 3);

        assert!(factory.contains(&1, &2));
        assert!(factory.evict(&1, &2).is_some());
        assert!(!factory.contains(&1, &2));
        factory.get(1, 2);
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn two_arg_factory_peek_and_clear() {
        let mut factory = CachingFactory2::new(|a: &i32, b: &i32| a * b);
        assert_eq!(factory.peek(&2, &3), None);
        let six = factory.get(2, 3);
        assert!(Arc::ptr_eq(&factory.peek(&2, &3).unwrap(), &six));
        assert_eq!(factory.peek(&3, &2), None);
        assert_eq!(factory.len(), 1);
        assert_eq!(factory.config(), &FactoryConfig::unbounded());

        factory.clear();
        assert!(factory.is_empty());
        assert_eq!(factory.peek(&2, &3), None);
    }

    #[test]
    fn two_arg_factory_lru_capacity() {
        let config = FactoryConfig::bounded(capacity(2)).with_policy(EvictionPolicy::Lru);
        let mut factory = CachingFactory2::with_config(|a: &i32, b: &i32| a + b, config);
        factory.get(1, 1);
        factory.get(2, 2);
        factory.get(1, 1);
        factory.get(3, 3);
        assert_eq!(factory.len(), 2);
        assert!(factory.contains(&1, &1));
        assert!(!factory.contains(&2, &2));
        assert_eq!(factory.peek(&3, &3).as_deref(), Some(&6));
        assert_eq!(factory.config(), &config);
    }

    #[test]
    fn failed_production_is_not_cached() {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let mut factory = CachingFactory::fallible(move |&n: &i32| {
            counter.set(counter.get() + 1);
            if n < 0 { Err(format!("negative: {}", n)) } else { Ok(n * 2) }
        });

        assert_eq!(factory.try_get(-1).unwrap_err(), "negative: -1");
        assert!(!factory.contains(&-1));
        assert!(factory.is_empty());
        assert!(factory.try_get(-1).is_err());
        assert_eq!(count.get(), 2);

        assert_eq!(*factory.try_get(4).unwrap(), 8);
        assert_eq!(*factory.try_get(4).unwrap(), 8);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn from_optional() {
        assert_eq!(
            CachingFactory::<i32, i32, _>::from_optional(None::<fn(&i32) -> i32>).unwrap_err(),
            Error::NullArgument("factory"));
        assert_eq!(
            CachingFactory2::<i32, i32, i32, _>::from_optional(None::<fn(&i32, &i32) -> i32>).unwrap_err(),
            Error::NullArgument("factory"));
        let mut factory = CachingFactory::from_optional(Some(|n: &i32| n + 1)).unwrap();
        assert_eq!(*factory.get(1), 2);
    }

    #[test]
    fn fifo_capacity() {
        let count = Rc::new(Cell::new(0));
        let mut factory = CachingFactory::with_config(counted(&count), FactoryConfig::bounded(capacity(2)));
        factory.get(1);
        factory.get(2);
        factory.get(1);
        factory.get(3);
        assert_eq!(factory.len(), 2);
        assert!(!factory.contains(&1));
        assert!(factory.contains(&2));
        assert!(factory.contains(&3));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn lru_capacity() {
        let count = Rc::new(Cell::new(0));
        let config = FactoryConfig::bounded(capacity(2)).with_policy(EvictionPolicy::Lru);
        let mut factory = CachingFactory::with_config(counted(&count), config);
        factory.get(1);
        factory.get(2);
        factory.get(1);
        factory.get(3);
        assert_eq!(factory.len(), 2);
        assert!(factory.contains(&1));
        assert!(!factory.contains(&2));
        assert!(factory.peek(&3).is_some());
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn borrows_local_data() {
        let table = vec![10, 20, 30];
        let mut factory = CachingFactory::new(|i: &usize| table[*i]);
        assert_eq!(*factory.get(1), 20);
        assert_eq!(*factory.get(2), 30);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn key_ref_hashes_like_tuple() {
        fn hash<T: Hash + ?Sized>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }
        let key = (String::from("foo"), 42u8);
        assert_eq!(hash(&key), hash(&KeyRef(&key.0, &key.1)));
        assert!(KeyRef(&key.0, &key.1).equivalent(&key));
        assert!(!KeyRef(&String::from("bar"), &42u8).equivalent(&key));
    }

    #[test]
    fn debug() {
        let factory = CachingFactory::new(|n: &i32| *n);
        assert_eq!(
            format!("{:?}", factory),
            "CachingFactory { len: 0, config: FactoryConfig { capacity: None, policy: Fifo }, .. }");

        let mut factory = CachingFactory2::with_config(|a: &i32, b: &i32| a - b, FactoryConfig::bounded(capacity(4)));
        factory.get(3, 1);
        assert_eq!(
            format!("{:?}", factory),
            "CachingFactory2 { len: 1, config: FactoryConfig { capacity: Some(4), policy: Fifo }, .. }");
    }
}
