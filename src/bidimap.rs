use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::{map, IndexMap};

use crate::error::{Error, Side};
use crate::Result;

/// A one-to-one map which can be looked up by either member of a pair.
///
/// Every first member is unique across the map and so is every second
/// member. Both members are stored once and shared by the two indices, so
/// neither needs to be `Clone`.
///
/// # Examples
///
/// ```
/// use convenience::BidiMap;
///
/// let mut map: BidiMap<&str, &str> = BidiMap::new();
/// map.add_by_first("foo", "bar").unwrap();
/// assert_eq!(map.get_by_first(&"foo"), Ok(&"bar"));
/// assert_eq!(map.get_by_second(&"bar"), Ok(&"foo"));
/// assert!(map.add_by_first("foo", "baz").is_err());
/// ```
pub struct BidiMap<A, B> {
    key_value: IndexMap<Arc<A>, Arc<B>>,
    value_key: HashMap<Arc<B>, Arc<A>>,
}

impl<A, B> BidiMap<A, B> {
    /// Creates an empty map.
    #[inline]
    pub fn new() -> Self {
        Self {
            key_value: IndexMap::new(),
            value_key: HashMap::new(),
        }
    }

    /// Creates an empty map with room for at least `capacity` pairs.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            key_value: IndexMap::with_capacity(capacity),
            value_key: HashMap::with_capacity(capacity),
        }
    }

    /// Return the number of pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.key_value.len()
    }

    /// Returns `true` if the map holds no pairs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_value.is_empty()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        tracing::debug!(len = self.len(), "bidimap cleared");
        self.key_value.clear();
        self.value_key.clear();
    }

    /// Iterates over all pairs as `(first, second)`.
    ///
    /// Each pair is visited exactly once. The order follows insertion until
    /// a pair is removed, after which it is unspecified.
    #[inline]
    pub fn iter(&self) -> Iter<'_, A, B> {
        Iter { inner: self.key_value.iter() }
    }

    /// Iterates over the first members.
    pub fn firsts(&self) -> impl Iterator<Item = &A> + '_ {
        self.key_value.keys().map(Deref::deref)
    }

    /// Iterates over the second members, in the same order as [`iter`](Self::iter).
    pub fn seconds(&self) -> impl Iterator<Item = &B> + '_ {
        self.key_value.values().map(Deref::deref)
    }
}

impl<A, B> BidiMap<A, B>
where
    A: Eq + Hash,
    B: Eq + Hash,
{
    /// Builds a map from two parallel sequences, pairing elements by position.
    ///
    /// Both sequences must have the same length and must not contain `None`.
    /// This is checked before anything is added.
    ///
    /// # Examples
    ///
    /// ```
    /// use convenience::{BidiMap, Error};
    ///
    /// let map: BidiMap<&str, i32> = BidiMap::from_parallel(["a", "b"], [1, 2]).unwrap();
    /// assert_eq!(map.get_by_second(&2), Ok(&"b"));
    ///
    /// let err = BidiMap::<&str, i32>::from_parallel([Some("a"), None], [1, 2]);
    /// assert!(matches!(err, Err(Error::Argument(_))));
    /// ```
    pub fn from_parallel<I, J, T, U>(firsts: I, seconds: J) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        J: IntoIterator<Item = U>,
        T: Into<Option<A>>,
        U: Into<Option<B>>,
    {
        let firsts: Vec<Option<A>> = firsts.into_iter().map(Into::into).collect();
        let seconds: Vec<Option<B>> = seconds.into_iter().map(Into::into).collect();
        if firsts.len() != seconds.len() {
            return Err(Error::Argument(format!(
                "collections of firsts and seconds must have same number of elements ({} != {})",
                firsts.len(),
                seconds.len()
            )));
        }
        if firsts.iter().any(Option::is_none) || seconds.iter().any(Option::is_none) {
            return Err(Error::Argument(
                "collections of firsts and seconds must not contain null values".to_string(),
            ));
        }

        let mut map = Self::with_capacity(firsts.len());
        for (first, second) in firsts.into_iter().zip(seconds) {
            map.add_by_first(first, second)?;
        }
        Ok(map)
    }

    /// Builds a map from `(first, second)` pairs, failing on the first duplicate.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
    {
        let pairs = pairs.into_iter();
        let mut map = Self::with_capacity(pairs.size_hint().0);
        for (first, second) in pairs {
            map.add_by_first(first, second)?;
        }
        Ok(map)
    }

    /// Adds a new pair.
    ///
    /// Fails if either member is `None`, if `first` is already a first
    /// member or if `second` is already a second member. The map is left
    /// unchanged on failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use convenience::{BidiMap, Error, Side};
    ///
    /// let mut map: BidiMap<&str, &str> = BidiMap::new();
    /// assert_eq!(map.add_by_first("foo", "bar"), Ok(()));
    /// assert_eq!(map.add_by_first("foo", "baz"), Err(Error::DuplicateKey(Side::First)));
    /// assert_eq!(map.add_by_first("qux", "bar"), Err(Error::DuplicateKey(Side::Second)));
    /// assert_eq!(map.add_by_first(None, "baz"),  Err(Error::NullArgument("first")));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn add_by_first(&mut self, first: impl Into<Option<A>>, second: impl Into<Option<B>>) -> Result<()> {
        let first  = first .into().ok_or(Error::NullArgument("first"))?;
        let second = second.into().ok_or(Error::NullArgument("second"))?;
        if self.key_value.contains_key(&first) {
            return Err(Error::DuplicateKey(Side::First));
        }
        if self.value_key.contains_key(&second) {
            return Err(Error::DuplicateKey(Side::Second));
        }
        self.link(first, second);
        Ok(())
    }

    /// Adds a new pair, keyed by its second member.
    ///
    /// Same as [`add_by_first`](Self::add_by_first) with the arguments
    /// swapped. The second index is checked first.
    pub fn add_by_second(&mut self, second: impl Into<Option<B>>, first: impl Into<Option<A>>) -> Result<()> {
        let second = second.into().ok_or(Error::NullArgument("second"))?;
        let first  = first .into().ok_or(Error::NullArgument("first"))?;
        if self.value_key.contains_key(&second) {
            return Err(Error::DuplicateKey(Side::Second));
        }
        if self.key_value.contains_key(&first) {
            return Err(Error::DuplicateKey(Side::First));
        }
        self.link(first, second);
        Ok(())
    }

    /// Shorthand for [`add_by_first`](Self::add_by_first).
    #[inline]
    pub fn insert(&mut self, first: A, second: B) -> Result<()> {
        self.add_by_first(first, second)
    }

    /// Pairs `first` with `second`, replacing whatever either was paired with.
    ///
    /// The pair holding `first` and the pair holding `second` are removed
    /// from both indices before the new pair is added. Returns the removed
    /// pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use convenience::BidiMap;
    ///
    /// let mut map = BidiMap::new();
    /// map.insert(1, 'a').unwrap();
    /// map.insert(2, 'b').unwrap();
    /// assert_eq!(map.set_by_first(1, 'b'), Ok(vec![(1, 'a'), (2, 'b')]));
    /// assert_eq!(map.get_by_second(&'b'), Ok(&1));
    /// assert!(!map.contains_second(&'a'));
    /// assert!(!map.contains_first(&2));
    /// ```
    pub fn set_by_first(&mut self, first: impl Into<Option<A>>, second: impl Into<Option<B>>) -> Result<Vec<(A, B)>> {
        let first  = first .into().ok_or(Error::NullArgument("first"))?;
        let second = second.into().ok_or(Error::NullArgument("second"))?;
        let mut displaced = Vec::new();
        displaced.extend(self.remove_by_first(&first));
        displaced.extend(self.remove_by_second(&second));
        self.link(first, second);
        Ok(displaced)
    }

    /// Pairs `second` with `first`, replacing whatever either was paired with.
    ///
    /// Same as [`set_by_first`](Self::set_by_first) with the arguments swapped.
    pub fn set_by_second(&mut self, second: impl Into<Option<B>>, first: impl Into<Option<A>>) -> Result<Vec<(A, B)>> {
        let second = second.into().ok_or(Error::NullArgument("second"))?;
        let first  = first .into().ok_or(Error::NullArgument("first"))?;
        let mut displaced = Vec::new();
        displaced.extend(self.remove_by_second(&second));
        displaced.extend(self.remove_by_first(&first));
        self.link(first, second);
        Ok(displaced)
    }

    /// Returns the second member paired with `first`.
    #[inline]
    pub fn get_by_first(&self, first: &A) -> Result<&B> {
        self.try_get_by_first(first).ok_or(Error::KeyNotFound(Side::First))
    }

    /// Returns the first member paired with `second`.
    #[inline]
    pub fn get_by_second(&self, second: &B) -> Result<&A> {
        self.try_get_by_second(second).ok_or(Error::KeyNotFound(Side::Second))
    }

    /// Returns the second member paired with `first`, or `None`.
    #[inline]
    pub fn try_get_by_first(&self, first: &A) -> Option<&B> {
        self.key_value.get(first).map(Deref::deref)
    }

    /// Returns the first member paired with `second`, or `None`.
    #[inline]
    pub fn try_get_by_second(&self, second: &B) -> Option<&A> {
        self.value_key.get(second).map(Deref::deref)
    }

    /// Returns `true` if `first` is the first member of a pair.
    #[inline]
    pub fn contains_first(&self, first: &A) -> bool {
        self.key_value.contains_key(first)
    }

    /// Returns `true` if `second` is the second member of a pair.
    #[inline]
    pub fn contains_second(&self, second: &B) -> bool {
        self.value_key.contains_key(second)
    }

    /// Removes the pair whose first member is `first`, if any.
    pub fn remove_by_first(&mut self, first: &A) -> Option<(A, B)> {
        let (a, b) = self.key_value.swap_remove_entry(first)?;
        self.value_key.remove(&*b);
        tracing::trace!(side = %Side::First, len = self.len(), "bidimap removed pair");
        Some((Arc::into_inner(a)?, Arc::into_inner(b)?))
    }

    /// Removes the pair whose second member is `second`, if any.
    pub fn remove_by_second(&mut self, second: &B) -> Option<(A, B)> {
        let (b, a) = self.value_key.remove_entry(second)?;
        self.key_value.swap_remove(&*a);
        tracing::trace!(side = %Side::Second, len = self.len(), "bidimap removed pair");
        Some((Arc::into_inner(a)?, Arc::into_inner(b)?))
    }

    fn link(&mut self, first: A, second: B) {
        let a = Arc::new(first);
        let b = Arc::new(second);
        self.key_value.insert(a.clone(), b.clone());
        self.value_key.insert(b, a);
        debug_assert_eq!(self.key_value.len(), self.value_key.len());
        tracing::trace!(len = self.len(), "bidimap linked pair");
    }
}

impl<A, B> Default for BidiMap<A, B> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// Fresh `Arc`s per clone: the indices must stay the sole owners of their members.
impl<A, B> Clone for BidiMap<A, B>
where
    A: Clone + Eq + Hash,
    B: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        let mut map = Self::with_capacity(self.len());
        for (first, second) in self.iter() {
            map.link(first.clone(), second.clone());
        }
        map
    }
}

impl<A, B> fmt::Debug for BidiMap<A, B>
where
    A: fmt::Debug,
    B: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<A, B> PartialEq for BidiMap<A, B>
where
    A: Eq + Hash,
    B: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(first, second)| other.try_get_by_first(first) == Some(second))
    }
}

impl<A: Eq + Hash, B: Eq + Hash> Eq for BidiMap<A, B> {}

/// Iterator over the pairs of a [`BidiMap`].
pub struct Iter<'a, A, B> {
    inner: map::Iter<'a, Arc<A>, Arc<B>>,
}

impl<A, B> Clone for Iter<'_, A, B> {
    #[inline]
    fn clone(&self) -> Self {
        Iter { inner: self.inner.clone() }
    }
}

impl<'a, A, B> Iterator for Iter<'a, A, B> {
    type Item = (&'a A, &'a B);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(a, b)| (&**a, &**b))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, B> ExactSizeIterator for Iter<'_, A, B> {}
impl<A, B> FusedIterator for Iter<'_, A, B> {}

impl<'a, A, B> IntoIterator for &'a BidiMap<A, B> {
    type Item = (&'a A, &'a B);
    type IntoIter = Iter<'a, A, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over the pairs of a [`BidiMap`].
pub struct IntoIter<A, B> {
    inner: map::IntoIter<Arc<A>, Arc<B>>,
}

impl<A, B> Iterator for IntoIter<A, B> {
    type Item = (A, B);

    fn next(&mut self) -> Option<Self::Item> {
        let (a, b) = self.inner.next()?;
        Some((Arc::into_inner(a)?, Arc::into_inner(b)?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, B> ExactSizeIterator for IntoIter<A, B> {}
impl<A, B> FusedIterator for IntoIter<A, B> {}

impl<A, B> IntoIterator for BidiMap<A, B> {
    type Item = (A, B);
    type IntoIter = IntoIter<A, B>;

    fn into_iter(self) -> Self::IntoIter {
        let BidiMap { key_value, value_key } = self;
        // Drop the backward index so the forward one holds the only references.
        drop(value_key);
        IntoIter { inner: key_value.into_iter() }
    }
}

/// Builds a [`BidiMap`] from `first => second` pairs.
///
/// Evaluates to a [`Result`](crate::Result) which is an error if a member
/// occurs twice.
///
/// ```
/// use convenience::prelude::*;
///
/// let map = bidimap! { "one" => 1, "two" => 2 }.unwrap();
/// assert_eq!(map.get_by_second(&2), Ok(&"two"));
/// assert!(bidimap! { "one" => 1, "uno" => 1 }.is_err());
/// ```
#[macro_export]
macro_rules! bidimap {
    ( $( $first:expr => $second:expr ),+ $(,)? ) => {
        $crate::BidiMap::try_from_pairs(vec![ $( ($first, $second) ),+ ])
    };
}

#[cfg(feature = "serde")]
mod serde_impl {
    use std::fmt;
    use std::hash::Hash;
    use std::marker::PhantomData;

    use serde_sys::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};
    use serde_sys::ser::{Serialize, SerializeSeq, Serializer};

    use super::BidiMap;

    impl<A, B> Serialize for BidiMap<A, B>
    where
        A: Serialize,
        B: Serialize,
    {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for pair in self.iter() {
                seq.serialize_element(&pair)?;
            }
            seq.end()
        }
    }

    impl<'de, A, B> Deserialize<'de> for BidiMap<A, B>
    where
        A: Deserialize<'de> + Eq + Hash,
        B: Deserialize<'de> + Eq + Hash,
    {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_seq(PairsVisitor(PhantomData))
        }
    }

    struct PairsVisitor<A, B>(PhantomData<fn() -> (A, B)>);

    impl<'de, A, B> Visitor<'de> for PairsVisitor<A, B>
    where
        A: Deserialize<'de> + Eq + Hash,
        B: Deserialize<'de> + Eq + Hash,
    {
        type Value = BidiMap<A, B>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a sequence of pairs")
        }

        fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
            let mut map = BidiMap::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
            while let Some((first, second)) = seq.next_element::<(A, B)>()? {
                map.add_by_first(first, second).map_err(de::Error::custom)?;
            }
            Ok(map)
        }
    }
}
