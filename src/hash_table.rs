use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::fmt::Debug;
use core::mem;

use crate::linked_list::LinkedList;
use crate::memory::Blob;
use crate::memory::HeapMemory;
use crate::memory::Memory;
use crate::policy::HashFn;
use crate::policy::OrderFn;

type Chain = Option<Box<Entry>>;

struct Entry {
    key: Blob,
    value: Blob,
    next: Chain,
}

/// Walks `link` to the first entry whose key is not ordered strictly before
/// `key`, returning the link that holds it (or the chain's end link).
fn sorted_position<'a>(link: &'a mut Chain, order: OrderFn, key: &[u8]) -> &'a mut Chain {
    let mut link = link;
    loop {
        // Match by reference so the borrow ends with the match; on the
        // continue case re-borrow the successor link afterward. This is the
        // standard workaround for the borrow checker not yet accepting the
        // direct move-into-match form.
        match link {
            Some(entry) if order(entry.key.as_bytes(), key) == Ordering::Less => {}
            _ => return link,
        }
        link = &mut link.as_mut().unwrap().next;
    }
}

/// A type-erased key/value table using separate chaining over a fixed set of
/// buckets.
///
/// Keys and values are arbitrary byte payloads. All behavior is injected at
/// creation: a [`HashFn`] selects buckets (and defines key validity: any key
/// hashing to `<= 0` is invalid and silently rejected), an [`OrderFn`] per
/// payload kind defines sort order and equality, and a [`Memory`] policy per
/// payload kind owns allocation. Within a bucket, entries are kept strictly
/// sorted by key order, so scans stop early at the first entry ordering at or
/// after the probe key.
///
/// The bucket count is fixed for the table's lifetime; there is no
/// rehashing.
///
/// # Examples
///
/// ```rust
/// use chain_table::HashTable;
/// use chain_table::policy::hash_i32;
/// use chain_table::policy::order_bytes;
/// use chain_table::policy::order_i32;
///
/// let mut table = HashTable::with_heap(17, order_i32, order_bytes, hash_i32);
///
/// table.insert(&3i32.to_ne_bytes(), b"three");
/// table.insert(&7i32.to_ne_bytes(), b"seven");
/// assert_eq!(table.len(), 2);
///
/// let value = table.lookup(&3i32.to_ne_bytes()).unwrap();
/// assert_eq!(&value[..], b"three");
///
/// // Re-inserting an existing key overwrites its value in place.
/// table.insert(&3i32.to_ne_bytes(), b"Wobba!");
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.lookup(&3i32.to_ne_bytes()).as_deref(), Some(&b"Wobba!"[..]));
/// ```
pub struct HashTable {
    buckets: Vec<Chain>,
    order_keys: OrderFn,
    order_values: OrderFn,
    hash: HashFn,
    key_memory: Rc<dyn Memory>,
    value_memory: Rc<dyn Memory>,
    size: usize,
}

impl HashTable {
    /// Creates an empty table with `bucket_count` buckets and the given
    /// policies.
    ///
    /// `order_keys` defines chain order and key equality, `order_values` is
    /// used only by [`has_value`], `hash` selects buckets and defines key
    /// validity, and the two [`Memory`] policies own key and value storage
    /// respectively.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    ///
    /// [`has_value`]: HashTable::has_value
    pub fn new(
        bucket_count: usize,
        order_keys: OrderFn,
        order_values: OrderFn,
        hash: HashFn,
        key_memory: Rc<dyn Memory>,
        value_memory: Rc<dyn Memory>,
    ) -> Self {
        assert!(bucket_count > 0, "a table needs at least one bucket");
        HashTable {
            buckets: (0..bucket_count).map(|_| None).collect(),
            order_keys,
            order_values,
            hash,
            key_memory,
            value_memory,
            size: 0,
        }
    }

    /// Creates an empty table backed by [`HeapMemory`] for both keys and
    /// values.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn with_heap(
        bucket_count: usize,
        order_keys: OrderFn,
        order_values: OrderFn,
        hash: HashFn,
    ) -> Self {
        Self::new(
            bucket_count,
            order_keys,
            order_values,
            hash,
            Rc::new(HeapMemory),
            Rc::new(HeapMemory),
        )
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the table holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of buckets, fixed at creation.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_of(&self, key: &[u8]) -> Option<usize> {
        let hash = (self.hash)(key);
        if hash <= 0 {
            return None;
        }
        Some(hash as usize % self.buckets.len())
    }

    /// All live entries, bucket order then chain order.
    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.buckets.iter().flat_map(|bucket| {
            let mut link = bucket.as_deref();
            core::iter::from_fn(move || {
                let entry = link?;
                link = entry.next.as_deref();
                Some(entry)
            })
        })
    }

    /// Maps `key` to a copy of `value`.
    ///
    /// If the key is invalid (`hash(key) <= 0`) this is a no-op. If an entry
    /// with an equal key exists, its value storage is replaced through the
    /// value memory policy and the entry (and key storage) is otherwise
    /// untouched; the entry count does not change. Otherwise both payloads
    /// are copied in and a new entry is spliced into its sorted chain
    /// position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_table::HashTable;
    /// use chain_table::policy::hash_i32;
    /// use chain_table::policy::order_bytes;
    /// use chain_table::policy::order_i32;
    ///
    /// let mut table = HashTable::with_heap(17, order_i32, order_bytes, hash_i32);
    /// table.insert(&1i32.to_ne_bytes(), b"one");
    /// assert_eq!(table.len(), 1);
    ///
    /// // `hash_i32` maps 0 to an invalid hash, so this key is ignored.
    /// table.insert(&0i32.to_ne_bytes(), b"zero");
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        let Some(bucket) = self.bucket_of(key) else {
            return;
        };
        let order = self.order_keys;
        let link = sorted_position(&mut self.buckets[bucket], order, key);
        match link {
            Some(entry) if order(entry.key.as_bytes(), key) == Ordering::Equal => {
                let replaced = mem::replace(&mut entry.value, self.value_memory.allocate(value));
                self.value_memory.release(replaced);
            }
            slot => {
                let entry = Box::new(Entry {
                    key: self.key_memory.allocate(key),
                    value: self.value_memory.allocate(value),
                    next: slot.take(),
                });
                *slot = Some(entry);
                self.size += 1;
            }
        }
    }

    /// Returns a fresh copy of the value mapped to `key`, allocated through
    /// the value memory policy. The caller owns the copy.
    ///
    /// Returns `None` for an absent key, and equally for an invalid one.
    pub fn lookup(&self, key: &[u8]) -> Option<Blob> {
        let bucket = self.bucket_of(key)?;
        let mut link = self.buckets[bucket].as_deref();
        while let Some(entry) = link {
            match (self.order_keys)(entry.key.as_bytes(), key) {
                Ordering::Less => link = entry.next.as_deref(),
                Ordering::Equal => {
                    return Some(self.value_memory.allocate(entry.value.as_bytes()));
                }
                Ordering::Greater => break,
            }
        }
        None
    }

    /// Removes the entry for `key`, transferring its value storage to the
    /// caller.
    ///
    /// The entry's key storage is released through the key memory policy;
    /// the returned [`Blob`] is the entry's own value allocation, not a
    /// copy. Returns `None` (and mutates nothing) for an absent or invalid
    /// key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_table::HashTable;
    /// use chain_table::policy::hash_i32;
    /// use chain_table::policy::order_bytes;
    /// use chain_table::policy::order_i32;
    ///
    /// let mut table = HashTable::with_heap(17, order_i32, order_bytes, hash_i32);
    /// table.insert(&5i32.to_ne_bytes(), b"five");
    ///
    /// let value = table.remove(&5i32.to_ne_bytes()).unwrap();
    /// assert_eq!(&value[..], b"five");
    /// assert_eq!(table.remove(&5i32.to_ne_bytes()), None);
    /// ```
    pub fn remove(&mut self, key: &[u8]) -> Option<Blob> {
        let bucket = self.bucket_of(key)?;
        let order = self.order_keys;
        let link = sorted_position(&mut self.buckets[bucket], order, key);
        let found = link
            .as_ref()
            .is_some_and(|entry| order(entry.key.as_bytes(), key) == Ordering::Equal);
        if !found {
            return None;
        }
        let entry = link.take().expect("presence checked above");
        let Entry {
            key: stored_key,
            value,
            next,
        } = *entry;
        *link = next;
        self.key_memory.release(stored_key);
        self.size -= 1;
        Some(value)
    }

    /// Builds a list holding a copy of every key, bucket order then chain
    /// order.
    ///
    /// The list shares the table's key memory policy. Called together with
    /// [`values`] on an unmodified table, the two lists pair up index by
    /// index.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_table::HashTable;
    /// use chain_table::policy::hash_i32;
    /// use chain_table::policy::order_bytes;
    /// use chain_table::policy::order_i32;
    ///
    /// let mut table = HashTable::with_heap(17, order_i32, order_bytes, hash_i32);
    /// table.insert(&1i32.to_ne_bytes(), b"one");
    /// table.insert(&2i32.to_ne_bytes(), b"two");
    ///
    /// let keys = table.keys();
    /// let values = table.values();
    /// for (key, value) in keys.iter().zip(values.iter()) {
    ///     assert_eq!(table.lookup(key).as_deref(), Some(value));
    /// }
    /// ```
    ///
    /// [`values`]: HashTable::values
    pub fn keys(&self) -> LinkedList {
        let mut keys = LinkedList::new(Rc::clone(&self.key_memory));
        for entry in self.entries() {
            keys.append(entry.key.as_bytes());
        }
        keys
    }

    /// Builds a list holding a copy of every value, in the same entry order
    /// as [`keys`].
    ///
    /// The list shares the table's value memory policy.
    ///
    /// [`keys`]: HashTable::keys
    pub fn values(&self) -> LinkedList {
        let mut values = LinkedList::new(Rc::clone(&self.value_memory));
        for entry in self.entries() {
            values.append(entry.value.as_bytes());
        }
        values
    }

    /// Returns `true` if some entry's key compares equal to `key` under the
    /// key order function. Full table scan.
    pub fn has_key(&self, key: &[u8]) -> bool {
        self.entries()
            .any(|entry| (self.order_keys)(entry.key.as_bytes(), key) == Ordering::Equal)
    }

    /// Returns `true` if some entry's value compares equal to `value` under
    /// the value order function. Full table scan.
    pub fn has_value(&self, value: &[u8]) -> bool {
        self.entries()
            .any(|entry| (self.order_values)(entry.value.as_bytes(), value) == Ordering::Equal)
    }

    /// Returns `true` if `predicate` holds for every `(key, value)` entry.
    /// Vacuously true on an empty table; stops at the first failure.
    pub fn all<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&[u8], &[u8]) -> bool,
    {
        self.entries()
            .all(|entry| predicate(entry.key.as_bytes(), entry.value.as_bytes()))
    }

    /// Returns `true` if `predicate` holds for some `(key, value)` entry.
    /// False on an empty table; stops at the first success.
    pub fn any<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&[u8], &[u8]) -> bool,
    {
        self.entries()
            .any(|entry| predicate(entry.key.as_bytes(), entry.value.as_bytes()))
    }

    /// Invokes `apply` on every entry, bucket order then chain order.
    ///
    /// The closure receives the key and the entry's owned value storage, and
    /// may replace the value with a different allocation, of any size; the
    /// replaced storage is the closure's to dispose of. Keys cannot be
    /// edited, so chain order is preserved.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chain_table::Blob;
    /// use chain_table::HashTable;
    /// use chain_table::policy::hash_i32;
    /// use chain_table::policy::order_bytes;
    /// use chain_table::policy::order_i32;
    ///
    /// let mut table = HashTable::with_heap(17, order_i32, order_bytes, hash_i32);
    /// table.insert(&1i32.to_ne_bytes(), b"one");
    ///
    /// table.apply_to_all(|_, value| *value = Blob::copy_of(b"longer replacement"));
    /// assert_eq!(
    ///     table.lookup(&1i32.to_ne_bytes()).as_deref(),
    ///     Some(&b"longer replacement"[..]),
    /// );
    /// ```
    pub fn apply_to_all<F>(&mut self, mut apply: F)
    where
        F: FnMut(&[u8], &mut Blob),
    {
        for bucket in &mut self.buckets {
            let mut link = bucket.as_deref_mut();
            while let Some(entry) = link {
                apply(entry.key.as_bytes(), &mut entry.value);
                link = entry.next.as_deref_mut();
            }
        }
    }

    /// Releases every entry's key and value storage through the memory
    /// policies and resets the entry count. Bucket anchors are retained, so
    /// the table is immediately reusable. Safe to call repeatedly.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            let mut link = bucket.take();
            while let Some(entry) = link {
                let Entry { key, value, next } = *entry;
                link = next;
                self.key_memory.release(key);
                self.value_memory.release(value);
            }
        }
        self.size = 0;
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        // Chain teardown stays a loop; dropping the boxes link by link would
        // recurse through `next` and can exhaust the stack on long chains.
        self.clear();
    }
}

impl Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.entries() {
            map.entry(&entry.key.as_bytes(), &entry.value.as_bytes());
        }
        map.finish()
    }
}
