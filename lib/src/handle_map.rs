//! Resizable hash table keyed by byte strings.
//!
//! Maps names, channel ids and other opaque handles to kernel objects. Keys
//! are copied into the table; values are moved in and handed back on
//! overwrite or removal, so whatever `V` is (a reference, an `Arc`, an id)
//! its ownership stays visible at the call site.
//!
//! Buckets are plain vectors selected by a 64-bit FNV-1a hash. Before each
//! insertion the table grows to four times as many buckets once the average
//! bucket holds [`REBALANCE_THRESHOLD`] entries.

use alloc::boxed::Box;
use alloc::vec::Vec;

use spin::{Mutex, MutexGuard};
use strata_abi::Handle;

/// Average bucket length that triggers a 4x grow on the next insert.
pub const REBALANCE_THRESHOLD: usize = 4;

const GROWTH_FACTOR: usize = 4;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

struct Entry<V> {
    key: Box<[u8]>,
    value: V,
}

pub struct HandleTable<V> {
    buckets: Vec<Vec<Entry<V>>>,
    len: usize,
}

impl<V> HandleTable<V> {
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(1);
        buckets.push(Vec::new());
        Self { buckets, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_index(&self, key: &[u8]) -> usize {
        (fnv1a(key) % self.buckets.len() as u64) as usize
    }

    fn position(&self, key: &[u8]) -> (usize, Option<usize>) {
        let index = self.bucket_index(key);
        let slot = self.buckets[index].iter().position(|e| &*e.key == key);
        (index, slot)
    }

    pub fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<&V> {
        let key = key.as_ref();
        let (index, slot) = self.position(key);
        slot.map(|slot| &self.buckets[index][slot].value)
    }

    pub fn get_mut<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Option<&mut V> {
        let key = key.as_ref();
        let (index, slot) = self.position(key);
        slot.map(move |slot| &mut self.buckets[index][slot].value)
    }

    pub fn contains_key<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.position(key.as_ref()).1.is_some()
    }

    /// Insert or overwrite `key`, returning the value it replaced.
    pub fn set<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K, value: V) -> Option<V> {
        if self.len / self.buckets.len() >= REBALANCE_THRESHOLD {
            self.grow();
        }

        let key = key.as_ref();
        let (index, slot) = self.position(key);
        match slot {
            Some(slot) => Some(core::mem::replace(
                &mut self.buckets[index][slot].value,
                value,
            )),
            None => {
                self.buckets[index].push(Entry {
                    key: Box::from(key),
                    value,
                });
                self.len += 1;
                None
            }
        }
    }

    pub fn remove<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Option<V> {
        let (index, slot) = self.position(key.as_ref());
        let entry = self.buckets[index].swap_remove(slot?);
        self.len -= 1;
        Some(entry.value)
    }

    pub fn get_handle(&self, handle: &Handle) -> Option<&V> {
        self.get(handle.as_bytes())
    }

    pub fn set_handle(&mut self, handle: &Handle, value: V) -> Option<V> {
        self.set(handle.as_bytes(), value)
    }

    pub fn remove_handle(&mut self, handle: &Handle) -> Option<V> {
        self.remove(handle.as_bytes())
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &V)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|e| (&*e.key, &e.value)))
    }

    fn grow(&mut self) {
        let new_count = self.buckets.len() * GROWTH_FACTOR;
        let mut buckets: Vec<Vec<Entry<V>>> = Vec::with_capacity(new_count);
        buckets.resize_with(new_count, Vec::new);

        for entry in self.buckets.drain(..).flatten() {
            let index = (fnv1a(&entry.key) % new_count as u64) as usize;
            buckets[index].push(entry);
        }
        self.buckets = buckets;
    }
}

impl<V> Default for HandleTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`HandleTable`] behind a spinlock, for servers that share a table without
/// holding the kernel lock.
pub struct LockedHandleTable<V> {
    inner: Mutex<HandleTable<V>>,
}

impl<V> LockedHandleTable<V> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HandleTable::new()),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, HandleTable<V>> {
        self.inner.lock()
    }

    pub fn set<K: AsRef<[u8]> + ?Sized>(&self, key: &K, value: V) -> Option<V> {
        self.inner.lock().set(key, value)
    }

    pub fn remove<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<V: Clone> LockedHandleTable<V> {
    pub fn get_cloned<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }
}

impl<V> Default for LockedHandleTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;
    use std::string::String;
    use std::vec::Vec;
    use strata_abi::ChannelId;

    fn bucket_sum<V>(table: &HandleTable<V>) -> usize {
        table.buckets.iter().map(Vec::len).sum()
    }

    #[test]
    fn channel_name_lifecycle() {
        let mut table = HandleTable::new();
        assert_eq!(table.set("ch:1", 7u32), None);
        assert_eq!(table.get("ch:1"), Some(&7));
        assert_eq!(table.len(), 1);

        assert_eq!(table.set("ch:1", 9), Some(7));
        assert_eq!(table.get("ch:1"), Some(&9));
        assert_eq!(table.len(), 1);

        assert_eq!(table.remove("ch:1"), Some(9));
        assert_eq!(table.get("ch:1"), None);
        assert!(table.is_empty());
    }

    #[test]
    fn fifth_insert_grows_buckets() {
        let mut table = HandleTable::new();
        assert_eq!(table.bucket_count(), 1);
        for i in 0..5u32 {
            table.set(format!("k{}", i).as_str(), i);
        }
        assert!(table.bucket_count() >= 4);
        assert_eq!(table.len(), 5);
        for i in 0..5u32 {
            assert_eq!(table.get(format!("k{}", i).as_str()), Some(&i));
        }
    }

    #[test]
    fn rebalance_keeps_every_entry() {
        let mut table = HandleTable::new();
        let mut before: Vec<(String, usize)> = Vec::new();
        for i in 0..16 {
            let key = format!("object-{}", i);
            table.set(key.as_str(), i);
            before.push((key, i));
        }
        // 16 entries in 4 buckets: the next insert crosses the threshold.
        assert_eq!(table.bucket_count(), 4);
        table.set("object-16", 16);
        before.push((String::from("object-16"), 16));
        assert_eq!(table.bucket_count(), 16);

        let mut after: Vec<(String, usize)> = table
            .iter()
            .map(|(k, v)| (String::from_utf8(k.to_vec()).unwrap(), *v))
            .collect();
        after.sort();
        before.sort();
        assert_eq!(after, before);
        assert_eq!(table.len(), bucket_sum(&table));
    }

    #[test]
    fn removing_absent_key_is_a_no_op() {
        let mut table = HandleTable::new();
        table.set("present", 1u8);
        assert_eq!(table.remove("absent"), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.remove("present"), Some(1));
        assert_eq!(table.remove("present"), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn len_matches_bucket_contents() {
        let mut table = HandleTable::new();
        for i in 0..200u32 {
            table.set(&i.to_le_bytes(), i);
            if i % 3 == 0 {
                table.remove(&(i / 2).to_le_bytes());
            }
            assert_eq!(table.len(), bucket_sum(&table));
        }
    }

    #[test]
    fn handle_keys_share_the_byte_namespace() {
        let mut table = HandleTable::new();
        let handle = ChannelId(42).to_handle();
        assert_eq!(table.set_handle(&handle, "console"), None);
        assert_eq!(table.get(handle.as_bytes()), Some(&"console"));
        assert!(table.contains_key(&42i64.to_le_bytes()));
        assert_eq!(table.get_handle(&ChannelId(43).to_handle()), None);
        assert_eq!(table.remove_handle(&handle), Some("console"));
        assert!(!table.contains_key(handle.as_bytes()));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut table = HandleTable::new();
        table.set(b"counter", 0u64);
        if let Some(v) = table.get_mut(b"counter") {
            *v += 5;
        }
        assert_eq!(table.get(b"counter"), Some(&5));
        assert!(table.get_mut(b"missing").is_none());
    }

    #[test]
    fn locked_table_is_shareable() {
        let table: LockedHandleTable<u32> = LockedHandleTable::new();
        table.set("a", 1);
        assert_eq!(table.get_cloned("a"), Some(1));
        assert_eq!(table.lock().bucket_count(), 1);
        assert_eq!(table.remove("a"), Some(1));
        assert!(table.is_empty());
    }
}
