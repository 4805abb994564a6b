use std::{collections::BTreeMap, mem};

use crate::error::Result;

/// A pool that hands out instances by index, preferring the instance that
/// held the same index in the previous pass.
///
/// A pass obtains instances with [`obtain`](Self::obtain) and ends with
/// [`flip`](Self::flip). Instances from the previous pass that were not
/// claimed by their old index are recycled from the end of the range
/// furthest from the requested index, so a scrolled window keeps most of
/// its instances in place. Released instances beyond `capacity` are
/// returned from `flip` for the caller to destroy.
#[derive(Debug, Clone)]
pub struct IndexedPool<T> {
    /// Instances obtained in the current pass.
    current: BTreeMap<usize, T>,
    /// Instances from the previous pass not yet reclaimed.
    previous: BTreeMap<usize, T>,
    /// Released instances.
    free: Vec<T>,
    /// Maximum number of released instances kept.
    capacity: usize,
}

impl<T: Clone> IndexedPool<T> {
    /// An empty pool keeping at most `capacity` released instances.
    pub fn new(capacity: usize) -> Self {
        Self {
            current: BTreeMap::new(),
            previous: BTreeMap::new(),
            free: Vec::new(),
            capacity,
        }
    }

    /// The instance for `index` in this pass. Obtaining the same index twice
    /// in one pass returns the same instance. `create` runs only when there
    /// is nothing to reuse.
    pub fn obtain(&mut self, index: usize, create: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(t) = self.current.get(&index) {
            return Ok(t.clone());
        }
        let t = match self.previous.remove(&index) {
            Some(t) => t,
            None => match self.recycle(index) {
                Some(t) => t,
                None => create()?,
            },
        };
        self.current.insert(index, t.clone());
        Ok(t)
    }

    /// Take a reusable instance for `index`.
    fn recycle(&mut self, index: usize) -> Option<T> {
        let first = self.previous.keys().next().copied();
        let stale = match first {
            Some(first) if index > first => self.previous.pop_first(),
            Some(_) => self.previous.pop_last(),
            None => None,
        };
        stale.map(|(_, t)| t).or_else(|| self.free.pop())
    }

    /// The instance obtained for `index` this pass.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.current.get(&index)
    }

    /// Number of instances obtained this pass.
    pub fn obtained_len(&self) -> usize {
        self.current.len()
    }

    /// Instances obtained this pass, by ascending index.
    pub fn obtained(&self) -> impl Iterator<Item = (usize, &T)> {
        self.current.iter().map(|(i, t)| (*i, t))
    }

    /// Visit the instances from the previous pass that this pass has not
    /// reclaimed. These are released by the next `flip`.
    pub fn for_each_unused(&self, mut f: impl FnMut(usize, &T)) {
        for (i, t) in &self.previous {
            f(*i, t);
        }
    }

    /// End the pass: release every unclaimed instance and make this pass's
    /// instances the candidates for the next one. Returns the released
    /// instances that did not fit in the pool.
    pub fn flip(&mut self) -> Vec<T> {
        let unused = mem::replace(&mut self.previous, mem::take(&mut self.current));
        self.free.extend(unused.into_values());
        if self.free.len() > self.capacity {
            self.free.split_off(self.capacity)
        } else {
            Vec::new()
        }
    }

    /// Empty the pool, returning every instance it held.
    pub fn clear(&mut self) -> Vec<T> {
        let mut out: Vec<T> = mem::take(&mut self.current).into_values().collect();
        out.extend(mem::take(&mut self.previous).into_values());
        out.append(&mut self.free);
        out
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counter() -> impl FnMut() -> Result<u32> {
        let next = Cell::new(0);
        move || {
            next.set(next.get() + 1);
            Ok(next.get())
        }
    }

    #[test]
    fn reuses_by_index() -> Result<()> {
        let mut make = counter();
        let mut p = IndexedPool::new(8);
        let a = p.obtain(3, &mut make)?;
        let b = p.obtain(4, &mut make)?;
        assert_eq!(p.obtain(3, &mut make)?, a);
        assert_eq!(p.obtained_len(), 2);
        assert!(p.flip().is_empty());

        assert_eq!(p.obtain(4, &mut make)?, b);
        assert_eq!(p.obtain(3, &mut make)?, a);
        assert_eq!(p.obtained().map(|(i, _)| i).collect::<Vec<_>>(), [3, 4]);
        Ok(())
    }

    #[test]
    fn scrolling_recycles_far_end() -> Result<()> {
        let mut make = counter();
        let mut p = IndexedPool::new(8);
        for i in 0..3 {
            p.obtain(i, &mut make)?;
        }
        p.flip();
        // Scrolled down by one: index 3 takes the instance that held 0.
        for i in 1..4 {
            p.obtain(i, &mut make)?;
        }
        assert_eq!(p.get(3), Some(&1));
        assert_eq!(p.get(1), Some(&2));
        let mut unused = Vec::new();
        p.for_each_unused(|i, t| unused.push((i, *t)));
        assert!(unused.is_empty());
        Ok(())
    }

    #[test]
    fn flip_releases_unclaimed() -> Result<()> {
        let mut make = counter();
        let mut p = IndexedPool::new(1);
        for i in 0..3 {
            p.obtain(i, &mut make)?;
        }
        p.flip();
        p.obtain(1, &mut make)?;
        let mut unused = Vec::new();
        p.for_each_unused(|i, _| unused.push(i));
        assert_eq!(unused, [0, 2]);
        // Two released, one kept.
        assert_eq!(p.flip().len(), 1);
        assert_eq!(p.clear().len(), 2);
        assert_eq!(p.obtained_len(), 0);
        Ok(())
    }
}
