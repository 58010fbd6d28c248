//! Reuse cache for short-lived entities
//!
//! Released values are kept and handed back out before anything new is
//! constructed. The pool only grows; there is no eviction.

/// Free list of released values
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    /// Values constructed because the free list was empty
    allocated: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            allocated: 0,
        }
    }

    /// Take a released value, or build one with `create`.
    ///
    /// The caller owns the result and must overwrite any state it cares
    /// about; released values keep whatever their last tenant left.
    pub fn take_or_else(&mut self, create: impl FnOnce() -> T) -> T {
        match self.free.pop() {
            Some(value) => value,
            None => {
                self.allocated += 1;
                create()
            }
        }
    }

    pub fn put(&mut self, value: T) {
        self.free.push(value);
    }

    /// Move every element of `live` matching `pred` into the pool,
    /// preserving the order of the survivors. Returns how many moved.
    pub fn reclaim_where(&mut self, live: &mut Vec<T>, mut pred: impl FnMut(&T) -> bool) -> usize {
        // Survivors are compacted to the front in one pass; the tail goes
        // to the free list
        let mut kept = 0;
        for i in 0..live.len() {
            if !pred(&live[i]) {
                live.swap(kept, i);
                kept += 1;
            }
        }
        let moved = live.len() - kept;
        self.free.extend(live.drain(kept..));
        moved
    }

    /// Values currently waiting for reuse
    pub fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Values ever constructed by this pool
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_before_allocating() {
        let mut pool: Pool<Vec<u8>> = Pool::new();
        let a = pool.take_or_else(|| Vec::with_capacity(8));
        assert_eq!(pool.allocated(), 1);

        pool.put(a);
        assert_eq!(pool.pooled(), 1);

        let _b = pool.take_or_else(Vec::new);
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn test_reclaim_keeps_order() {
        let mut pool = Pool::new();
        let mut live = vec![1, 2, 3, 4, 5, 6];
        let moved = pool.reclaim_where(&mut live, |n| n % 2 == 0);
        assert_eq!(moved, 3);
        assert_eq!(live, vec![1, 3, 5]);
        assert_eq!(pool.pooled(), 3);
    }

    #[test]
    fn test_reclaim_everything_or_nothing() {
        let mut pool = Pool::new();
        let mut live: Vec<u32> = (0..1000).collect();
        assert_eq!(pool.reclaim_where(&mut live, |_| false), 0);
        assert_eq!(live.len(), 1000);

        let moved = pool.reclaim_where(&mut live, |n| *n >= 10);
        assert_eq!(moved, 990);
        assert_eq!(live, (0..10).collect::<Vec<_>>());

        assert_eq!(pool.reclaim_where(&mut live, |_| true), 10);
        assert!(live.is_empty());
        assert_eq!(pool.pooled(), 1000);
    }
}
