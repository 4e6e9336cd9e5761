//! Pre-made copies of one object for parallel workers.
//!
//! Callers that hand the same native object to several workers allocate
//! copies up front and pop one per worker. Popping from an empty pool makes
//! a fresh copy rather than failing.

use parking_lot::Mutex;

type CopyFn<T> = Box<dyn Fn(&T) -> Option<T> + Send + Sync>;

pub struct DuplicatePool<T> {
    original: T,
    make: CopyFn<T>,
    copies: Mutex<Vec<T>>,
}

impl<T: Send> DuplicatePool<T> {
    /// `make` duplicates the original; `None` means the copy failed.
    pub fn new<F>(original: T, make: F) -> Self
    where
        F: Fn(&T) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            original,
            make: Box::new(make),
            copies: Mutex::new(Vec::new()),
        }
    }

    pub fn original(&self) -> &T {
        &self.original
    }

    /// Replace the pooled copies with up to `n` fresh ones. Returns how many
    /// were made; copies left from an earlier `alloc` are dropped.
    pub fn alloc(&self, n: usize) -> usize {
        let fresh: Vec<T> = (0..n).map_while(|_| (self.make)(&self.original)).collect();
        let made = fresh.len();
        if made < n {
            log::warn!("duplicate pool: only {made} of {n} copies made");
        }
        let stale = std::mem::replace(&mut *self.copies.lock(), fresh);
        if !stale.is_empty() {
            log::debug!("duplicate pool: dropped {} unused copies", stale.len());
        }
        made
    }

    /// Take a copy, making one if the pool is empty.
    pub fn pop(&self) -> Option<T> {
        let pooled = self.copies.lock().pop();
        pooled.or_else(|| (self.make)(&self.original))
    }

    /// Copies currently held.
    pub fn count(&self) -> usize {
        self.copies.lock().len()
    }
}
