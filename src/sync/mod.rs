use core::{
    cell::UnsafeCell,
    ptr,
    sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering},
};

/// Single writer sequence lock. Readers never block the writer; a reader that
/// overlaps a write retries until it observes a stable version.
pub struct ReadSpinLock<T> {
    write_lock: AtomicBool,
    version: AtomicUsize,
    data: UnsafeCell<T>,
}

impl<T: Default> Default for ReadSpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ReadSpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            write_lock: AtomicBool::new(false),
            version: AtomicUsize::new(0),
            data: UnsafeCell::new(data),
        }
    }
}

impl<T: Copy> ReadSpinLock<T> {
    /// Fails with `Err(true)` when another writer holds the lock.
    pub fn write(&self, data: T) -> Result<(), bool> {
        self.write_lock.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)?;
        let version = self.version.load(Ordering::Relaxed);
        self.version.store(version.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        unsafe { ptr::write_volatile(self.data.get(), data) };
        self.version.store(version.wrapping_add(2), Ordering::Release);
        self.write_lock.store(false, Ordering::Release);
        Ok(())
    }

    pub fn read(&self) -> T {
        loop {
            let version = self.version.load(Ordering::Acquire);
            if version & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }
            let data = unsafe { ptr::read_volatile(self.data.get()) };
            fence(Ordering::Acquire);
            if version == self.version.load(Ordering::Relaxed) {
                return data;
            }
        }
    }
}

unsafe impl<T: Send> Sync for ReadSpinLock<T> {}
unsafe impl<T: Send> Send for ReadSpinLock<T> {}

mod test {
    #[test]
    fn test_read_write() {
        use super::ReadSpinLock;

        let lock = ReadSpinLock::new((0.0f64, 0.0f64));
        assert_eq!(lock.read(), (0.0, 0.0));
        assert_eq!(lock.write((1.5, -0.25)), Ok(()));
        assert_eq!(lock.read(), (1.5, -0.25));
    }

    #[test]
    fn test_no_torn_read() {
        extern crate std;

        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        use std::thread;

        use super::ReadSpinLock;

        let lock = Arc::new(ReadSpinLock::new((0u64, !0u64)));
        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let (lock, done) = (lock.clone(), done.clone());
            thread::spawn(move || {
                for i in 1..=100_000u64 {
                    lock.write((i, !i)).ok();
                }
                done.store(true, Ordering::Relaxed);
            })
        };
        while !done.load(Ordering::Relaxed) {
            let (a, b) = lock.read();
            assert_eq!(a, !b);
        }
        writer.join().unwrap();
        assert_eq!(lock.read(), (100_000, !100_000));
    }
}
