pub trait Reclaim {
    /// Hint that now is a good moment to compact or collect memory.
    fn reclaim(&mut self);
}

impl Reclaim for () {
    fn reclaim(&mut self) {}
}

impl<R: Reclaim + ?Sized> Reclaim for &mut R {
    fn reclaim(&mut self) {
        (**self).reclaim()
    }
}
