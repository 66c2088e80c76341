//! Asynchronous timer abstraction used to bound consumer-side waits.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait TwaiTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;
}
