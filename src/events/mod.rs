//! Events produced by the interrupt pipeline and the bounded queue that hands
//! them to consumer tasks.
//!
//! The queue is built on [`embassy_sync::channel::Channel`] and is meant to live
//! in a `static`, so that both the interrupt handler and the consumer tasks can
//! reach it without allocation:
//!
//! ```rust,ignore
//! static EVENTS: EventQueue = EventQueue::new();
//! ```
//!
//! Producer side (interrupt context) only ever uses non-blocking pushes; when the
//! queue is full the newest event is dropped. Consumers poll with
//! [`EventReceiver::try_receive`], await with [`EventReceiver::receive`], or await
//! with a bound using [`EventReceiver::receive_timeout`].
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver},
};
use embassy_time::Instant;
use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::frame::TwaiFrame;
use crate::platform::traits::twai_timer::TwaiTimer;

/// Queue depth used when none is specified.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 8;

//==================================================================================EVENT
/// Item carried by the event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A frame drained from the receive path.
    Frame { frame: TwaiFrame, timestamp: Instant },
    /// The controller was observed in bus-off.
    BusOff { timestamp: Instant },
}

impl Event {
    /// Scheduler tick at which the interrupt observed the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::Frame { timestamp, .. } | Event::BusOff { timestamp } => *timestamp,
        }
    }

    /// `true` for fault markers.
    pub fn is_error(&self) -> bool {
        matches!(self, Event::BusOff { .. })
    }

    /// Received frame, if this is a frame event.
    pub fn frame(&self) -> Option<&TwaiFrame> {
        match self {
            Event::Frame { frame, .. } => Some(frame),
            Event::BusOff { .. } => None,
        }
    }
}

//==================================================================================EVENT_QUEUE
/// Bounded FIFO shared between the interrupt pipeline and consumers.
///
/// Besides the channel it holds the two values the interrupt handler reads:
/// whether a controller currently owns the queue, and whether bus-off conditions
/// are reported as events. Both are atomics.
pub struct EventQueue<const N: usize = DEFAULT_EVENT_QUEUE_CAPACITY> {
    channel: Channel<CriticalSectionRawMutex, Event, N>,
    claimed: AtomicBool,
    error_events: AtomicBool,
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            claimed: AtomicBool::new(false),
            error_events: AtomicBool::new(false),
        }
    }

    /// Fixed number of events the queue can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Events currently waiting.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// `true` while a running controller owns the queue.
    pub fn is_active(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Whether bus-off conditions are pushed as [`Event::BusOff`].
    pub fn error_events_enabled(&self) -> bool {
        self.error_events.load(Ordering::Relaxed)
    }

    pub(crate) fn set_error_events(&self, enable: bool) {
        self.error_events.store(enable, Ordering::Relaxed);
    }

    /// Consumer handle.
    pub fn receiver(&self) -> EventReceiver<'_, N> {
        EventReceiver {
            receiver: self.channel.receiver(),
        }
    }

    /// Take ownership for a controller session. Fails if another session holds it.
    pub(crate) fn claim(&self) -> bool {
        let claimed = self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.drain();
        }
        claimed
    }

    /// End the session: the interrupt pipeline goes inert and pending events are discarded.
    pub(crate) fn release(&self) {
        self.claimed.store(false, Ordering::Release);
        self.drain();
    }

    /// Non-blocking push for interrupt context. Returns `false` when the event was
    /// dropped because the queue is full.
    pub(crate) fn push_from_isr(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }

    fn drain(&self) {
        while self.channel.try_receive().is_ok() {}
    }
}

//==================================================================================RECEIVER
/// Consumer side of the [`EventQueue`].
pub struct EventReceiver<'a, const N: usize> {
    receiver: Receiver<'a, CriticalSectionRawMutex, Event, N>,
}

impl<'a, const N: usize> EventReceiver<'a, N> {
    /// Pop the oldest event without waiting.
    pub fn try_receive(&mut self) -> Option<Event> {
        self.receiver.try_receive().ok()
    }

    /// Wait until an event is available.
    pub async fn receive(&mut self) -> Event {
        self.receiver.receive().await
    }

    /// Wait at most `timeout_ms` for an event. Returns `None` on timeout.
    pub async fn receive_timeout<T: TwaiTimer>(
        &mut self,
        timer: &mut T,
        timeout_ms: u32,
    ) -> Option<Event> {
        let recv_future = self.receiver.receive();
        let timeout_future = timer.delay_ms(timeout_ms);
        pin_mut!(recv_future);
        pin_mut!(timeout_future);

        match select(recv_future, timeout_future).await {
            Either::Left((event, _)) => Some(event),
            Either::Right(_) => None,
        }
    }
}
