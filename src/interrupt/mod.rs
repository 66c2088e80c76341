//! Interrupt-side producer for the event queue.
//!
//! [`InterruptPipeline::on_interrupt`] is meant to be called from the TWAI
//! interrupt handler. It reads the status once and drains every frame the
//! peripheral reports as pending, stamping each one as it is popped. A bus-off
//! marker follows when error events are enabled, and a context switch is
//! requested when a consumer may be waiting.
//! It never blocks: a full queue drops the newest event.
use crate::events::{Event, EventQueue, DEFAULT_EVENT_QUEUE_CAPACITY};
use crate::platform::traits::isr_context::IsrContext;

//==================================================================================ISR_REPORT
/// What one interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsrReport {
    /// Frames taken from the receive path.
    pub received: usize,
    /// Events accepted by the queue (frames and fault markers).
    pub enqueued: usize,
    /// Events lost because the queue was full.
    pub dropped: usize,
    /// A bus-off marker was produced.
    pub error_event: bool,
    /// A context switch was requested.
    pub yielded: bool,
}

//==================================================================================PIPELINE
/// Interrupt handler bound to one event queue.
///
/// The pipeline holds only a shared reference, so it can be copied into the
/// interrupt handler while the controller keeps ownership of the session.
#[derive(Clone, Copy)]
pub struct InterruptPipeline<'a, const N: usize = DEFAULT_EVENT_QUEUE_CAPACITY> {
    queue: &'a EventQueue<N>,
}

impl<'a, const N: usize> InterruptPipeline<'a, N> {
    pub const fn new(queue: &'a EventQueue<N>) -> Self {
        Self { queue }
    }

    /// Service one TWAI interrupt.
    ///
    /// Does nothing while no controller session owns the queue.
    pub fn on_interrupt<C: IsrContext>(&self, ctx: &mut C) -> IsrReport {
        let mut report = IsrReport::default();
        if !self.queue.is_active() {
            return report;
        }

        let status = ctx.status();

        if status.msgs_to_rx > 0 {
            while let Some(frame) = ctx.try_receive() {
                report.received += 1;
                let timestamp = ctx.now();
                self.push(Event::Frame { frame, timestamp }, &mut report);
            }
        }

        if self.queue.error_events_enabled() && status.is_bus_off() {
            report.error_event = true;
            let timestamp = ctx.now();
            self.push(Event::BusOff { timestamp }, &mut report);
        }

        // Any accepted event may have woken a consumer.
        if report.enqueued > 0 {
            ctx.yield_from_isr();
            report.yielded = true;
        }

        report
    }

    fn push(&self, event: Event, report: &mut IsrReport) {
        if self.queue.push_from_isr(event) {
            report.enqueued += 1;
        } else {
            report.dropped += 1;
        }
    }
}
