//! Interrupt → queue → consumer scenarios with a `static` event queue and a
//! consumer task awaiting events.
mod helpers {
    include!("helpers/mod.rs");
}

use embassy_time::Instant;
use helpers::{MockDriver, MockIsr, MockTimer};
use static_cell::StaticCell;
use twai_object::{config::ControllerConfig, platform::BusState, Event, EventQueue, TwaiController};

#[tokio::test]
/// A consumer task blocked on the queue receives frames in arrival order.
async fn test_consumer_receives_in_order() {
    static QUEUE: StaticCell<EventQueue> = StaticCell::new();
    let queue: &'static EventQueue = QUEUE.init(EventQueue::new());

    let mut twai = TwaiController::new(MockDriver::default(), queue);
    twai.bring_up(ControllerConfig::default()).unwrap();
    let mut rx = twai.event_queue().unwrap();

    let consumer = tokio::spawn(async move {
        let mut ids = Vec::new();
        for _ in 0..3 {
            if let Event::Frame { frame, .. } = rx.receive().await {
                ids.push(frame.raw_id());
            }
        }
        ids
    });

    let mut isr = MockIsr::new();
    isr.tick = 42;
    isr.deliver(0x100, &[1]);
    isr.deliver(0x101, &[2]);
    isr.deliver_extended(0x18FF_0001, &[3]);
    let report = twai.interrupt_pipeline().on_interrupt(&mut isr);
    assert_eq!(report.enqueued, 3);
    assert_eq!(isr.yields, 1);

    let ids = consumer.await.unwrap();
    assert_eq!(ids, [0x100, 0x101, 0x18FF_0001]);
}

#[tokio::test]
/// Bounded waits give up on an idle bus and return events once they arrive.
async fn test_receive_timeout() {
    let queue: EventQueue = EventQueue::new();
    let mut twai = TwaiController::new(MockDriver::default(), &queue);
    twai.bring_up(ControllerConfig::default()).unwrap();
    let mut rx = twai.event_queue().unwrap();
    let mut timer = MockTimer;

    assert!(rx.receive_timeout(&mut timer, 20).await.is_none());

    let mut isr = MockIsr::new();
    isr.deliver(0x7E0, &[0x02, 0x01, 0x0D]);
    twai.interrupt_pipeline().on_interrupt(&mut isr);

    let event = rx.receive_timeout(&mut timer, 1_000).await.unwrap();
    let frame = event.frame().unwrap();
    assert_eq!(frame.raw_id(), 0x7E0);
    assert_eq!(frame.data(), [0x02, 0x01, 0x0D]);
}

#[tokio::test]
/// Bus-off markers follow the frames drained in the same interrupt, only when enabled.
async fn test_bus_off_events() {
    let queue: EventQueue = EventQueue::new();
    let mut twai = TwaiController::new(MockDriver::default(), &queue);
    twai.bring_up(ControllerConfig::default()).unwrap();
    let mut rx = twai.event_queue().unwrap();

    let mut isr = MockIsr::new();
    isr.state = BusState::BusOff;
    isr.tick = 7;
    isr.deliver(0x1, &[]);
    twai.interrupt_pipeline().on_interrupt(&mut isr);
    assert!(rx.receive().await.frame().is_some());
    assert!(rx.try_receive().is_none());

    twai.enable_error_events(true);
    assert!(twai.error_events_enabled());
    isr.deliver(0x2, &[]);
    let report = twai.interrupt_pipeline().on_interrupt(&mut isr);
    assert!(report.error_event);

    assert!(rx.receive().await.frame().is_some());
    assert_eq!(
        rx.receive().await,
        Event::BusOff {
            timestamp: Instant::from_ticks(7)
        }
    );
    twai.enable_error_events(false);
}

#[test]
/// After shutdown the interrupt handler no longer touches the peripheral.
fn test_pipeline_inert_after_shutdown() {
    let queue: EventQueue = EventQueue::new();
    let mut twai = TwaiController::new(MockDriver::default(), &queue);
    twai.bring_up(ControllerConfig::default()).unwrap();
    let pipeline = twai.interrupt_pipeline();
    twai.shut_down();

    let mut isr = MockIsr::new();
    isr.deliver(0x10, &[1, 2, 3]);
    let report = pipeline.on_interrupt(&mut isr);
    assert_eq!(report.received, 0);
    assert_eq!(isr.pending.len(), 1);
    assert!(queue.is_empty());
}

#[test]
/// A burst larger than the queue keeps the oldest frames.
fn test_burst_overflow() {
    let queue: EventQueue = EventQueue::new();
    let mut twai = TwaiController::new(MockDriver::default(), &queue);
    twai.bring_up(ControllerConfig::default()).unwrap();

    let mut isr = MockIsr::new();
    for i in 0..10u16 {
        isr.deliver(0x200 + i, &[i as u8]);
    }
    let report = twai.interrupt_pipeline().on_interrupt(&mut isr);
    assert_eq!((report.enqueued, report.dropped), (8, 2));

    let mut rx = twai.event_queue().unwrap();
    let last = std::iter::from_fn(|| rx.try_receive()).last().unwrap();
    assert_eq!(last.frame().unwrap().raw_id(), 0x207);
}
