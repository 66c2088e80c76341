//! Abstraction traits implemented by the platform (peripheral driver, interrupt
//! context and timer).
pub mod isr_context;
pub mod twai_driver;
pub mod twai_timer;
