//! Tick drivers, GPIO bring-up and task pinning.

pub mod external;
pub mod gpio;
pub mod hw_timer;
pub mod poller;
pub mod task_pin;
