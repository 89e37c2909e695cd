//! Core-pinned FreeRTOS tasks for the motor loop.
//!
//! ESP-IDF implements `std::thread` on pthreads over FreeRTOS tasks.
//! `esp_pthread_set_cfg()` sets thread-local configuration for the *next*
//! `pthread_create()` from the calling thread, so the config and the spawn
//! must not be interleaved with other thread creation on that thread.

use std::ffi::CStr;
use std::fmt;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use esp_idf_sys as sys;
use tracing::info;

use crate::scheduler::{MotorLoop, MotorTask};
use crate::traits::{StepperDriver, TagReader};

/// CPU core of the dual-core ESP32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU: Wi-Fi, lwIP and the HTTP server.
    Pro = 0,
    /// APP_CPU: the motor loop.
    App = 1,
}

/// FreeRTOS priority of the motor task (above the HTTP server's 5).
pub const MOTOR_PRIORITY: u8 = 20;

/// Motor task stack in KiB.
pub const MOTOR_STACK_KB: usize = 8;

/// Spawn `f` as a FreeRTOS task pinned to `core`.
///
/// # Errors
///
/// Returns an error if the pthread config is rejected or the thread cannot
/// be created.
pub fn spawn_on_core<T, F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static CStr,
    f: F,
) -> io::Result<JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    // Safe: the config struct is fully initialized by the IDF and `name`
    // outlives the task.
    let ret = unsafe {
        let mut cfg = sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr();
        sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != sys::ESP_OK as sys::esp_err_t {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.to_string_lossy();
    info!(
        name = %display_name,
        ?core,
        priority,
        stack_kb,
        "spawning pinned task"
    );

    std::thread::Builder::new()
        .name(display_name.into_owned())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}

/// Spawn the motor loop on the APP core at [`MOTOR_PRIORITY`].
pub fn spawn_motor_task_pinned<S, R>(motor: MotorLoop<S, R>) -> io::Result<MotorTask>
where
    S: StepperDriver + Send + 'static,
    R: TagReader + Send + 'static,
    S::Error: fmt::Debug,
    R::Error: fmt::Debug,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let handle = spawn_on_core(Core::App, MOTOR_PRIORITY, MOTOR_STACK_KB, c"motor", move || {
        motor.run(flag)
    })?;
    Ok(MotorTask::new(stop, handle))
}
