//! Fixed-rate consumer thread for the display driver.
//!
//! Calls `apply_params()` and `tick()` about 30 times per second for as long as
//! the plugin is active. Nothing else drains the analyzer queues, so the timer
//! runs whether or not an editor window is open. An editor only has to watch
//! the repaint counter and read the driver's paths or image when it moves.

use crate::audio::constants::TIMER_HZ;
use crate::ui::display_driver::DisplayDriver;
use crate::ScopeParams;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

pub struct DisplayTimer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DisplayTimer {
    /// Spawn the timer thread. `repaints` is incremented every time a tick asks
    /// for a repaint.
    pub fn start(
        display: Arc<Mutex<DisplayDriver>>,
        params: Arc<ScopeParams>,
        repaints: Arc<AtomicU64>,
    ) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));

        let handle = thread::Builder::new()
            .name("spectrum-scope-display".to_string())
            .spawn({
                let running = running.clone();
                move || Self::run(&display, &params, &repaints, &running)
            })?;

        nih_plug::nih_log!("Display timer started at {} Hz", TIMER_HZ);
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    fn run(
        display: &Mutex<DisplayDriver>,
        params: &ScopeParams,
        repaints: &AtomicU64,
        running: &AtomicBool,
    ) {
        let interval = DisplayDriver::tick_interval();
        let mut next_tick = Instant::now();

        while running.load(Ordering::Acquire) {
            match display.lock() {
                Ok(mut display) => {
                    display.apply_params(params);
                    if display.tick() {
                        repaints.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(_) => {
                    nih_plug::nih_log!("Display driver lock poisoned, stopping the display timer");
                    break;
                }
            }

            // Missed ticks are skipped rather than caught up on
            next_tick += interval;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop ticking and wait for the thread. Returns after at most one interval.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                nih_plug::nih_log!("Display timer thread panicked");
            }
            nih_plug::nih_log!("Display timer stopped");
        }
    }
}

impl Drop for DisplayTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
