use std::cell::RefCell;

use gloo_timers::callback::Interval;

use crate::runtime::with_runtime;

thread_local! {
    static ANIMATION_INTERVAL: RefCell<Option<Interval>> = const { RefCell::new(None) };
}

/// Starts the shared animation tick. A second call while playing does nothing.
pub(crate) fn play() {
    let Some(Some(period_ms)) = with_runtime(|rt| rt.start_animation()) else {
        return;
    };
    let interval = Interval::new(period_ms, || {
        with_runtime(|rt| rt.tick());
    });
    ANIMATION_INTERVAL.with(|slot| {
        if let Some(old) = slot.borrow_mut().replace(interval) {
            old.cancel();
        }
    });
    tracing::debug!(period_ms, "playback interval armed");
}

pub(crate) fn pause() {
    with_runtime(|rt| rt.stop_animation());
    release_interval();
}

/// Cancels the interval. Must not run from inside the interval callback.
pub(crate) fn release_interval() {
    ANIMATION_INTERVAL.with(|slot| {
        if let Some(interval) = slot.borrow_mut().take() {
            interval.cancel();
        }
    });
}
