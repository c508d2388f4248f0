use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// A background thread that calls a function at a fixed period until cancelled.
///
/// Every tick is scheduled relative to the previous one rather than to when the previous tick
/// finished, so the period doesn't drift. If the thread falls behind by more than a period, the
/// missed ticks are skipped instead of being fired in a burst.
///
/// The ticker stops when the callback returns false, when [`Ticker::cancel`] is called, or when
/// it's dropped.
#[derive(Debug)]
pub struct Ticker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start(period: Duration, mut tick: impl FnMut() -> bool + Send + 'static) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let period = period.max(Duration::from_millis(1));

        let thread = std::thread::spawn(move || {
            let mut next = Instant::now() + period;
            loop {
                loop {
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= next {
                        break;
                    }
                    std::thread::park_timeout(next - now);
                }

                if !tick() {
                    return;
                }

                next += period;
                let now = Instant::now();
                if next < now {
                    next = now + period;
                }
            }
        });

        Self {
            stop,
            thread: Some(thread),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stop the ticker and wait for its thread to finish. The callback is never called again
    /// after this returns.
    pub fn cancel(&mut self) {
        let thread = match self.thread.take() {
            Some(thread) => thread,
            None => return,
        };

        self.stop.store(true, Ordering::SeqCst);
        thread.thread().unpark();
        if thread.join().is_err() {
            log::error!("Ticker callback panicked");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    #[test]
    fn ticks_until_cancelled() {
        let (sender, receiver) = mpsc::channel();
        let mut ticker = Ticker::start(Duration::from_millis(5), move || sender.send(()).is_ok());

        for _ in 0..3 {
            receiver
                .recv_timeout(Duration::from_secs(5))
                .expect("ticker didn't tick");
        }

        ticker.cancel();
        assert!(!ticker.is_running());
        // The sender was dropped with the thread
        while receiver.try_recv().is_ok() {}
        assert_eq!(receiver.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }

    #[test]
    fn stops_when_the_callback_says_so() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut ticker = Ticker::start(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst) < 2
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        ticker.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cancel_is_quick_even_with_a_long_period() {
        let started = Instant::now();
        let ticker = Ticker::start(Duration::from_secs(3600), || true);
        drop(ticker);
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
