use std::cell::Cell;
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the quiz loop reacts to: a key press, a terminal resize or a timer tick
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    /// Time actually elapsed since the previous tick
    Tick(Duration),
}

/// Where quiz events come from. The terminal in the binary, a channel in tests.
pub trait QuizEventSource: Send + 'static {
    /// Wait at most `timeout`; `Err(Timeout)` means the tick is due.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread and forwards key and resize events
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // Windows reports releases too; only presses drive the quiz
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How often the stopwatch on the question screen advances
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source so a quiz can be driven without a terminal
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Drives the quiz loop. Ticks keep their cadence while keys arrive:
/// the wait for the next event only lasts until the current tick
/// interval is used up.
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Cell<Instant>,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Cell::new(Instant::now()),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks until the next event, or returns Tick once the interval has passed
    pub fn step(&self) -> QuizEvent {
        let timeout = self
            .ticker
            .interval()
            .saturating_sub(self.last_tick.get().elapsed());

        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                let now = Instant::now();
                QuizEvent::Tick(now.duration_since(self.last_tick.replace(now)))
            }
        }
    }

    /// Feed events to `handle` until it breaks, or `max_steps` have passed
    pub fn run_until<F>(&self, max_steps: Option<usize>, mut handle: F)
    where
        F: FnMut(QuizEvent) -> ControlFlow<()>,
    {
        let mut steps = 0usize;
        while max_steps.map_or(true, |max| steps < max) {
            steps += 1;
            if handle(self.step()).is_break() {
                break;
            }
        }
    }
}
