//! Single-threaded cooperative event loop.
//!
//! Every deferred action (render ticks, phase transitions, shutdown polls) is
//! an event scheduled at a deadline. The loop sleeps until the earliest
//! deadline and dispatches due events in deadline order, ties in scheduling
//! order, so no two handlers ever run at the same time.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Events ordered by deadline, FIFO among equal deadlines
#[derive(Debug)]
pub struct DeadlineQueue<E> {
    entries: VecDeque<(Instant, E)>,
}

impl<E> DeadlineQueue<E> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn schedule_at(&mut self, deadline: Instant, event: E) {
        let index = self.entries.partition_point(|(at, _)| *at <= deadline);
        self.entries.insert(index, (deadline, event));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.front().map(|(at, _)| *at)
    }

    /// Remove the earliest event if it is due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<E> {
        match self.entries.front() {
            Some((at, _)) if *at <= now => self.entries.pop_front().map(|(_, event)| event),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for DeadlineQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// State handlers see while dispatching an event
#[derive(Debug)]
pub struct LoopContext<E> {
    queue: DeadlineQueue<E>,
    now: Instant,
    quit: bool,
}

impl<E> LoopContext<E> {
    fn new(now: Instant) -> Self {
        Self {
            queue: DeadlineQueue::new(),
            now,
            quit: false,
        }
    }

    /// Time at which the current batch of events was dispatched
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn schedule_now(&mut self, event: E) {
        self.queue.schedule_at(self.now, event);
    }

    pub fn schedule_after(&mut self, delay: Duration, event: E) {
        self.queue.schedule_at(self.now + delay, event);
    }

    /// Ask the loop to exit once the current handler returns
    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

pub trait LoopHandler {
    type Event;

    fn handle(&mut self, event: Self::Event, ctx: &mut LoopContext<Self::Event>);
}

/// Why [`EventLoop::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A handler requested exit
    Quit,
    /// No events were left to dispatch
    Drained,
}

pub struct EventLoop<E> {
    ctx: LoopContext<E>,
}

impl<E> EventLoop<E> {
    pub fn new() -> Self {
        Self {
            ctx: LoopContext::new(Instant::now()),
        }
    }

    /// Context for scheduling the initial events
    pub fn context_mut(&mut self) -> &mut LoopContext<E> {
        &mut self.ctx
    }

    /// Dispatch events until a handler quits or the queue drains.
    /// Consumes the loop: each run gets a fresh instance.
    pub async fn run<H>(mut self, handler: &mut H) -> LoopExit
    where
        H: LoopHandler<Event = E>,
    {
        loop {
            if self.ctx.quit {
                return LoopExit::Quit;
            }

            let Some(deadline) = self.ctx.queue.next_deadline() else {
                trace!("Event loop drained");
                return LoopExit::Drained;
            };

            tokio::time::sleep_until(deadline).await;
            self.ctx.now = Instant::now();

            while let Some(event) = self.ctx.queue.pop_due(self.ctx.now) {
                handler.handle(event, &mut self.ctx);
                if self.ctx.quit {
                    break;
                }
            }
        }
    }
}

impl<E> Default for EventLoop<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_orders_by_deadline_then_fifo() {
        let start = Instant::now();
        let mut queue = DeadlineQueue::new();
        queue.schedule_at(start + Duration::from_millis(20), "late");
        queue.schedule_at(start + Duration::from_millis(10), "first");
        queue.schedule_at(start + Duration::from_millis(10), "second");

        assert_eq!(queue.next_deadline(), Some(start + Duration::from_millis(10)));
        assert_eq!(queue.pop_due(start), None);

        let later = start + Duration::from_millis(15);
        assert_eq!(queue.pop_due(later), Some("first"));
        assert_eq!(queue.pop_due(later), Some("second"));
        assert_eq!(queue.pop_due(later), None);
        assert_eq!(queue.len(), 1);
    }

    struct Ticker {
        ticks: Vec<u32>,
        limit: u32,
    }

    impl LoopHandler for Ticker {
        type Event = u32;

        fn handle(&mut self, tick: u32, ctx: &mut LoopContext<u32>) {
            self.ticks.push(tick);
            if tick + 1 == self.limit {
                ctx.quit();
            } else {
                ctx.schedule_after(Duration::from_millis(100), tick + 1);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_runs_until_quit() {
        let mut handler = Ticker {
            ticks: Vec::new(),
            limit: 5,
        };
        let mut event_loop = EventLoop::new();
        event_loop.context_mut().schedule_now(0);

        let started = Instant::now();
        let exit = event_loop.run(&mut handler).await;

        assert_eq!(exit, LoopExit::Quit);
        assert_eq!(handler.ticks, vec![0, 1, 2, 3, 4]);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    struct Recorder(Vec<&'static str>);

    impl LoopHandler for Recorder {
        type Event = &'static str;

        fn handle(&mut self, event: &'static str, _ctx: &mut LoopContext<&'static str>) {
            self.0.push(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_drains_in_order() {
        let mut handler = Recorder(Vec::new());
        let mut event_loop = EventLoop::new();
        let ctx = event_loop.context_mut();
        ctx.schedule_after(Duration::from_secs(2), "measure");
        ctx.schedule_now("render");
        ctx.schedule_after(Duration::from_secs(1), "warmup");
        assert_eq!(ctx.pending(), 3);

        assert_eq!(event_loop.run(&mut handler).await, LoopExit::Drained);
        assert_eq!(handler.0, vec!["render", "warmup", "measure"]);
    }
}
