use std::io::BufRead;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;
use std::time::Instant;

/// Hash ring indexed by the halfmove clock. A reversible move raises the
/// clock by one, so positions repeating within the 50-move window land on
/// same-parity slots; an irreversible move resets the clock and naturally
/// fences the scan. Slots above 100 exist only so a node at the clock
/// ceiling can still be recorded before it is scored a draw.
pub struct RepetitionWindow {
    slots: [u64; 128],
}

impl RepetitionWindow {
    pub fn new() -> Self {
        RepetitionWindow { slots: [0; 128] }
    }

    pub fn clear(&mut self) {
        self.slots = [0; 128];
    }

    #[inline(always)]
    fn slot(clock: u32) -> usize {
        (clock as usize).min(127)
    }

    /// Write `hash` at the clock's slot, returning the displaced value so
    /// the caller can restore it when the node unwinds.
    #[inline(always)]
    pub fn record(&mut self, clock: u32, hash: u64) -> u64 {
        let slot = Self::slot(clock);
        let prev = self.slots[slot];
        self.slots[slot] = hash;
        prev
    }

    #[inline(always)]
    pub fn restore(&mut self, clock: u32, prev: u64) {
        self.slots[Self::slot(clock)] = prev;
    }

    #[inline(always)]
    pub fn get(&self, clock: u32) -> u64 {
        self.slots[Self::slot(clock)]
    }

    /// Threefold within the window: the hash recorded at `clock` occurs at
    /// least twice more on earlier same-parity slots.
    pub fn is_repetition(&self, clock: u32) -> bool {
        let hash = self.get(clock);
        let mut reps = 0;
        let mut i = Self::slot(clock) as i32 - 2;
        while i >= 0 {
            if self.slots[i as usize] == hash {
                reps += 1;
                if reps >= 2 {
                    return true;
                }
            }
            i -= 2;
        }
        false
    }
}

impl Default for RepetitionWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Stdin drained by a dedicated reader thread into a channel, so the
/// synchronous search can poll for `stop` without blocking. The engine
/// itself stays single-threaded; this is the stand-in for select(2).
pub struct InputQueue {
    rx: Receiver<String>,
}

impl InputQueue {
    pub fn spawn_stdin() -> Self {
        let (tx, rx) = channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        InputQueue { rx }
    }

    /// Next line if one is already buffered; `Closed` once stdin is gone.
    pub fn poll_line(&self) -> InputPoll {
        match self.rx.try_recv() {
            Ok(line) => InputPoll::Line(line),
            Err(TryRecvError::Empty) => InputPoll::Empty,
            Err(TryRecvError::Disconnected) => InputPoll::Closed,
        }
    }

    /// Block for the next line; `None` once stdin reaches EOF.
    pub fn next_line(&self) -> Option<String> {
        self.rx.recv().ok()
    }
}

pub enum InputPoll {
    Line(String),
    Empty,
    Closed,
}

/// Wall-clock budget plus the sticky stop flag. Polled once per 256 nodes.
pub struct SearchClock {
    start: Instant,
    budget_ms: u64,
    pub stop: bool,
    /// Set when a `quit` arrives while searching.
    pub quit: bool,
    analyzing: bool,
}

impl SearchClock {
    pub fn new(budget_ms: u64, analyzing: bool) -> Self {
        SearchClock {
            start: Instant::now(),
            budget_ms,
            stop: false,
            quit: false,
            analyzing,
        }
    }

    #[inline(always)]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Check the deadline and, when analyzing, the input queue. Lines other
    /// than `stop`/`quit` arriving mid-search are discarded.
    pub fn poll(&mut self, input: Option<&InputQueue>) -> bool {
        if self.stop {
            return true;
        }
        if self.elapsed_ms() >= self.budget_ms {
            self.stop = true;
            return true;
        }
        if self.analyzing
            && let Some(queue) = input
        {
            loop {
                match queue.poll_line() {
                    InputPoll::Line(line) => match line.trim() {
                        "stop" => self.stop = true,
                        "quit" => {
                            self.stop = true;
                            self.quit = true;
                        }
                        _ => {}
                    },
                    InputPoll::Empty => break,
                    InputPoll::Closed => {
                        // Stdin went away mid-analysis; wind down.
                        self.stop = true;
                        self.quit = true;
                        break;
                    }
                }
            }
        }
        self.stop
    }
}
