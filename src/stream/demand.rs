//! Byte-demand adapter between a chunked feed and a format decoder.
//!
//! A decoder asks for "exactly N more bytes" or "skip N bytes" and is resumed
//! once the feed has delivered enough, however the transport chunked them.
//! Holding `&mut self` across every await is what guarantees a decoder never
//! has two demands pending at once.

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use thiserror::Error;
use tokio::sync::mpsc;

/// The feed ended (or was abandoned) before a demand could be satisfied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("byte feed exhausted")]
pub struct Exhausted;

#[derive(Debug)]
pub struct ByteDemand {
    feed: mpsc::Receiver<Bytes>,
    queue: VecDeque<Bytes>,
    buffered: usize,
    position: u64,
    finished: bool,
}

impl ByteDemand {
    pub fn new(feed: mpsc::Receiver<Bytes>) -> Self {
        Self {
            feed,
            queue: VecDeque::new(),
            buffered: 0,
            position: 0,
            finished: false,
        }
    }

    /// Bounded feed paired with the demand side that reads it.
    pub fn channel(depth: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (tx, Self::new(rx))
    }

    /// Bytes consumed so far, delivered or skipped.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffered
    }

    async fn fill(&mut self) -> Result<(), Exhausted> {
        if self.finished {
            return Err(Exhausted);
        }
        loop {
            match self.feed.recv().await {
                Some(chunk) if chunk.is_empty() => continue,
                Some(chunk) => {
                    self.buffered += chunk.len();
                    self.queue.push_back(chunk);
                    return Ok(());
                }
                None => {
                    self.finished = true;
                    return Err(Exhausted);
                }
            }
        }
    }

    fn consume(&mut self, count: usize) {
        self.buffered -= count;
        self.position += count as u64;
    }

    /// Resolves with exactly `n` bytes once they are available.
    pub async fn demand_exact(&mut self, n: usize) -> Result<Bytes, Exhausted> {
        while self.buffered < n {
            self.fill().await?;
        }
        self.consume(n);

        if let Some(front) = self.queue.front_mut() {
            if front.len() >= n {
                let out = front.split_to(n);
                if front.is_empty() {
                    self.queue.pop_front();
                }
                return Ok(out);
            }
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let Some(mut front) = self.queue.pop_front() else {
                break;
            };
            let take = (n - out.len()).min(front.len());
            out.extend_from_slice(&front.split_to(take));
            if !front.is_empty() {
                self.queue.push_front(front);
            }
        }
        Ok(out.freeze())
    }

    /// Resolves with whatever is buffered or arrives next, at most `limit` bytes.
    pub async fn demand_any(&mut self, limit: usize) -> Result<Bytes, Exhausted> {
        if limit == 0 {
            return Ok(Bytes::new());
        }
        if self.queue.is_empty() {
            self.fill().await?;
        }
        let Some(front) = self.queue.front_mut() else {
            return Err(Exhausted);
        };
        let out = front.split_to(limit.min(front.len()));
        if front.is_empty() {
            self.queue.pop_front();
        }
        self.consume(out.len());
        Ok(out)
    }

    /// Advances past `n` bytes without buffering them. `n == 0` resolves at once.
    pub async fn skip_exact(&mut self, n: u64) -> Result<(), Exhausted> {
        let mut remaining = n;
        loop {
            while remaining > 0 {
                let Some(front) = self.queue.front_mut() else {
                    break;
                };
                let take = usize::try_from(remaining).map_or(front.len(), |r| r.min(front.len()));
                front.advance(take);
                if front.is_empty() {
                    self.queue.pop_front();
                }
                self.consume(take);
                remaining -= take as u64;
            }
            if remaining == 0 {
                return Ok(());
            }
            self.fill().await?;
        }
    }

    /// Gives up on the rest of the input: the feed is closed, buffered bytes are
    /// dropped and every later demand resolves to [`Exhausted`].
    pub fn skip_rest(&mut self) {
        self.feed.close();
        self.queue.clear();
        self.buffered = 0;
        self.finished = true;
    }
}
