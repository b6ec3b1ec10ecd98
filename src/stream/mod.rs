//! Streaming probe: every decoder races over its own copy of the input and the
//! first one to report a size wins.
//!
//! Chunks are handed out in lockstep. The next read from the source only
//! happens once every live decoder has taken the previous chunk into its own
//! buffer, so a decoder that can already answer does so before more input is
//! pulled.

pub mod demand;

pub use demand::{ByteDemand, Exhausted};

use bytes::{Bytes, BytesMut};
use std::io;
use std::mem;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, trace, warn};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::formats::ImageFormat;
use crate::types::SizeResult;

/// A feed holds at most the chunk currently being handed off.
const FEED_DEPTH: usize = 1;

type Feed = mpsc::Sender<Bytes>;

/// Probes `source` with every format and the default configuration.
///
/// The source is read only as far as needed; pass `&mut reader` to keep using
/// it afterwards.
pub async fn probe_stream<R>(source: R) -> Result<SizeResult, ProbeError>
where
    R: AsyncRead + Unpin,
{
    probe_stream_with(source, &ProbeConfig::default()).await
}

pub async fn probe_stream_with<R>(
    mut source: R,
    config: &ProbeConfig,
) -> Result<SizeResult, ProbeError>
where
    R: AsyncRead + Unpin,
{
    let mut decoders = JoinSet::new();
    let mut feeds = Vec::with_capacity(config.formats().len());
    for &format in config.formats() {
        let (feed, input) = ByteDemand::channel(FEED_DEPTH);
        feeds.push(feed);
        decoders.spawn(run_decoder(format, input));
    }

    let mut chunk = BytesMut::with_capacity(config.read_chunk_size());
    let mut pulled: u64 = 0;
    let mut source_error: Option<io::Error> = None;

    loop {
        tokio::select! {
            biased;

            finished = decoders.join_next() => match finished {
                Some(joined) => {
                    if let Some(result) = settle(joined) {
                        debug!(kind = %result.kind, pulled, "probe resolved");
                        // dropping the set aborts the decoders still running
                        return Ok(result);
                    }
                }
                None => break,
            },

            read = source.read_buf(&mut chunk), if !feeds.is_empty() => match read {
                Ok(0) => {
                    trace!(pulled, "source ended");
                    feeds.clear();
                }
                Ok(n) => {
                    pulled += n as u64;
                    let delivered = chunk.split().freeze();
                    match deliver(mem::take(&mut feeds), delivered, &mut decoders).await {
                        Delivery::Taken(open) => feeds = open,
                        Delivery::Resolved(result) => {
                            debug!(kind = %result.kind, pulled, "probe resolved");
                            return Ok(result);
                        }
                    }
                    chunk.reserve(config.read_chunk_size());
                }
                Err(err) => {
                    warn!(error = %err, pulled, "source failed");
                    source_error = Some(err);
                    feeds.clear();
                }
            },
        }
    }

    match source_error {
        Some(err) => Err(ProbeError::Io(err)),
        None => {
            debug!(pulled, "no decoder recognized the input");
            Err(ProbeError::Unrecognized)
        }
    }
}

enum Delivery {
    /// Every remaining feed took the chunk.
    Taken(Vec<Feed>),
    Resolved(SizeResult),
}

/// Hands `chunk` to every feed and waits until each decoder has taken it or
/// finished, settling decoders as they complete.
async fn deliver(
    feeds: Vec<Feed>,
    chunk: Bytes,
    decoders: &mut JoinSet<Option<SizeResult>>,
) -> Delivery {
    let handoff = hand_off(feeds, chunk);
    tokio::pin!(handoff);

    loop {
        tokio::select! {
            biased;

            Some(joined) = decoders.join_next() => {
                if let Some(result) = settle(joined) {
                    return Delivery::Resolved(result);
                }
            }

            open = &mut handoff => return Delivery::Taken(open),
        }
    }
}

async fn hand_off(feeds: Vec<Feed>, chunk: Bytes) -> Vec<Feed> {
    let mut sent = Vec::with_capacity(feeds.len());
    for feed in feeds {
        if feed.send(chunk.clone()).await.is_ok() {
            sent.push(feed);
        }
    }

    // a free slot means the decoder pulled the chunk into its own buffer
    let mut open = Vec::with_capacity(sent.len());
    for feed in sent {
        if feed.reserve().await.is_ok() {
            open.push(feed);
        }
    }
    open
}

/// The size a finished decoder task produced, if any.
fn settle(joined: Result<Option<SizeResult>, JoinError>) -> Option<SizeResult> {
    match joined {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "decoder task failed");
            None
        }
    }
}

async fn run_decoder(format: ImageFormat, mut input: ByteDemand) -> Option<SizeResult> {
    let outcome = format.decode(&mut input).await;
    input.skip_rest();

    match outcome {
        Ok(Some(result)) => {
            trace!(%format, consumed = input.position(), "decoder matched");
            Some(result)
        }
        Ok(None) => {
            trace!(%format, consumed = input.position(), "decoder rejected input");
            None
        }
        Err(Exhausted) => {
            trace!(%format, consumed = input.position(), "input ended before a verdict");
            None
        }
    }
}
