//! Transfer engine
//!
//! Enumerates the source, then streams every file to the destination through
//! a bounded pipe, with up to `parallel` files in flight at once. Each file
//! is a pair of cooperating tasks: a producer downloading into the pipe's
//! write half and a consumer uploading from its read half. The pair holds one
//! semaphore slot for its whole lifetime.
//!
//! The first error published by any task is the copy's result. Cancellation
//! is cooperative: pairs not yet scheduled are skipped, pairs not yet started
//! return without touching the network, and in-flight operations run to
//! completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info};

use crate::error::{Direction, Error, Result};
use crate::path::{Scheme, Uri, join_key};
use crate::pipe::pipe;
use crate::traits::{Backend, ByteSource};

const MIB: f64 = (1024 * 1024) as f64;

#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Files in flight at once; 0 admits every file simultaneously.
    pub parallel: usize,
    /// Pipe buffer per in-flight file, in MiB.
    pub buffer_size_mib: f64,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            parallel: 1,
            buffer_size_mib: 6.75,
        }
    }
}

impl CopyOptions {
    fn buffer_bytes(&self) -> usize {
        (self.buffer_size_mib * MIB) as usize
    }
}

/// One file's source and destination paths within their backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromTo {
    pub from: String,
    pub to: String,
}

/// Copies every file beneath `src_uri` to the corresponding path beneath
/// `dst_uri`. Returns the number of files enumerated; an empty enumeration
/// is a successful no-op.
pub async fn copy<B>(
    src: Arc<B>,
    dst: Arc<B>,
    src_uri: &Uri,
    dst_uri: &Uri,
    options: &CopyOptions,
) -> Result<usize>
where
    B: Backend + 'static,
{
    let relative = src
        .list(&src_uri.path)
        .await
        .map_err(|e| Error::List(format!("{src_uri}: {e}")))?;
    let pairs = from_to_pairs(&src_uri.path, &dst_uri.path, &relative);
    let total = pairs.len();
    transfer_all(src, dst, src_uri.scheme, dst_uri.scheme, pairs, options).await?;
    Ok(total)
}

/// Builds the (from, to) pair for every enumerated relative suffix. The
/// empty suffix (single-file source) maps the base paths onto each other.
pub fn from_to_pairs(src_base: &str, dst_base: &str, relative: &[String]) -> Vec<FromTo> {
    relative
        .iter()
        .map(|r| FromTo {
            from: join_key(src_base, r),
            to: join_key(dst_base, r),
        })
        .collect()
}

async fn transfer_all<B>(
    src: Arc<B>,
    dst: Arc<B>,
    src_scheme: Scheme,
    dst_scheme: Scheme,
    pairs: Vec<FromTo>,
    options: &CopyOptions,
) -> Result<()>
where
    B: Backend + 'static,
{
    let total = pairs.len();
    if total == 0 {
        return Ok(());
    }

    let slots = if options.parallel == 0 {
        total
    } else {
        options.parallel.min(total)
    };
    let semaphore = Arc::new(Semaphore::new(slots));
    let (errors, mut first_error) = ErrorSlot::new();
    let width = total.to_string().len();
    let buffer = options.buffer_bytes();

    let mut transfers = Vec::with_capacity(total);
    for (index, pair) in pairs.into_iter().enumerate() {
        if errors.tripped() {
            break;
        }

        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|_| Error::Invariant("transfer semaphore closed".to_string()))?;

        let task = TransferTask {
            src: Arc::clone(&src),
            dst: Arc::clone(&dst),
            src_scheme,
            dst_scheme,
            pair,
            index: index + 1,
            total,
            width,
            buffer,
            errors: errors.clone(),
        };
        transfers.push(tokio::spawn(async move {
            task.run().await;
            drop(permit);
        }));
    }

    for transfer in transfers {
        transfer
            .await
            .map_err(|e| Error::Invariant(format!("transfer task panicked: {e}")))?;
    }

    drop(errors);
    match first_error.recv().await {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Single-slot channel carrying the first error out of the in-flight
/// transfers; later errors are dropped. The trip flag is what the engine and
/// the task halves poll for best-effort early stopping.
#[derive(Clone)]
struct ErrorSlot {
    flag: Arc<AtomicBool>,
    slot: mpsc::Sender<Error>,
}

impl ErrorSlot {
    fn new() -> (Self, mpsc::Receiver<Error>) {
        let (slot, receiver) = mpsc::channel(1);
        (
            Self {
                flag: Arc::new(AtomicBool::new(false)),
                slot,
            },
            receiver,
        )
    }

    fn publish(&self, error: Error) {
        self.flag.store(true, Ordering::SeqCst);
        // A full slot means another transfer already failed first.
        let _ = self.slot.try_send(error);
    }

    fn tripped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct TransferTask<B> {
    src: Arc<B>,
    dst: Arc<B>,
    src_scheme: Scheme,
    dst_scheme: Scheme,
    pair: FromTo,
    index: usize,
    total: usize,
    width: usize,
    buffer: usize,
    errors: ErrorSlot,
}

impl<B> TransferTask<B>
where
    B: Backend + 'static,
{
    async fn run(self) {
        let Self {
            src,
            dst,
            src_scheme,
            dst_scheme,
            pair: FromTo { from, to },
            index,
            total,
            width,
            buffer,
            errors,
        } = self;

        if errors.tripped() {
            return;
        }

        let (mut writer, reader) = pipe(buffer);
        info!("[{index:0width$}/{total}] copy: {src_scheme}://{from} -> {dst_scheme}://{to}");

        let producer = {
            let src = Arc::clone(&src);
            let from = from.clone();
            let errors = errors.clone();
            tokio::spawn(async move {
                if !errors.tripped() {
                    if let Err(err) = src.download(&from, &mut writer).await {
                        error!("{err} src: file: {from}");
                        errors.publish(Error::Transfer {
                            direction: Direction::Src,
                            path: from.clone(),
                            message: err.to_string(),
                        });
                    }
                }
                // Close the write end on success and failure alike so the
                // consumer observes end-of-stream.
                let _ = writer.shutdown().await;
            })
        };

        let consumer = tokio::spawn(async move {
            if errors.tripped() {
                return;
            }
            let source: ByteSource = Box::new(reader);
            if let Err(err) = dst.upload(&to, &from, source).await {
                error!("{err} dst: file: {to}");
                errors.publish(Error::Transfer {
                    direction: Direction::Dst,
                    path: to.clone(),
                    message: err.to_string(),
                });
            }
            info!("[{index:0width$}/{total}] done: {src_scheme}://{from} -> {dst_scheme}://{to}");
        });

        // Await both halves even after a failure so the pipe and the slot are
        // released only once nothing references them.
        let _ = tokio::join!(producer, consumer);
    }
}
