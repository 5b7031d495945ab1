use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};

use crate::{
    account::store::{AccountStore, AccountWrite, StoreError},
    codec::DecodeOutcome,
    persist::{AccountSink, PersistError, PersistResult},
    record::{TransactionPatch, TransactionRecord},
    resolve::AddressResolver,
    types::{ActorId, Address, BatchId, WriteSeq},
};

use super::events::LedgerEvent;

/// Failures surfaced through [`LedgerHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The account store rejected the command.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Persistence failed or its queue is full.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The runtime task has stopped.
    #[error("ledger runtime channel closed")]
    ChannelClosed,
}

/// Batching and queueing knobs for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Flush the persistence batch as soon as a create arrives.
    pub flush_on_create: bool,
    /// Flush once this many writes are buffered.
    pub batch_max_ops: usize,
    /// Flush a non-empty buffer after this many milliseconds.
    pub batch_max_latency_ms: u64,
    /// Capacity of the persistence queue.
    pub persist_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            flush_on_create: true,
            batch_max_ops: 32,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
        }
    }
}

/// Cloneable handle to the single-writer ledger task.
#[derive(Clone)]
pub struct LedgerHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LedgerEvent>,
}

type Records = Vec<(Address, TransactionRecord)>;

enum Command {
    Create {
        record: TransactionRecord,
        resp: oneshot::Sender<Result<Address, RuntimeError>>,
    },
    Replace {
        address: Address,
        record: TransactionRecord,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Update {
        address: Address,
        patch: TransactionPatch,
        resp: oneshot::Sender<Result<TransactionRecord, RuntimeError>>,
    },
    Read {
        address: Address,
        resp: oneshot::Sender<Option<DecodeOutcome>>,
    },
    FindById {
        transaction_id: String,
        resp: oneshot::Sender<Result<Option<(Address, TransactionRecord)>, RuntimeError>>,
    },
    Scan {
        resp: oneshot::Sender<Records>,
    },
    ByActor {
        actor: ActorId,
        resp: oneshot::Sender<Records>,
    },
    ByBatch {
        batch: BatchId,
        resp: oneshot::Sender<Records>,
    },
    Flush {
        resp: oneshot::Sender<Result<WriteSeq, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Write(AccountWrite, bool),
    Flush {
        resp: oneshot::Sender<Result<WriteSeq, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the ledger task on the current tokio runtime.
///
/// Without a sink every write is reported durable immediately.
pub fn spawn_ledger(
    store: AccountStore,
    resolver: Arc<dyn AddressResolver>,
    sink: Option<Box<dyn AccountSink>>,
    config: RuntimeConfig,
) -> LedgerHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<LedgerEvent>(1024);

    let (persist_tx_opt, mut durable_rx) = if let Some(sink) = sink {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound);
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<WriteSeq, PersistError>>();
        tokio::spawn(PersistWorker::new(sink, durable_tx, config.clone()).run(persist_rx));
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut ctx = LoopCtx {
            store,
            resolver,
            events_tx: events_tx_loop,
            persist_tx: persist_tx_opt,
        };

        let mut durable_open = true;
        loop {
            if let Some(rx) = durable_rx.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break; };
                        if ctx.handle_command(cmd).await {
                            break;
                        }
                    }
                    durable = rx.recv(), if durable_open => {
                        match durable {
                            Some(Ok(seq)) => {
                                let _ = ctx.events_tx.send(LedgerEvent::DurableUpTo { seq });
                            }
                            Some(Err(err)) => error!(%err, "account persistence failed"),
                            None => durable_open = false,
                        }
                    }
                }
            } else {
                let Some(cmd) = cmd_rx.recv().await else { break; };
                if ctx.handle_command(cmd).await {
                    break;
                }
            }
        }
    });

    LedgerHandle { cmd_tx, events_tx }
}

impl LedgerHandle {
    /// Subscribes to ledger events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    /// Writes `record` to its resolved account and returns the address.
    pub async fn create(&self, record: TransactionRecord) -> Result<Address, RuntimeError> {
        self.request(|resp| Command::Create { record, resp }).await?
    }

    /// Rewrites the account at `address` with `record`.
    pub async fn replace(&self, address: Address, record: TransactionRecord) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Replace { address, record, resp }).await?
    }

    /// Applies `patch` to the record at `address` and returns the new record.
    pub async fn update(
        &self,
        address: Address,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, RuntimeError> {
        self.request(|resp| Command::Update { address, patch, resp }).await?
    }

    /// Decodes the account at `address`.
    pub async fn read(&self, address: Address) -> Result<Option<DecodeOutcome>, RuntimeError> {
        self.request(|resp| Command::Read { address, resp }).await
    }

    /// Returns the record at `address` when it decodes.
    pub async fn get(&self, address: Address) -> Result<Option<TransactionRecord>, RuntimeError> {
        Ok(self.read(address).await?.and_then(DecodeOutcome::into_record))
    }

    /// Looks a record up by transaction id.
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: impl Into<String>,
    ) -> Result<Option<(Address, TransactionRecord)>, RuntimeError> {
        let transaction_id = transaction_id.into();
        self.request(|resp| Command::FindById { transaction_id, resp }).await?
    }

    /// Every decodable record.
    pub async fn scan(&self) -> Result<Records, RuntimeError> {
        self.request(|resp| Command::Scan { resp }).await
    }

    /// Records involving `actor`.
    pub async fn by_actor(&self, actor: ActorId) -> Result<Records, RuntimeError> {
        self.request(|resp| Command::ByActor { actor, resp }).await
    }

    /// Records moving `batch`.
    pub async fn by_batch(&self, batch: BatchId) -> Result<Records, RuntimeError> {
        self.request(|resp| Command::ByBatch { batch, resp }).await
    }

    /// Waits until buffered writes are persisted; returns the durable sequence.
    pub async fn flush(&self) -> Result<WriteSeq, RuntimeError> {
        self.request(|resp| Command::Flush { resp }).await?
    }

    /// Flushes persistence and stops the runtime task.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

struct LoopCtx {
    store: AccountStore,
    resolver: Arc<dyn AddressResolver>,
    events_tx: broadcast::Sender<LedgerEvent>,
    persist_tx: Option<mpsc::Sender<PersistMsg>>,
}

impl LoopCtx {
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Create { record, resp } => {
                let res = match self.store.create(self.resolver.as_ref(), &record) {
                    Ok((resolved, write)) => self.commit(write, true).map(|seq| {
                        self.announce(
                            LedgerEvent::Created {
                                address: resolved.address,
                                transaction_id: record.transaction_id.clone(),
                            },
                            seq,
                        );
                        resolved.address
                    }),
                    Err(err) => Err(err.into()),
                };
                let _ = resp.send(res);
            }
            Command::Replace {
                address,
                record,
                resp,
            } => {
                let res = match self.store.replace(address, &record) {
                    Ok(write) => self
                        .commit(write, false)
                        .map(|seq| self.announce(LedgerEvent::Replaced { address }, seq)),
                    Err(err) => Err(err.into()),
                };
                let _ = resp.send(res);
            }
            Command::Update {
                address,
                patch,
                resp,
            } => {
                let res = match self.store.update(address, &patch) {
                    Ok((record, write)) => self.commit(write, false).map(|seq| {
                        self.announce(LedgerEvent::Replaced { address }, seq);
                        record
                    }),
                    Err(err) => Err(err.into()),
                };
                let _ = resp.send(res);
            }
            Command::Read { address, resp } => {
                let _ = resp.send(self.store.read(address));
            }
            Command::FindById {
                transaction_id,
                resp,
            } => {
                let res = self
                    .store
                    .find_by_transaction_id(self.resolver.as_ref(), &transaction_id)
                    .map_err(RuntimeError::from);
                let _ = resp.send(res);
            }
            Command::Scan { resp } => {
                let _ = resp.send(self.store.scan());
            }
            Command::ByActor { actor, resp } => {
                let _ = resp.send(self.store.by_actor(actor));
            }
            Command::ByBatch { batch, resp } => {
                let _ = resp.send(self.store.by_batch(batch));
            }
            Command::Flush { resp } => {
                let out = match &self.persist_tx {
                    Some(tx) => {
                        let (flush_tx, flush_rx) = oneshot::channel();
                        match tx.send(PersistMsg::Flush { resp: flush_tx }).await {
                            Ok(()) => flush_rx
                                .await
                                .map_err(|_| RuntimeError::ChannelClosed)
                                .and_then(|r| r.map_err(RuntimeError::from)),
                            Err(_) => Err(RuntimeError::ChannelClosed),
                        }
                    }
                    None => Ok(self.store.latest_seq()),
                };
                let _ = resp.send(out);
            }
            Command::Shutdown { resp } => {
                let out = match &self.persist_tx {
                    Some(tx) => {
                        let (done_tx, done_rx) = oneshot::channel();
                        match tx.send(PersistMsg::Shutdown { resp: done_tx }).await {
                            Ok(()) => done_rx.await.map_err(|_| RuntimeError::ChannelClosed),
                            Err(_) => Err(RuntimeError::ChannelClosed),
                        }
                    }
                    None => Ok(()),
                };
                let _ = resp.send(out);
                return true;
            }
        }

        false
    }

    // Queues `write` for persistence. A rejected write is undone in the store,
    // so the account is left as it was before the command.
    fn commit(&mut self, write: AccountWrite, is_create: bool) -> Result<WriteSeq, RuntimeError> {
        let seq = write.seq;
        let address = write.address;
        let Some(tx) = &self.persist_tx else {
            return Ok(seq);
        };

        match tx.try_send(PersistMsg::Write(write, is_create)) {
            Ok(()) => {
                debug!(%address, seq, "account write queued");
                Ok(seq)
            }
            Err(err) => {
                if let Err(undo_err) = self.store.undo_last_write() {
                    error!(%address, seq, %undo_err, "could not undo rejected account write");
                }
                warn!(%address, seq, "persist queue rejected account write");
                Err(RuntimeError::Persist(PersistError::Message(format!(
                    "persist queue error: {err}"
                ))))
            }
        }
    }

    // Without a sink a write is durable as soon as it is announced.
    fn announce(&self, event: LedgerEvent, seq: WriteSeq) {
        let _ = self.events_tx.send(event);
        if self.persist_tx.is_none() {
            let _ = self.events_tx.send(LedgerEvent::DurableUpTo { seq });
        }
    }
}

// Owns the sink and writes account buffers out in batches. A batch that fails
// stays buffered and is retried by the next flush.
struct PersistWorker {
    sink: Option<Box<dyn AccountSink>>,
    buf: Vec<AccountWrite>,
    durable: WriteSeq,
    durable_tx: mpsc::UnboundedSender<Result<WriteSeq, PersistError>>,
    config: RuntimeConfig,
}

impl PersistWorker {
    fn new(
        sink: Box<dyn AccountSink>,
        durable_tx: mpsc::UnboundedSender<Result<WriteSeq, PersistError>>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            sink: Some(sink),
            buf: Vec::new(),
            durable: 0,
            durable_tx,
            config,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<PersistMsg>) {
        let latency = Duration::from_millis(self.config.batch_max_latency_ms);
        let mut deadline = Instant::now() + latency;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(PersistMsg::Write(write, is_create)) => {
                            self.buf.push(write);
                            let full = self.buf.len() >= self.config.batch_max_ops;
                            if full || (self.config.flush_on_create && is_create) {
                                let _ = self.write_out(true).await;
                                deadline = Instant::now() + latency;
                            }
                        }
                        Some(PersistMsg::Flush { resp }) => {
                            let res = self.write_out(true).await.map(|()| self.durable);
                            let _ = resp.send(res);
                            deadline = Instant::now() + latency;
                        }
                        Some(PersistMsg::Shutdown { resp }) => {
                            self.finish().await;
                            let _ = resp.send(());
                            break;
                        }
                        None => {
                            self.finish().await;
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !self.buf.is_empty() => {
                    let _ = self.write_out(false).await;
                    deadline = Instant::now() + latency;
                }
            }
        }
    }

    async fn finish(&mut self) {
        if self.write_out(true).await.is_err() {
            warn!(pending = self.buf.len(), "stopping with unpersisted account writes");
        }
    }

    async fn write_out(&mut self, checkpoint: bool) -> PersistResult<()> {
        let sink = self
            .sink
            .take()
            .ok_or_else(|| PersistError::Message("account sink lost".to_string()))?;
        let writes = std::mem::take(&mut self.buf);

        let (sink, writes, res) = tokio::task::spawn_blocking(move || {
            let mut sink = sink;
            let res = store_batch(sink.as_mut(), &writes, checkpoint);
            (sink, writes, res)
        })
        .await
        .map_err(|err| PersistError::Message(format!("persist task failed: {err}")))?;
        self.sink = Some(sink);

        match res {
            Ok(Some(seq)) => {
                self.durable = self.durable.max(seq);
                let _ = self.durable_tx.send(Ok(self.durable));
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                let newer = std::mem::replace(&mut self.buf, writes);
                self.buf.extend(newer);
                let _ = self
                    .durable_tx
                    .send(Err(PersistError::Message(format!("put failed: {err}"))));
                Err(err)
            }
        }
    }
}

// Returns the last stored sequence, or `None` when there was nothing to store.
fn store_batch(
    sink: &mut dyn AccountSink,
    writes: &[AccountWrite],
    checkpoint: bool,
) -> PersistResult<Option<WriteSeq>> {
    let seq = if writes.is_empty() {
        None
    } else {
        Some(sink.put_accounts(writes)?)
    };
    if checkpoint {
        sink.flush()?;
    }
    Ok(seq)
}
