use ethers::types::Address;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    config::ClientConfig,
    constants::{MAX_KITTENS, MIN_KITTENS, WALLET_STATUS_SLOT},
    error::{ConnectError, SyncError},
    game::{SaveState, SlotAllocator, SlotId},
    integrations::{
        relay_client::{validate_sync_input, RelayClient},
        wallet::{WalletProvider, WalletSession},
    },
    models::TxId,
    retry::RetryPolicy,
    utils::{checksum, is_valid_kitten_count},
};

/// Where status lines for the player go (the game's message window).
pub trait MessageSink: Send + Sync {
    fn push(&self, message: &str);
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn push(&self, message: &str) {
        tracing::info!("game message: {}", message);
    }
}

/// Sink that keeps every line, for hosts that render later and for tests.
#[derive(Debug, Default)]
pub struct MessageLog {
    lines: std::sync::Mutex<Vec<String>>,
}

impl MessageLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.lines().pop()
    }
}

impl MessageSink for MessageLog {
    fn push(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}

/// Lifecycle callbacks the host invokes on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The host finished (or restarted) booting a save.
    Boot,
    /// A map scene was created.
    MapCreated,
    /// Per-frame map update.
    MapUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    Collected { total: i64 },
    AtMaximum { total: i64 },
    /// The counter slot does not exist yet; the collect is queued.
    Deferred { pending: u32 },
}

struct SessionState<S> {
    save: S,
    pending_collections: u32,
    allocator: SlotAllocator,
}

impl<S: SaveState> SessionState<S> {
    fn ready_slot(&self) -> Option<SlotId> {
        if self.save.is_ready() {
            self.save.kitten_slot()
        } else {
            None
        }
    }

    fn increment(&mut self, slot: SlotId) -> CollectOutcome {
        let current = self.save.value(slot.0);
        if current >= MAX_KITTENS {
            return CollectOutcome::AtMaximum { total: current };
        }
        let total = current + 1;
        self.save.set_value(slot.0, total);
        CollectOutcome::Collected { total }
    }

    fn drain_pending(&mut self, slot: SlotId) {
        if self.pending_collections == 0 {
            return;
        }
        let pending = std::mem::take(&mut self.pending_collections);
        for _ in 0..pending {
            self.increment(slot);
        }
        tracing::info!(
            "Replayed {} pending kitten collections into variable {}",
            pending,
            slot
        );
    }
}

/// One player's kitten-sync session, owned by the host game.
///
/// The save state and the queue of early collects sit behind a single lock,
/// so gameplay increments and relay confirmations never interleave. Sync calls
/// additionally pass through `sync_gate`, so at most one relay round trip is
/// in flight per session.
pub struct KittenSession<S: SaveState> {
    state: Mutex<SessionState<S>>,
    sync_gate: Mutex<()>,
    wallet: WalletSession,
    relay: RelayClient,
    retry: RetryPolicy,
    messages: Arc<dyn MessageSink>,
}

impl<S: SaveState> KittenSession<S> {
    pub fn new(save: S, wallet: WalletSession, relay: RelayClient) -> Self {
        Self {
            state: Mutex::new(SessionState {
                save,
                pending_collections: 0,
                allocator: SlotAllocator::new(),
            }),
            sync_gate: Mutex::new(()),
            wallet,
            relay,
            retry: RetryPolicy::default(),
            messages: Arc::new(TracingSink),
        }
    }

    /// Session wired from client settings: the wallet must be on
    /// `config.expected_chain_id` and syncs go to `config.relay_url`.
    pub fn from_client_config(
        save: S,
        wallet: Option<Arc<dyn WalletProvider>>,
        config: &ClientConfig,
    ) -> Result<Self, SyncError> {
        let relay = RelayClient::new(config)?;
        Ok(Self::new(
            save,
            WalletSession::new(wallet, config.expected_chain_id),
            relay,
        ))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_allocator(mut self, allocator: SlotAllocator) -> Self {
        self.state.get_mut().allocator = allocator;
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageSink>) -> Self {
        self.messages = messages;
        self
    }

    pub fn into_save(self) -> S {
        self.state.into_inner().save
    }

    /// Runs `f` against the save under the session lock (e.g. to persist it).
    pub async fn with_save<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        let mut state = self.state.lock().await;
        f(&mut state.save)
    }

    pub async fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::Boot | HostEvent::MapCreated => {
                if let Err(err) = self.try_initialize().await {
                    tracing::debug!("{:?}: session not initialized yet: {}", event, err);
                }
            }
            HostEvent::MapUpdate => {
                if self.pending_collections().await > 0 {
                    if let Err(err) = self.try_initialize().await {
                        tracing::debug!("{:?}: pending collects still queued: {}", event, err);
                    }
                }
            }
        }
    }

    /// One readiness check: allocate or restore the slot and replay queued collects.
    pub async fn try_initialize(&self) -> Result<SlotId, SyncError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let slot = state.allocator.allocate_or_restore(&mut state.save)?;
        state.drain_pending(slot);
        Ok(slot)
    }

    /// `try_initialize` under the session's bounded backoff.
    pub async fn ensure_ready(&self) -> Result<SlotId, SyncError> {
        self.retry
            .run("kitten session", move || self.try_initialize())
            .await
    }

    /// Background readiness watch for hosts that want early collects drained
    /// without waiting for the next lifecycle event.
    pub fn spawn_readiness_watch(
        self: Arc<Self>,
    ) -> tokio::task::JoinHandle<Result<SlotId, SyncError>>
    where
        S: 'static,
    {
        tokio::spawn(async move { self.ensure_ready().await })
    }

    pub async fn kitten_count(&self) -> Option<i64> {
        let state = self.state.lock().await;
        state.ready_slot().map(|slot| state.save.value(slot.0))
    }

    pub async fn pending_collections(&self) -> u32 {
        self.state.lock().await.pending_collections
    }

    /// Gameplay "collect a kitten".
    pub async fn collect(&self) -> CollectOutcome {
        let outcome = {
            let mut state = self.state.lock().await;
            match state.ready_slot() {
                Some(slot) => {
                    state.drain_pending(slot);
                    state.increment(slot)
                }
                None => {
                    state.pending_collections += 1;
                    CollectOutcome::Deferred {
                        pending: state.pending_collections,
                    }
                }
            }
        };

        match outcome {
            CollectOutcome::Collected { total } => {
                self.say(&format!("Collected a kitten! Total: {}", total));
            }
            CollectOutcome::AtMaximum { total } => {
                self.say(&format!("You already have {} kittens.", total));
            }
            CollectOutcome::Deferred { pending } => {
                tracing::info!("Collect queued before initialization ({} pending)", pending);
            }
        }
        outcome
    }

    /// Connects the wallet and records the result in the UI status slot.
    pub async fn connect(&self) -> Result<Address, ConnectError> {
        let result = self.wallet.connect().await;

        {
            let mut state = self.state.lock().await;
            if state.save.is_ready() {
                let flag = if result.is_ok() { 1 } else { 0 };
                state.save.set_value(WALLET_STATUS_SLOT, flag);
            }
        }

        match &result {
            Ok(address) => self.say(&format!("Connected: {}", checksum(address))),
            Err(err) => self.say(&err.to_string()),
        }
        result
    }

    /// Pushes the current local count to the chain for the connected wallet.
    pub async fn sync(&self) -> Result<TxId, SyncError> {
        let address = match self.wallet.connect().await {
            Ok(address) => checksum(&address),
            Err(err) => return self.report(Err(err.into())),
        };
        let result = self.sync_inner(None, &address).await;
        self.finish_sync(result)
    }

    /// Sets the on-chain count to `count` for the connected wallet.
    pub async fn sync_count(&self, count: i64) -> Result<TxId, SyncError> {
        if !is_valid_kitten_count(count) {
            return self.report(Err(SyncError::InvalidInput(format!(
                "kitten count {} outside 0..=60",
                count
            ))));
        }
        let address = match self.wallet.connect().await {
            Ok(address) => checksum(&address),
            Err(err) => return self.report(Err(err.into())),
        };
        self.sync_to(count, &address).await
    }

    /// Relays `count` for `address`; on confirmation the local counter becomes
    /// `count`, plus any kittens collected while the relay was answering. On any
    /// failure the local counter is left as it was.
    pub async fn sync_to(&self, count: i64, address: &str) -> Result<TxId, SyncError> {
        if let Err(err) = validate_sync_input(count, address) {
            return self.report(Err(err));
        }
        let result = self.sync_inner(Some(count), address).await;
        self.finish_sync(result)
    }

    /// `count` of `None` relays whatever the counter holds once the gate is taken.
    async fn sync_inner(
        &self,
        count: Option<i64>,
        address: &str,
    ) -> Result<(i64, TxId), SyncError> {
        let _gate = self.sync_gate.lock().await;
        let slot = self.ensure_ready().await?;

        // Only sync writes below this baseline, and sync holds the gate, so any
        // growth seen at confirmation time is gameplay that happened in flight.
        let baseline = self.with_save(|save| save.value(slot.0)).await;
        let count = count.unwrap_or(baseline);
        validate_sync_input(count, address)?;

        let tx_hash = self.relay.set_kittens(count, address).await?;

        let mut state = self.state.lock().await;
        let collected_in_flight = state.save.value(slot.0) - baseline;
        let local = (count + collected_in_flight).clamp(MIN_KITTENS, MAX_KITTENS);
        state.save.set_value(slot.0, local);
        tracing::info!(
            "Kitten count reconciled to {} for {} (tx {}, {} collected in flight)",
            count,
            address,
            tx_hash,
            collected_in_flight
        );
        Ok((count, tx_hash))
    }

    fn finish_sync(&self, result: Result<(i64, TxId), SyncError>) -> Result<TxId, SyncError> {
        let result = result.map(|(count, tx_hash)| {
            self.say(&format!("Kittens updated to {}! Tx: {}", count, tx_hash));
            tx_hash
        });
        self.report(result)
    }

    /// On-chain count for the connected wallet. Never fails: errors read as 0.
    pub async fn get_kittens(&self) -> u64 {
        let address = match self.wallet.connect().await {
            Ok(address) => checksum(&address),
            Err(err) => {
                self.say(&err.to_string());
                return 0;
            }
        };

        match self.relay.get_kittens(&address).await {
            Ok(kittens) => {
                self.say(&format!("Your kittens: {}", kittens));
                kittens
            }
            Err(err) => {
                tracing::warn!("getKittens failed for {}: {}", address, err);
                self.say(&err.user_message());
                0
            }
        }
    }

    fn report<T>(&self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        if let Err(err) = &result {
            tracing::warn!("kitten sync failed: {}", err);
            self.say(&err.user_message());
        }
        result
    }

    fn say(&self, message: &str) {
        self.messages.push(message);
    }
}
