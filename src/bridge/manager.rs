//! Bridge - Orchestration Layer
//!
//! Decodes page requests, parks them until the user authorizes, then drives
//! each one through PIN check, key derivation, signing and broadcast.

use alloy_primitives::U256;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use zeroize::Zeroizing;

use super::emitter::ResponseEmitter;
use super::events::{HostEvent, PageContext};
use super::pending::{
    GasPrice, InteractionKind, InteractionStatus, ParkedTransaction, PendingInteraction,
    PendingInteractions,
};
use super::request::{BridgeRequest, Method};
use crate::chain::{Chain, Network};
use crate::config::{BridgeConfig, FALLBACK_GAS_LIMIT};
use crate::error::BridgeError;
use crate::evm::{
    parse_quantity, BroadcastReceipt, Broadcaster, FeeEstimate, GasPriceOracle, SigningRequest,
    TransactionSigner,
};
use crate::keys::{DerivedAddress, KeyManager, SecretPhrase};
use crate::nonce::NonceStore;
use crate::pin::{PinGate, Unlocked};
use crate::storage::SecureStore;

/// What happened to an inbound frame
#[derive(Debug)]
pub enum Dispatch {
    /// Not answered: malformed, unsupported, or no wallet configured
    Dropped(BridgeError),
    /// A script was sent back to the page
    Responded,
    /// Parked until the PIN sheet completes
    AwaitingUnlock,
    /// Parked until the confirmation sheet completes
    AwaitingTransaction,
}

/// Terminal outcome of a successful PIN submission
#[derive(Debug)]
pub enum Completion {
    Responded,
    Submitted(BroadcastReceipt),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct Bridge {
    config: Arc<BridgeConfig>,
    store: Arc<dyn SecureStore>,
    // PIN credential checks and the authorized host share one lock
    auth: Arc<Mutex<PinGate>>,
    pending: Arc<Mutex<PendingInteractions>>,
    active_chain: Arc<Mutex<Chain>>,
    gas_oracle: GasPriceOracle,
    broadcaster: Broadcaster,
    nonces: NonceStore,
    submissions: Arc<SubmissionLocks>,
    events: mpsc::UnboundedSender<HostEvent>,
}

/// One lock per chain, held from reading the nonce until the broadcast
/// outcome is recorded, so concurrent transactions never share a nonce.
#[derive(Default)]
struct SubmissionLocks {
    ethereum: AsyncMutex<()>,
    smartchain: AsyncMutex<()>,
}

impl SubmissionLocks {
    fn for_chain(&self, chain: Chain) -> &AsyncMutex<()> {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::SmartChain => &self.smartchain,
        }
    }
}

impl Bridge {
    // ============================================================================
    // Constructor
    // ============================================================================

    /// Create a bridge and the receiver for its UI events
    pub fn new(
        config: BridgeConfig,
        store: Arc<dyn SecureStore>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<HostEvent>), BridgeError> {
        let (events, receiver) = mpsc::unbounded_channel();
        let nonces = NonceStore::new(store.clone());

        let bridge = Self {
            gas_oracle: GasPriceOracle::new(&config)?,
            broadcaster: Broadcaster::new(&config, nonces.clone())?,
            auth: Arc::new(Mutex::new(PinGate::new(store.clone()))),
            pending: Arc::new(Mutex::new(PendingInteractions::default())),
            active_chain: Arc::new(Mutex::new(config.default_chain)),
            submissions: Arc::new(SubmissionLocks::default()),
            config: Arc::new(config),
            store,
            nonces,
            events,
        };
        Ok((bridge, receiver))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn nonces(&self) -> &NonceStore {
        &self.nonces
    }

    /// Chain selected by the last switch, else the default
    pub fn active_chain(&self) -> Chain {
        *lock(&self.active_chain)
    }

    /// Chain a page sees. A switch only applies to the authorized host;
    /// every other page stays on the default chain.
    pub fn chain_for_host(&self, host: &str) -> Chain {
        if lock(&self.auth).hosts().is_authorized(host) {
            self.active_chain()
        } else {
            self.config.default_chain
        }
    }

    fn emit(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Host event dropped: no receiver");
        }
    }

    // ============================================================================
    // Provisioning
    // ============================================================================

    /// Store a PIN and mnemonic (generated when absent); returns the addresses.
    pub fn provision(&self, pin: &str, mnemonic: Option<&str>) -> Result<Vec<DerivedAddress>, BridgeError> {
        let phrase = match mnemonic {
            Some(words) => SecretPhrase::parse(words)?,
            None => KeyManager::generate()?,
        };
        let addresses = KeyManager::derive_addresses(&phrase)?;

        lock(&self.auth).set_pin(pin)?;
        self.store.save_mnemonic(&phrase)?;
        log::info!("Wallet provisioned");
        Ok(addresses)
    }

    // ============================================================================
    // Page lifecycle
    // ============================================================================

    /// Install the provider for the active chain and, for the authorized
    /// host, its address.
    pub fn page_loaded(&self, page: &PageContext) {
        let chain = self.chain_for_host(&page.host);
        page.evaluate(&ResponseEmitter::provider_config(
            chain,
            &self.config.endpoints(chain).provider_rpc_url,
        ));

        let address = lock(&self.auth).hosts().address_for(&page.host, chain.network());
        if let Some(address) = address {
            page.evaluate(&ResponseEmitter::set_address(Network::Ethereum, &address));
        }
    }

    // ============================================================================
    // Dispatch
    // ============================================================================

    /// Handle one base64 frame from `page`.
    pub fn handle_message(&self, page: PageContext, payload: &str) -> Dispatch {
        match BridgeRequest::decode(payload) {
            Ok(request) => self.dispatch(page, request),
            Err(e) => {
                log::debug!("Dropping frame from {}: {}", page.host, e);
                Dispatch::Dropped(e)
            }
        }
    }

    pub fn dispatch(&self, page: PageContext, request: BridgeRequest) -> Dispatch {
        match self.store.is_configured() {
            Ok(true) => {}
            Ok(false) => {
                log::debug!("Dropping request {}: wallet not configured", request.id);
                return Dispatch::Dropped(BridgeError::WalletNotConfigured);
            }
            Err(e) => return Dispatch::Dropped(e.into()),
        }

        log::info!(
            "Request {} {} for {} from {}",
            request.id,
            request.method.name(),
            request.network,
            page.host
        );

        match request.method {
            Method::RequestAccounts => self.request_accounts(page, request),
            Method::SwitchChain => self.switch_chain(page, request),
            Method::SignTransaction => self.sign_transaction(page, request),
        }
    }

    fn request_accounts(&self, page: PageContext, request: BridgeRequest) -> Dispatch {
        let address = lock(&self.auth).hosts().address_for(&page.host, request.network);
        match address {
            Some(address) => {
                page.evaluate(&ResponseEmitter::accounts(request.network, request.id, &address));
                Dispatch::Responded
            }
            None => {
                self.park_for_unlock(page, &request, InteractionKind::Unlock);
                Dispatch::AwaitingUnlock
            }
        }
    }

    fn switch_chain(&self, page: PageContext, request: BridgeRequest) -> Dispatch {
        let (chain_id_hex, chain) = match request.requested_chain_id() {
            Ok((hex, id)) => match Chain::from_id(id) {
                Some(chain) => (hex, chain),
                None => {
                    log::warn!("Request {} asked for unknown chain {}", request.id, hex);
                    page.evaluate(&ResponseEmitter::unrecognized_chain(request.network, request.id, &hex));
                    return Dispatch::Responded;
                }
            },
            Err(e) => return Dispatch::Dropped(e),
        };

        let address = lock(&self.auth).hosts().address_for(&page.host, request.network);
        match address {
            Some(address) => {
                self.apply_chain_switch(&page, request.network, request.id, chain, &chain_id_hex, &address);
                Dispatch::Responded
            }
            None => {
                self.park_for_unlock(page, &request, InteractionKind::ChainSwitch { chain, chain_id_hex });
                Dispatch::AwaitingUnlock
            }
        }
    }

    fn sign_transaction(&self, page: PageContext, request: BridgeRequest) -> Dispatch {
        let fields = request.transaction_fields();
        let chain = self.chain_for_host(&page.host);
        let gas_limit = if fields.gas.is_empty() {
            FALLBACK_GAS_LIMIT.to_string()
        } else {
            fields.gas.clone()
        };
        let gas_price = if fields.gas_price.is_empty() {
            GasPrice::Loading
        } else {
            GasPrice::Supplied(fields.gas_price.clone())
        };

        let tx = ParkedTransaction {
            chain,
            fields,
            gas_limit,
            gas_price,
        };
        let fee = self.fee_estimate(&tx);
        let needs_gas_price = tx.gas_price.value().is_none();

        self.emit(HostEvent::ConfirmTransaction {
            id: request.id,
            host: page.host.clone(),
            chain,
            to: tx.fields.to.clone(),
            value: tx.fields.value.clone(),
            data: tx.fields.data.clone(),
            gas_limit: tx.gas_limit.clone(),
            gas_price: tx.gas_price.value().map(str::to_string),
            confirm_enabled: !needs_gas_price,
            fee,
        });

        lock(&self.pending).park(PendingInteraction {
            id: request.id,
            network: request.network,
            page,
            kind: InteractionKind::Transaction(tx),
        });

        if needs_gas_price {
            self.spawn_gas_lookup(request.id, chain);
        }
        Dispatch::AwaitingTransaction
    }

    fn park_for_unlock(&self, page: PageContext, request: &BridgeRequest, kind: InteractionKind) {
        self.emit(HostEvent::PromptUnlock {
            id: request.id,
            host: page.host.clone(),
            network: request.network,
            method: request.method.name().to_string(),
        });
        lock(&self.pending).park(PendingInteraction {
            id: request.id,
            network: request.network,
            page,
            kind,
        });
    }

    fn apply_chain_switch(
        &self,
        page: &PageContext,
        network: Network,
        id: u64,
        chain: Chain,
        chain_id_hex: &str,
        address: &str,
    ) {
        *lock(&self.active_chain) = chain;
        log::info!("Switched active chain to {}", chain);

        page.evaluate(&ResponseEmitter::provider_config(
            chain,
            &self.config.endpoints(chain).provider_rpc_url,
        ));
        page.evaluate(&ResponseEmitter::chain_switched(network, id, chain_id_hex, address));
    }

    // ============================================================================
    // Gas price
    // ============================================================================

    fn fee_estimate(&self, tx: &ParkedTransaction) -> Option<FeeEstimate> {
        let gas_price = parse_quantity(tx.gas_price.value()?).ok()?;
        let gas_limit = parse_quantity(&tx.gas_limit).ok()?;
        let usd_price = match self.store.load_token_price(tx.chain.ticker()) {
            Ok(price) => price,
            Err(e) => {
                log::debug!("No cached {} price: {}", tx.chain.ticker(), e);
                None
            }
        };
        Some(FeeEstimate::new(gas_limit, gas_price, usd_price.as_deref()))
    }

    fn spawn_gas_lookup(&self, id: u64, chain: Chain) {
        let bridge = self.clone();
        tokio::spawn(async move {
            bridge.resolve_gas_price(id, chain).await;
        });
    }

    async fn resolve_gas_price(&self, id: u64, chain: Chain) {
        let result = self.gas_oracle.fetch_gas_price(chain).await;

        let event = {
            let mut pending = lock(&self.pending);
            let Some(PendingInteraction {
                kind: InteractionKind::Transaction(tx),
                ..
            }) = pending.get_mut(id)
            else {
                log::debug!("Request {} closed before its gas price arrived", id);
                return;
            };

            match result {
                Ok(price) => {
                    tx.gas_price = GasPrice::Resolved(price.clone());
                    HostEvent::GasPriceResolved {
                        id,
                        gas_price: price,
                        fee: self.fee_estimate(tx),
                    }
                }
                Err(e) => {
                    log::warn!("Gas price for request {} unavailable: {}", id, e);
                    tx.gas_price = GasPrice::Unavailable(e.to_string());
                    HostEvent::GasPriceUnavailable {
                        id,
                        reason: e.to_string(),
                    }
                }
            }
        };
        self.emit(event);
    }

    /// Retry the oracle for a parked transaction without a usable price.
    pub fn refresh_gas_price(&self, id: u64) -> Result<(), BridgeError> {
        let chain = {
            let mut pending = lock(&self.pending);
            match pending.get_mut(id) {
                Some(PendingInteraction {
                    kind: InteractionKind::Transaction(tx),
                    ..
                }) => {
                    if matches!(tx.gas_price, GasPrice::Supplied(_) | GasPrice::Loading) {
                        return Ok(());
                    }
                    tx.gas_price = GasPrice::Loading;
                    tx.chain
                }
                Some(_) => {
                    return Err(BridgeError::UnsupportedMethod(format!(
                        "request {} is not a transaction",
                        id
                    )))
                }
                None => return Err(BridgeError::UnknownRequest(id)),
            }
        };
        self.spawn_gas_lookup(id, chain);
        Ok(())
    }

    // ============================================================================
    // User actions
    // ============================================================================

    pub fn status(&self, id: u64) -> InteractionStatus {
        lock(&self.pending).status(id)
    }

    /// User closed the sheet: clear the interaction and reject the DApp promise.
    pub fn cancel(&self, id: u64) -> Result<(), BridgeError> {
        let interaction = lock(&self.pending)
            .remove(id)
            .ok_or(BridgeError::UnknownRequest(id))?;
        log::info!("Request {} rejected by user", id);
        interaction
            .page
            .evaluate(&ResponseEmitter::rejected(interaction.network, id));
        Ok(())
    }

    /// Submit the completed PIN for a parked request and run it to completion.
    ///
    /// A wrong or refused PIN leaves the request parked. A transaction
    /// without a gas price is refused before the PIN is checked.
    pub async fn submit_pin(&self, id: u64, pin: &str) -> Result<Completion, BridgeError> {
        let interaction = lock(&self.pending)
            .take(id)
            .ok_or(BridgeError::UnknownRequest(id))?;

        if let InteractionKind::Transaction(tx) = &interaction.kind {
            if tx.gas_price.value().is_none() {
                let reason = match &tx.gas_price {
                    GasPrice::Unavailable(reason) => reason.clone(),
                    _ => "gas price lookup in progress".to_string(),
                };
                lock(&self.pending).restore(interaction);
                return Err(BridgeError::GasPriceUnavailable(reason));
            }
        }

        let auth = self.auth.clone();
        let host = interaction.page.host.clone();
        let pin = Zeroizing::new(pin.to_string());
        let verified = tokio::task::spawn_blocking(move || {
            let mut gate = lock(&auth);
            gate.verify(&host, pin.as_str())
        })
        .await
        .map_err(|e| BridgeError::Internal(format!("PIN task failed: {}", e)));

        let unlocked = match verified.and_then(|result| result) {
            Ok(unlocked) => unlocked,
            Err(e) => {
                self.emit(HostEvent::PinRejected {
                    id,
                    message: e.to_string(),
                });
                lock(&self.pending).restore(interaction);
                return Err(e);
            }
        };

        self.complete(interaction, unlocked).await
    }

    async fn complete(
        &self,
        interaction: PendingInteraction,
        unlocked: Unlocked,
    ) -> Result<Completion, BridgeError> {
        let PendingInteraction { id, network, page, kind } = interaction;

        let result = match kind {
            InteractionKind::Unlock => self.address_of(&unlocked, network).map(|address| {
                page.evaluate(&ResponseEmitter::accounts(network, id, &address));
                Completion::Responded
            }),
            InteractionKind::ChainSwitch { chain, chain_id_hex } => {
                self.address_of(&unlocked, network).map(|address| {
                    self.apply_chain_switch(&page, network, id, chain, &chain_id_hex, &address);
                    Completion::Responded
                })
            }
            InteractionKind::Transaction(tx) => {
                match self.sign_and_broadcast(&tx, unlocked).await {
                    Ok(receipt) => {
                        if self.config.resolve_signed_transactions {
                            page.evaluate(&ResponseEmitter::transaction_sent(network, id, &receipt.tx_hash));
                        }
                        self.emit(HostEvent::TransactionSubmitted {
                            id,
                            receipt: receipt.clone(),
                        });
                        self.emit(HostEvent::ReloadPage {
                            host: page.host.clone(),
                        });
                        Ok(Completion::Submitted(receipt))
                    }
                    Err(e) => {
                        log::error!("Request {} failed: {}", id, e);
                        self.emit(HostEvent::TransactionFailed {
                            id,
                            message: e.to_string(),
                        });
                        page.evaluate(&ResponseEmitter::error(network, id, &e.to_string()));
                        Err(e)
                    }
                }
            }
        };

        lock(&self.pending).finish(id);
        result
    }

    fn address_of(&self, unlocked: &Unlocked, network: Network) -> Result<String, BridgeError> {
        unlocked
            .address_for(network)
            .map(str::to_string)
            .ok_or_else(|| BridgeError::Internal(format!("no address derived for {}", network)))
    }

    /// Derive, sign and broadcast. The phrase and key are dropped before the
    /// network call starts.
    async fn sign_and_broadcast(
        &self,
        tx: &ParkedTransaction,
        unlocked: Unlocked,
    ) -> Result<BroadcastReceipt, BridgeError> {
        let chain = tx.chain;
        let _submission = self.submissions.for_chain(chain).lock().await;
        let nonce: U256 = self.nonces.get(chain)?;
        let request = SigningRequest::from_hex_fields(
            &tx.fields.to,
            Some(&tx.fields.value),
            Some(&tx.fields.data),
            &tx.gas_limit,
            tx.gas_price.value(),
            nonce,
            chain.id(),
        )?;

        let from = tx.fields.from.clone();
        let signed = tokio::task::spawn_blocking(move || {
            let key = KeyManager::derive_signing_key(unlocked.phrase(), chain.coin_type())?;
            if !from.is_empty() && !from.eq_ignore_ascii_case(&key.address().to_string()) {
                log::warn!("Transaction 'from' {} differs from the wallet address", from);
            }
            TransactionSigner::sign(&request, &key)
        })
        .await
        .map_err(|e| BridgeError::SigningFailure(format!("signing task failed: {}", e)))??;

        log::info!("Signed {} transaction {} with nonce {}", chain.ticker(), signed.hash_hex(), nonce);
        self.broadcaster.submit(chain, &signed.to_transport_hex()).await
    }
}
