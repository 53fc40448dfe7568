//! The page view-model.
//!
//! A [`CoffeeSession`] is created when the page mounts and disposed when it
//! goes away. It owns the [`CoffeeState`] the page renders, the wallet and
//! contract collaborators, and the live memo subscription.
//!
//! Collaborator failures never escape: each operation logs what went wrong
//! and leaves the state exactly as it was before the action.

use alloy::primitives::{Address, TxHash};
use futures::stream::{Stream, StreamExt};

use crate::constants::CoffeeConfig;
use crate::contract::MemoContract;
use crate::error::CoffeeError;
use crate::memo::Memo;
use crate::state::CoffeeState;
use crate::subscription::MemoSubscription;
use crate::wallet::WalletProvider;

/// User actions fed into [`CoffeeSession::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SetName(String),
    SetMessage(String),
    Connect,
    BuyCoffee,
    Disconnect,
}

pub struct CoffeeSession<W, C> {
    wallet: W,
    contract: C,
    config: CoffeeConfig,
    state: CoffeeState,
    subscription: Option<MemoSubscription>,
}

enum Event {
    Command(Option<Command>),
    Memo(Option<Memo>),
}

impl<W, C> CoffeeSession<W, C>
where
    W: WalletProvider,
    C: MemoContract,
{
    pub fn new(wallet: W, contract: C, config: CoffeeConfig) -> Self {
        Self {
            wallet,
            contract,
            config,
            state: CoffeeState::default(),
            subscription: None,
        }
    }

    pub fn state(&self) -> &CoffeeState {
        &self.state
    }

    pub fn config(&self) -> &CoffeeConfig {
        &self.config
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Startup: silent wallet probe, historical read and subscription setup.
    ///
    /// The three run concurrently. The historical read and the subscription
    /// are not ordered against each other, so a memo mined in between may
    /// show up twice or not at all.
    pub async fn mount(&mut self) {
        let (accounts, memos, subscription) = futures::join!(
            self.wallet.accounts(),
            self.fetch_memos(),
            self.contract.subscribe_memos(),
        );

        self.apply_probe(accounts);

        match memos {
            Ok(memos) => self.state.memos_loaded(memos),
            Err(e) => tracing::warn!(error = %e, "failed to fetch memos"),
        }

        match subscription {
            Ok(subscription) => self.replace_subscription(subscription),
            Err(e) => tracing::warn!(error = %e, "failed to subscribe to NewMemo"),
        }
    }

    /// Check for an existing authorization without prompting.
    pub async fn probe_wallet(&mut self) {
        let accounts = self.wallet.accounts().await;
        self.apply_probe(accounts);
    }

    /// Ask the wallet for an account. Failure or rejection leaves the
    /// session disconnected.
    pub async fn connect_wallet(&mut self) {
        match self.wallet.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(&account) => {
                    tracing::info!(%account, "wallet connected");
                    self.state.connect(account);
                }
                None => tracing::warn!("wallet granted no accounts"),
            },
            Err(e) => tracing::warn!(error = %e, "wallet connection failed"),
        }
    }

    /// Re-read all memos, replacing the current list.
    pub async fn load_memos(&mut self) {
        match self.fetch_memos().await {
            Ok(memos) => self.state.memos_loaded(memos),
            Err(e) => tracing::warn!(error = %e, "failed to fetch memos"),
        }
    }

    /// Open the `NewMemo` subscription, replacing (and releasing) any previous one.
    pub async fn subscribe(&mut self) {
        match self.contract.subscribe_memos().await {
            Ok(subscription) => self.replace_subscription(subscription),
            Err(e) => tracing::warn!(error = %e, "failed to subscribe to NewMemo"),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.set_name(name);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.state.set_message(message);
    }

    /// Pay for a coffee with the current form contents. Suspends until the
    /// transaction is confirmed; the form is cleared only on success.
    pub async fn buy_coffee(&mut self) -> Option<TxHash> {
        match self.try_buy_coffee().await {
            Ok(tx_hash) => {
                self.state.submitted();
                Some(tx_hash)
            }
            Err(e) => {
                tracing::warn!(error = %e, "buying coffee failed");
                None
            }
        }
    }

    /// Wait for the next live memo and append it. Returns `None` once there
    /// is no subscription or its source has ended.
    pub async fn next_memo(&mut self) -> Option<&Memo> {
        let memo = self.subscription.as_mut()?.next().await;
        let received = memo.is_some();
        self.on_memo(memo);
        if received {
            self.state.memos().last()
        } else {
            None
        }
    }

    /// Forget the account and form, as a page reload would.
    pub fn disconnect(&mut self) {
        self.state.disconnect();
    }

    /// Release the subscription and hand back the final state.
    pub fn dispose(mut self) -> CoffeeState {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        tracing::debug!("coffee session disposed");
        std::mem::take(&mut self.state)
    }

    /// Apply one user command.
    pub async fn handle(&mut self, command: Command) {
        match command {
            Command::SetName(name) => self.set_name(name),
            Command::SetMessage(message) => self.set_message(message),
            Command::Connect => self.connect_wallet().await,
            Command::BuyCoffee => {
                self.buy_coffee().await;
            }
            Command::Disconnect => self.disconnect(),
        }
    }

    /// Drive the session for the lifetime of a page.
    ///
    /// Mounts, then interleaves `commands` with live memos, calling `publish`
    /// with the state after mount and after every event. Ends, disposing the
    /// session, when `commands` ends. A command that suspends (a purchase)
    /// holds the loop; memos that arrive meanwhile are buffered.
    pub async fn run<S, F>(mut self, commands: S, mut publish: F) -> CoffeeState
    where
        S: Stream<Item = Command> + Unpin,
        F: FnMut(&CoffeeState),
    {
        self.mount().await;
        publish(&self.state);

        let mut commands = commands.fuse();
        loop {
            let event = match self.subscription.as_mut() {
                Some(subscription) => futures::select! {
                    command = commands.next() => Event::Command(command),
                    memo = subscription.next() => Event::Memo(memo),
                },
                None => Event::Command(commands.next().await),
            };

            match event {
                Event::Command(Some(command)) => self.handle(command).await,
                Event::Command(None) => break,
                Event::Memo(memo) => self.on_memo(memo),
            }
            publish(&self.state);
        }

        self.dispose()
    }

    async fn try_buy_coffee(&self) -> Result<TxHash, CoffeeError> {
        let from = self.state.account().ok_or(CoffeeError::NotConnected)?;
        let submission = self.state.form().submission(&self.config);

        tracing::debug!(name = %submission.name, "buying coffee");
        let tx_hash = self
            .contract
            .buy_coffee(from, &submission, self.config.coffee_price)
            .await?;
        tracing::info!(%tx_hash, "coffee bought");
        Ok(tx_hash)
    }

    async fn fetch_memos(&self) -> Result<Vec<Memo>, CoffeeError> {
        tracing::debug!("fetching memos");
        let memos = self.contract.get_memos().await?;
        tracing::debug!(count = memos.len(), "memos fetched");
        Ok(memos)
    }

    fn apply_probe(&mut self, accounts: Result<Vec<Address>, CoffeeError>) {
        match accounts {
            Ok(accounts) => match accounts.first() {
                Some(&account) => {
                    tracing::info!(%account, "wallet already connected");
                    self.state.connect(account);
                }
                None => tracing::debug!("wallet not connected yet"),
            },
            Err(e) => tracing::warn!(error = %e, "wallet probe failed"),
        }
    }

    fn on_memo(&mut self, memo: Option<Memo>) {
        match memo {
            Some(memo) => {
                tracing::debug!(from = %memo.address, name = %memo.name, "memo received");
                self.state.memo_received(memo);
            }
            None => {
                tracing::warn!("memo subscription ended");
                self.subscription = None;
            }
        }
    }

    fn replace_subscription(&mut self, subscription: MemoSubscription) {
        if let Some(previous) = self.subscription.replace(subscription) {
            previous.unsubscribe();
        }
    }
}
