//! Render-visible state and its transitions.
//!
//! Every mutation the page can observe goes through one of the methods
//! here; [`crate::CoffeeSession`] decides when to call them.

use alloy::primitives::Address;

use crate::form::FormState;
use crate::memo::Memo;

/// Which top-level view the page shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// No account: only the connect button.
    Connect,
    /// Account known: tip form plus the memo feed.
    Tipping,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoffeeState {
    account: Option<Address>,
    form: FormState,
    memos: Vec<Memo>,
}

impl CoffeeState {
    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub fn screen(&self) -> Screen {
        match self.account {
            Some(_) => Screen::Tipping,
            None => Screen::Connect,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn memos(&self) -> &[Memo] {
        &self.memos
    }

    pub fn connect(&mut self, account: Address) {
        self.account = Some(account);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.form.message = message.into();
    }

    /// A tip was confirmed on-chain.
    pub fn submitted(&mut self) {
        self.form.clear();
    }

    /// Historical read completed: its result replaces the list.
    pub fn memos_loaded(&mut self, memos: Vec<Memo>) {
        self.memos = memos;
    }

    /// One live `NewMemo` notification, appended at the end.
    pub fn memo_received(&mut self, memo: Memo) {
        self.memos.push(memo);
    }

    /// Back to the freshly loaded page: no account, empty form. The memo
    /// list is contract data and stays.
    pub fn disconnect(&mut self) {
        self.account = None;
        self.form.clear();
    }
}
