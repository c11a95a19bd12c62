//! Scripted gateway wallet API.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::GatewayRpc;
use crate::error::{BootstrapError, Result};
use crate::port::outbound::WalletApi;

/// Wallet API whose calls succeed unless a rejection is queued.
#[derive(Default)]
pub struct ScriptedWalletApi {
    create_rejections: Mutex<VecDeque<(u16, String)>>,
    unlock_rejections: Mutex<VecDeque<(u16, String)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedWalletApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `create` with `status` and `message`.
    pub fn reject_create(&self, status: u16, message: &str) {
        self.create_rejections
            .lock()
            .unwrap()
            .push_back((status, message.to_string()));
    }

    pub fn reject_unlock(&self, status: u16, message: &str) {
        self.unlock_rejections
            .lock()
            .unwrap()
            .push_back((status, message.to_string()));
    }

    /// Calls as `create <password>` / `unlock <password>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: String, rejections: &Mutex<VecDeque<(u16, String)>>) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match rejections.lock().unwrap().pop_front() {
            Some((status, message)) => Err(BootstrapError::Rejected { status, message }.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WalletApi for ScriptedWalletApi {
    async fn create(&self, _gateway: &GatewayRpc, password: &str) -> Result<()> {
        self.answer(format!("create {password}"), &self.create_rejections)
    }

    async fn unlock(&self, _gateway: &GatewayRpc, password: &str) -> Result<()> {
        self.answer(format!("unlock {password}"), &self.unlock_rejections)
    }
}
