use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    domain::{GroupInfo, MessagingId, NormalizedPhone},
    errors::Error,
    messaging::{
        port::MessagingClient,
        types::{OutgoingContent, SessionState},
    },
    Result,
};

/// Scripted in-memory messaging client for tests.
pub(crate) struct FakeMessenger {
    pub groups: Mutex<Vec<GroupInfo>>,
    pub registered: HashMap<String, MessagingId>,
    pub lookup_errors: HashSet<String>,
    /// 1-based send call numbers that fail.
    pub failing_sends: HashSet<usize>,
    pub state: Mutex<SessionState>,
    pub enumerations: AtomicUsize,
    pub lookups: AtomicUsize,
    pub sends: Mutex<Vec<(MessagingId, OutgoingContent)>>,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            registered: HashMap::new(),
            lookup_errors: HashSet::new(),
            failing_sends: HashSet::new(),
            state: Mutex::new(SessionState::Connected),
            enumerations: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            sends: Mutex::new(Vec::new()),
        }
    }
}

impl FakeMessenger {
    pub fn with_groups(names: &[&str]) -> Self {
        let groups = names
            .iter()
            .enumerate()
            .map(|(i, name)| GroupInfo::new(format!("g{i}@g.us"), *name))
            .collect();
        Self {
            groups: Mutex::new(groups),
            ..Self::default()
        }
    }

    pub fn register(mut self, digits: &str) -> Self {
        self.registered
            .insert(digits.to_string(), MessagingId(format!("{digits}@c.us")));
        self
    }

    pub fn fail_lookup(mut self, digits: &str) -> Self {
        self.lookup_errors.insert(digits.to_string());
        self
    }

    pub fn fail_send(mut self, call_number: usize) -> Self {
        self.failing_sends.insert(call_number);
        self
    }

    pub fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn enumeration_calls(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(MessagingId, OutgoingContent)> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingClient for FakeMessenger {
    async fn enumerate_groups(&self) -> Result<Vec<GroupInfo>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn lookup_number(&self, phone: &NormalizedPhone) -> Result<Option<MessagingId>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookup_errors.contains(phone.as_str()) {
            return Err(Error::External("lookup timed out".to_string()));
        }
        Ok(self.registered.get(phone.as_str()).cloned())
    }

    async fn send(&self, to: &MessagingId, content: OutgoingContent) -> Result<()> {
        let mut sends = self.sends.lock().unwrap();
        let call_number = sends.len() + 1;
        if self.failing_sends.contains(&call_number) {
            // Record the attempt so call numbering stays stable.
            sends.push((to.clone(), content));
            return Err(Error::External(format!("send #{call_number} rejected")));
        }
        sends.push((to.clone(), content));
        Ok(())
    }

    async fn get_state(&self) -> Result<SessionState> {
        Ok(*self.state.lock().unwrap())
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }
}
