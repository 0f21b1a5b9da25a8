use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::payload::PayloadEntries;
use crate::rules::decode;
use crate::value::{RawValue, RegisterId, RegisterValue};

/// Source tag attached to every update.
pub const SOURCE_TAG: &str = "NIBE";

/// A changed register value delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub register: RegisterId,
    pub value: RegisterValue,
    pub raw: RawValue,
    pub source: &'static str,
    /// Context string, `REG <id>`.
    pub info: String,
}

/// Receives register updates. Called on the reader thread.
pub trait Subscriber: Send + Sync {
    fn notify(&self, update: &Update);
}

impl<F> Subscriber for F
where
    F: Fn(&Update) + Send + Sync,
{
    fn notify(&self, update: &Update) {
        self(update)
    }
}

struct RegisterState {
    last_raw: Option<RawValue>,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

/// Subscribed registers, their last seen raw value and their subscribers.
///
/// Shared between the reader thread (which dispatches payloads) and whoever
/// adds subscriptions while it runs.
#[derive(Default)]
pub struct RegisterTable {
    entries: Mutex<BTreeMap<RegisterId, RegisterState>>,
}

impl RegisterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a register. The first subscription creates the register's
    /// tracking entry; later ones are notified after earlier ones.
    pub fn subscribe(&self, register: RegisterId, subscriber: impl Subscriber + 'static) {
        self.subscribe_arc(register, Arc::new(subscriber));
    }

    /// Subscribe a shared handle.
    pub fn subscribe_arc(&self, register: RegisterId, subscriber: Arc<dyn Subscriber>) {
        let mut entries = self.lock();
        entries
            .entry(register)
            .or_insert_with(|| RegisterState {
                last_raw: None,
                subscribers: Vec::new(),
            })
            .subscribers
            .push(subscriber);
        debug!(register, "register subscribed");
    }

    pub fn is_registered(&self, register: RegisterId) -> bool {
        self.lock().contains_key(&register)
    }

    /// Subscribed register IDs in ascending order.
    pub fn registered_ids(&self) -> Vec<RegisterId> {
        self.lock().keys().copied().collect()
    }

    pub fn subscriber_count(&self, register: RegisterId) -> usize {
        self.lock()
            .get(&register)
            .map_or(0, |state| state.subscribers.len())
    }

    /// Raw bytes last dispatched for a register.
    pub fn last_raw(&self, register: RegisterId) -> Option<RawValue> {
        self.lock().get(&register).and_then(|state| state.last_raw)
    }

    /// Walk a validated payload and notify subscribers of every register
    /// whose raw bytes changed. Returns the number of changed entries.
    ///
    /// Unsubscribed registers are skipped without decoding. Subscribers run
    /// outside the table lock, so they may subscribe further registers.
    pub fn dispatch(&self, payload: &[u8]) -> usize {
        let mut changed = 0usize;
        for (register, raw) in PayloadEntries::new(payload) {
            let Some((update, subscribers)) = self.record(register, raw) else {
                continue;
            };
            debug!(register, value = %update.value, "update_item");
            for subscriber in &subscribers {
                subscriber.notify(&update);
            }
            changed += 1;
        }
        changed
    }

    /// Store `raw` if it differs from the last value; returns what to deliver.
    fn record(
        &self,
        register: RegisterId,
        raw: RawValue,
    ) -> Option<(Update, Vec<Arc<dyn Subscriber>>)> {
        let mut entries = self.lock();
        let state = entries.get_mut(&register)?;
        if state.last_raw == Some(raw) {
            return None;
        }

        let value = decode(register, raw);
        state.last_raw = Some(raw);
        let update = Update {
            register,
            value,
            raw,
            source: SOURCE_TAG,
            info: format!("REG {register}"),
        };
        Some((update, state.subscribers.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<RegisterId, RegisterState>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RegisterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterTable")
            .field("registers", &self.registered_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn recorder(table: &RegisterTable, register: RegisterId) -> Arc<Mutex<Vec<Update>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        table.subscribe(register, move |update: &Update| {
            sink.lock().unwrap().push(update.clone());
        });
        seen
    }

    // reg 1 = 0xFFF6 (2 bytes), reg 25 = 100 (1 byte), reg 40 = 0x0032 (2 bytes)
    const PAYLOAD: [u8; 12] = [
        0x00, 0x01, 0xFF, 0xF6, 0x00, 0x19, 0x64, 0x00, 0x28, 0x00, 0x32, 0x00,
    ];

    #[test]
    fn dispatches_decoded_values_with_context() {
        let table = RegisterTable::new();
        let outdoor = recorder(&table, 1);
        let starts = recorder(&table, 25);

        assert_eq!(table.dispatch(&PAYLOAD), 2);

        let outdoor = outdoor.lock().unwrap();
        assert_eq!(outdoor.len(), 1);
        assert_eq!(outdoor[0].value, RegisterValue::Float(-1.0));
        assert_eq!(outdoor[0].source, "NIBE");
        assert_eq!(outdoor[0].info, "REG 1");
        assert_eq!(outdoor[0].raw, RawValue::Word([0xFF, 0xF6]));

        let starts = starts.lock().unwrap();
        assert_eq!(starts[0].value, RegisterValue::Integer(10));
        assert_eq!(starts[0].info, "REG 25");
    }

    #[test]
    fn unregistered_registers_are_ignored() {
        let table = RegisterTable::new();
        assert_eq!(table.dispatch(&PAYLOAD), 0);
        assert!(table.registered_ids().is_empty());
        assert_eq!(table.last_raw(40), None);
    }

    #[test]
    fn unchanged_raw_is_not_redispatched() {
        let table = RegisterTable::new();
        let seen = recorder(&table, 40);

        assert_eq!(table.dispatch(&PAYLOAD), 1);
        assert_eq!(table.dispatch(&PAYLOAD), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(table.last_raw(40), Some(RawValue::Word([0x00, 0x32])));

        let mut changed = PAYLOAD;
        changed[10] = 0x34;
        assert_eq!(table.dispatch(&changed), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].value, RegisterValue::Float(26.0));
    }

    #[test]
    fn width_change_counts_as_change() {
        let table = RegisterTable::new();
        let seen = recorder(&table, 1);

        // 1-byte entry: reg 1 = 0x05 (marker 0x07 != 0, not last index)
        table.dispatch(&[0x00, 0x01, 0x05, 0x00, 0x07, 0x00]);
        // 2-byte entry with the same numeric value
        table.dispatch(&[0x00, 0x01, 0x00, 0x05, 0x00]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].raw, RawValue::Byte(0x05));
        assert_eq!(seen[1].raw, RawValue::Word([0x00, 0x05]));
        assert_eq!(seen[0].value, seen[1].value);
    }

    #[test]
    fn subscribers_are_notified_in_subscription_order() {
        let table = RegisterTable::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            table.subscribe(25, move |_: &Update| order.lock().unwrap().push(tag));
        }

        table.dispatch(&PAYLOAD);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(table.subscriber_count(25), 3);
        assert_eq!(table.registered_ids(), vec![25]);
    }

    #[test]
    fn subscriber_may_subscribe_during_dispatch() {
        let table = Arc::new(RegisterTable::new());
        let late = Arc::new(AtomicUsize::new(0));

        let inner_table = Arc::clone(&table);
        let inner_late = Arc::clone(&late);
        table.subscribe(1, move |_: &Update| {
            let late = Arc::clone(&inner_late);
            inner_table.subscribe(40, move |_: &Update| {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        // Register 40 comes after register 1 in the payload.
        table.dispatch(&PAYLOAD);

        assert!(table.is_registered(40));
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_subscription_while_dispatching() {
        let table = Arc::new(RegisterTable::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let subscriber = {
            let table = Arc::clone(&table);
            let hits = Arc::clone(&hits);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let hits = Arc::clone(&hits);
                    table.subscribe(25, move |_: &Update| {
                        hits.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        };

        let mut payload = PAYLOAD;
        for value in 0..50u8 {
            payload[6] = value;
            table.dispatch(&payload);
        }
        subscriber.join().unwrap();

        assert_eq!(table.subscriber_count(25), 100);
        payload[6] = 0xEE;
        let before = hits.load(Ordering::SeqCst);
        table.dispatch(&payload);
        assert_eq!(hits.load(Ordering::SeqCst) - before, 100);
    }
}
