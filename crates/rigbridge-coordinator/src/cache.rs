//! Time-bounded cache of read results.
//!
//! Entries are keyed by what was read and, where it matters, for which VFO.
//! A write drops exactly the entries it can have changed. The cache lives
//! inside the worker task, so no locking is needed.

use std::collections::HashMap;
use std::time::Duration;

use rigbridge_core::{Operation, Reply, Vfo};
use tokio::time::Instant;

/// Default lifetime of a cached read.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheClass {
    Frequency,
    Mode,
    Ptt,
    Vfo,
    Power,
    Split,
    Rit,
    Xit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: CacheClass,
    pub vfo: Option<Vfo>,
}

impl CacheKey {
    const fn new(class: CacheClass) -> Self {
        CacheKey { class, vfo: None }
    }

    const fn for_vfo(class: CacheClass, vfo: Vfo) -> Self {
        CacheKey {
            class,
            vfo: Some(vfo),
        }
    }

    /// The entry a read operation fills, `None` for reads never cached
    /// (meter, memory) and for writes.
    pub fn for_read(op: &Operation) -> Option<CacheKey> {
        let key = match op {
            Operation::GetFrequency(vfo) => Self::for_vfo(CacheClass::Frequency, *vfo),
            Operation::GetMode(vfo) => Self::for_vfo(CacheClass::Mode, *vfo),
            Operation::GetPtt => Self::new(CacheClass::Ptt),
            Operation::GetVfo => Self::new(CacheClass::Vfo),
            Operation::GetPower => Self::new(CacheClass::Power),
            Operation::GetSplit => Self::new(CacheClass::Split),
            Operation::GetRit => Self::new(CacheClass::Rit),
            Operation::GetXit => Self::new(CacheClass::Xit),
            _ => return None,
        };
        Some(key)
    }
}

/// Which entries a write may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invalidation {
    /// One class, for one VFO plus whatever "current" resolves to.
    ForVfo(CacheClass, Vfo),
    /// Every entry of a class.
    Class(CacheClass),
    /// Every entry addressed through the current VFO.
    CurrentVfo,
}

fn invalidations(op: &Operation) -> Vec<Invalidation> {
    use Invalidation::{Class, CurrentVfo, ForVfo};
    match op {
        Operation::SetFrequency(vfo, _) => vec![ForVfo(CacheClass::Frequency, *vfo)],
        Operation::SetMode(vfo, ..) => vec![ForVfo(CacheClass::Mode, *vfo)],
        Operation::SetPtt(_) => vec![Class(CacheClass::Ptt)],
        Operation::SelectVfo(_) => vec![Class(CacheClass::Vfo), Class(CacheClass::Split), CurrentVfo],
        Operation::SetPower(_) => vec![Class(CacheClass::Power)],
        // Some dialects switch split by moving the receive VFO.
        Operation::SetSplit(_) => vec![Class(CacheClass::Split), Class(CacheClass::Vfo), CurrentVfo],
        // RIT and XIT share one offset register.
        Operation::SetRit { .. } | Operation::SetXit { .. } => {
            vec![Class(CacheClass::Rit), Class(CacheClass::Xit)]
        }
        _ => Vec::new(),
    }
}

#[derive(Debug)]
pub struct ReadCache {
    ttl: Duration,
    entries: HashMap<CacheKey, (Instant, Reply)>,
}

impl ReadCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// A reply stored less than `ttl` ago.
    pub fn get(&self, key: &CacheKey) -> Option<Reply> {
        let (stored, reply) = self.entries.get(key)?;
        (stored.elapsed() < self.ttl).then(|| reply.clone())
    }

    pub fn insert(&mut self, key: CacheKey, reply: Reply) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(key, (Instant::now(), reply));
    }

    /// Drop the entries `op` may have changed.
    pub fn invalidate_for(&mut self, op: &Operation) {
        for rule in invalidations(op) {
            match rule {
                Invalidation::ForVfo(class, Vfo::Current) => {
                    self.entries.retain(|key, _| key.class != class);
                }
                Invalidation::ForVfo(class, vfo) => {
                    self.entries.remove(&CacheKey::for_vfo(class, vfo));
                    self.entries.remove(&CacheKey::for_vfo(class, Vfo::Current));
                }
                Invalidation::Class(class) => {
                    self.entries.retain(|key, _| key.class != class);
                }
                Invalidation::CurrentVfo => {
                    self.entries.retain(|key, _| key.vfo != Some(Vfo::Current));
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
