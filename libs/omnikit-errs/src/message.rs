//! Interned canonical messages.
//!
//! Every distinct message text is stored once in a process-wide pool, so two
//! [`Message`] handles compare equal exactly when they point at the same
//! allocation. The pool only grows.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

static POOL: LazyLock<DashMap<Arc<str>, ()>> = LazyLock::new(DashMap::new);

/// Handle to an interned canonical message.
///
/// Equality and hashing use the handle identity, never the text.
#[derive(Clone)]
pub struct Message(Arc<str>);

impl Message {
    /// Returns the handle for `text`, inserting it into the pool on first use.
    #[must_use]
    pub fn intern(text: &str) -> Self {
        if let Some(existing) = POOL.get(text) {
            return Self(Arc::clone(existing.key()));
        }
        // A concurrent insert of the same text wins the entry; we reuse its key.
        let entry = POOL.entry(Arc::from(text)).or_insert(());
        Self(Arc::clone(entry.key()))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct texts interned so far in this process.
    #[must_use]
    pub fn pool_size() -> usize {
        POOL.len()
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0).cast::<u8>(), state);
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message").field(&&*self.0).finish()
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::intern(text)
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Ok(Self::intern(&text))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn equal_text_shares_one_handle() {
        let a = Message::intern("resource not found");
        let b = Message::intern(&String::from("resource not found"));
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn different_text_is_unequal() {
        let a = Message::intern("unauthorized");
        let b = Message::intern("Unauthorized");
        assert_ne!(a, b);
    }

    #[test]
    fn pool_never_shrinks() {
        let before = Message::pool_size();
        let m = Message::intern("pool growth probe");
        drop(m);
        let after = Message::pool_size();
        assert!(after >= before);
        assert_eq!(Message::intern("pool growth probe").as_str(), "pool growth probe");
        assert!(Message::pool_size() >= after);
    }

    #[test]
    fn concurrent_interning_converges() {
        let handles: Vec<Message> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| Message::intern("contended message")))
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().unwrap())
                .collect()
        });
        for h in &handles[1..] {
            assert_eq!(&handles[0], h);
        }
    }

    #[test]
    fn deserializing_interns() {
        let decoded: Message = serde_json::from_str(r#""already declared""#).unwrap();
        assert_eq!(decoded, Message::intern("already declared"));
        assert_eq!(
            serde_json::to_string(&decoded).unwrap(),
            r#""already declared""#
        );
    }

    #[test]
    fn hash_follows_identity() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Message::intern("hash me"));
        assert!(set.contains(&Message::intern("hash me")));
        assert!(!set.contains(&Message::intern("hash me too")));
    }
}
