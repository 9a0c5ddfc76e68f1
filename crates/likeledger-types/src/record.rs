use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ids::{IdentityPolicy, LikerId, PostId};

/// The set of identities that liked one post, in the order they first liked it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LikerId>", into = "Vec<LikerId>")]
pub struct LikeRecord {
    order: Vec<LikerId>,
    members: HashSet<LikerId>,
}

impl LikeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `liker`. Returns `false` if it was already present.
    pub fn insert(&mut self, liker: LikerId) -> bool {
        if !self.members.insert(liker.clone()) {
            return false;
        }
        self.order.push(liker);
        true
    }

    pub fn contains(&self, liker: &LikerId) -> bool {
        self.members.contains(liker)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LikerId> {
        self.order.iter()
    }
}

impl From<Vec<LikerId>> for LikeRecord {
    fn from(likers: Vec<LikerId>) -> Self {
        let mut record = Self::new();
        for liker in likers {
            record.insert(liker);
        }
        record
    }
}

impl From<LikeRecord> for Vec<LikerId> {
    fn from(record: LikeRecord) -> Self {
        record.order
    }
}

impl PartialEq for LikeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for LikeRecord {}

/// Count and likers of one post, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub count: usize,
    pub liked_by: Vec<String>,
}

impl LikeSummary {
    pub fn empty() -> Self {
        Self {
            count: 0,
            liked_by: Vec::new(),
        }
    }
}

/// Result of recording a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLikeOutcome {
    /// Size of the record after the call.
    pub count: usize,
    /// Always true once the call succeeds.
    pub liked: bool,
    /// False when the liker was already present and nothing was written.
    pub inserted: bool,
}

/// Every post that has ever been liked, keyed by post id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerState {
    posts: BTreeMap<PostId, LikeRecord>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, post: &PostId) -> usize {
        self.posts.get(post).map(LikeRecord::len).unwrap_or(0)
    }

    pub fn has_liked(&self, post: &PostId, liker: &LikerId) -> bool {
        self.posts
            .get(post)
            .map(|record| record.contains(liker))
            .unwrap_or(false)
    }

    pub fn summary(&self, post: &PostId) -> LikeSummary {
        match self.posts.get(post) {
            Some(record) => LikeSummary {
                count: record.len(),
                liked_by: record.iter().map(|l| l.as_str().to_string()).collect(),
            },
            None => LikeSummary::empty(),
        }
    }

    /// Insert a like. Returns `false` if the liker was already recorded.
    pub fn insert(&mut self, post: PostId, liker: LikerId) -> bool {
        self.posts.entry(post).or_default().insert(liker)
    }

    /// Number of posts with an entry, including entries with no likers.
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn total_likes(&self) -> usize {
        self.posts.values().map(LikeRecord::len).sum()
    }

    /// Re-apply `policy` to every stored identity, merging identities that
    /// collapse together. Returns how many duplicates were merged away.
    pub fn normalize(&mut self, policy: IdentityPolicy) -> usize {
        let mut merged = 0;
        for record in self.posts.values_mut() {
            let before = record.len();
            let normalized: Vec<LikerId> = record.iter().map(|l| l.renormalize(policy)).collect();
            *record = LikeRecord::from(normalized);
            merged += before - record.len();
        }
        merged
    }
}
