//! Caching collaborator contract plus an in-memory implementation.
//!
//! Keys form a hierarchy (`auth`, `auth/me`, `oidc/validate/<query>`) and invalidation is
//! prefix-based, so dropping `auth` drops everything under it. Writes carry the instant the
//! underlying request started; an older result never replaces a newer one.

// self
use crate::_prelude::*;

/// Hierarchical cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);
impl CacheKey {
	/// Builds a key from raw segments.
	pub fn new<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(segments.into_iter().map(Into::into).collect())
	}

	/// Root of every authentication entry.
	pub fn auth() -> Self {
		Self::new(["auth"])
	}

	/// Current user.
	pub fn auth_me() -> Self {
		Self::new(["auth", "me"])
	}

	/// Authenticated/unauthenticated verdict.
	pub fn auth_status() -> Self {
		Self::new(["auth", "status"])
	}

	/// Backend validation result for one authorize query.
	pub fn oidc_validate(query: &str) -> Self {
		Self::new(["oidc", "validate", query])
	}

	/// Key segments.
	pub fn segments(&self) -> &[String] {
		&self.0
	}

	/// Returns true when `self` equals `prefix` or sits below it.
	pub fn starts_with(&self, prefix: &CacheKey) -> bool {
		self.0.starts_with(&prefix.0)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join("/"))
	}
}

/// Cached JSON value with the instant its request started.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedValue {
	/// Cached payload.
	pub value: Value,
	/// When the request that produced it started.
	pub fetched_at: OffsetDateTime,
}
impl CachedValue {
	/// Creates a new entry.
	pub fn new(value: Value, fetched_at: OffsetDateTime) -> Self {
		Self { value, fetched_at }
	}
}

/// Caching collaborator used by the API client.
pub trait QueryCache
where
	Self: Send + Sync,
{
	/// Returns the entry stored under exactly `key`.
	fn cached(&self, key: &CacheKey) -> Option<CachedValue>;

	/// Stores `value` unless a newer entry already exists; returns whether it was stored.
	fn store(&self, key: CacheKey, value: CachedValue) -> bool;

	/// Drops `key` and every key below it.
	fn invalidate(&self, key: &CacheKey);
}

type CacheMap = Arc<RwLock<HashMap<CacheKey, CachedValue>>>;

/// Thread-safe in-process [`QueryCache`].
#[derive(Clone, Debug, Default)]
pub struct MemoryQueryCache(CacheMap);
impl MemoryQueryCache {
	/// Number of live entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl QueryCache for MemoryQueryCache {
	fn cached(&self, key: &CacheKey) -> Option<CachedValue> {
		self.0.read().get(key).cloned()
	}

	fn store(&self, key: CacheKey, value: CachedValue) -> bool {
		let mut guard = self.0.write();

		match guard.get(&key) {
			Some(existing) if existing.fetched_at > value.fetched_at => false,
			_ => {
				guard.insert(key, value);

				true
			},
		}
	}

	fn invalidate(&self, key: &CacheKey) {
		self.0.write().retain(|candidate, _| !candidate.starts_with(key));
	}
}
