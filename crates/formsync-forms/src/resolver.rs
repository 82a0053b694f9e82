//! Path-based addressing of bound controls
//!
//! The resolver is the active binding table of one form instance: it maps
//! an element path to the code and control of the binding currently mounted
//! there. Registrations are scoped; dropping the [`Registration`] removes
//! the entry.

use crate::control::ControlHandle;
use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type BindingTable = RwLock<HashMap<String, BindingEntry>>;

#[derive(Debug)]
struct BindingEntry {
	code: String,
	control: ControlHandle,
	token: u64,
}

/// Maps `(path, code)` to the currently bound control
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
	table: Arc<BindingTable>,
	next_token: Arc<AtomicU64>,
}

impl PathResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `control` at `path`
	///
	/// Fails with [`SyncError::PathAlreadyBound`] while another
	/// registration holds the path.
	pub fn register(
		&self,
		path: impl Into<String>,
		code: impl Into<String>,
		control: ControlHandle,
	) -> SyncResult<Registration> {
		let path = path.into();
		let code = code.into();
		let mut table = self.table.write();

		if let Some(existing) = table.get(&path) {
			return Err(SyncError::PathAlreadyBound {
				path,
				code: existing.code.clone(),
			});
		}

		let token = self.next_token.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(path = %path, code = %code, "Registered binding");
		table.insert(
			path.clone(),
			BindingEntry {
				code,
				control,
				token,
			},
		);

		Ok(Registration {
			table: Arc::downgrade(&self.table),
			path,
			token,
			released: false,
		})
	}

	/// Control bound at `path`, if its code is `code`
	///
	/// # Examples
	///
	/// ```
	/// use formsync_forms::{ControlHandle, PathResolver};
	///
	/// let resolver = PathResolver::new();
	/// let _registration = resolver
	///     .register("/order/qty", "qty", ControlHandle::default())
	///     .unwrap();
	///
	/// assert!(resolver.resolve("/order/qty", "qty").is_some());
	/// assert!(resolver.resolve("/order/qty", "price").is_none());
	/// assert!(resolver.resolve("/order/price", "qty").is_none());
	/// ```
	pub fn resolve(&self, path: &str, code: &str) -> Option<ControlHandle> {
		self.table
			.read()
			.get(path)
			.filter(|entry| entry.code == code)
			.map(|entry| entry.control.clone())
	}

	/// Whether any binding is mounted at `path`
	pub fn contains(&self, path: &str) -> bool {
		self.table.read().contains_key(path)
	}

	pub fn len(&self) -> usize {
		self.table.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.read().is_empty()
	}
}

/// Scoped entry in a [`PathResolver`]
#[must_use = "dropping a Registration removes it from the resolver"]
#[derive(Debug)]
pub struct Registration {
	table: Weak<BindingTable>,
	path: String,
	token: u64,
	released: bool,
}

impl Registration {
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Remove the entry; returns `false` if it was already gone
	pub fn release(mut self) -> bool {
		self.release_inner()
	}

	fn release_inner(&mut self) -> bool {
		if self.released {
			return false;
		}
		self.released = true;

		let Some(table) = self.table.upgrade() else {
			return false;
		};
		let mut table = table.write();
		// Only remove the entry this registration created
		if table.get(&self.path).is_some_and(|entry| entry.token == self.token) {
			table.remove(&self.path);
			tracing::debug!(path = %self.path, "Released binding");
			true
		} else {
			false
		}
	}
}

impl Drop for Registration {
	fn drop(&mut self) {
		self.release_inner();
	}
}
