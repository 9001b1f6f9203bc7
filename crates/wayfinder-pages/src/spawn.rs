//! Local task spawning.
//!
//! Render cycles triggered from event listeners run as detached local
//! tasks. On wasm32 they are handed to the browser's microtask queue. On
//! native targets they go to a per-thread [`LocalPool`] that is driven
//! explicitly with [`run_until_stalled`].

use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
use futures::executor::{LocalPool, LocalSpawner};
#[cfg(not(target_arch = "wasm32"))]
use futures::task::LocalSpawnExt;
#[cfg(not(target_arch = "wasm32"))]
use std::cell::RefCell;

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
	static POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());
	static SPAWNER: LocalSpawner = POOL.with(|pool| pool.borrow().spawner());
}

/// Spawns a `!Send` future on the current thread.
#[cfg(target_arch = "wasm32")]
pub fn spawn_local<F>(future: F)
where
	F: Future<Output = ()> + 'static,
{
	wasm_bindgen_futures::spawn_local(future);
}

/// Spawns a `!Send` future on the current thread's pool.
///
/// The task makes progress only while [`run_until_stalled`] runs.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_local<F>(future: F)
where
	F: Future<Output = ()> + 'static,
{
	SPAWNER.with(|spawner| {
		if let Err(error) = spawner.spawn_local(future) {
			crate::error_log!("failed to spawn local task: {}", error);
		}
	});
}

/// Runs spawned tasks until none of them can make progress.
///
/// Does nothing when called from inside a task of the same pool.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_until_stalled() {
	POOL.with(|pool| match pool.try_borrow_mut() {
		Ok(mut pool) => pool.run_until_stalled(),
		Err(_) => crate::warn_log!("run_until_stalled called re-entrantly"),
	});
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;
	use std::rc::Rc;

	#[rstest]
	fn test_spawned_task_runs_when_pool_is_driven() {
		// Arrange
		let ran = Rc::new(Cell::new(false));
		let flag = Rc::clone(&ran);
		spawn_local(async move { flag.set(true) });
		assert!(!ran.get());

		// Act
		run_until_stalled();

		// Assert
		assert!(ran.get());
	}

	#[rstest]
	fn test_task_spawned_from_task_also_runs() {
		let count = Rc::new(Cell::new(0));
		let outer = Rc::clone(&count);

		spawn_local(async move {
			outer.set(outer.get() + 1);
			let inner = Rc::clone(&outer);
			spawn_local(async move { inner.set(inner.get() + 1) });
		});
		run_until_stalled();

		assert_eq!(count.get(), 2);
	}
}
