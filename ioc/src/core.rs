//! Core, non-public data structures for the IoC container.

use crate::container::Container;
use crate::error::{Error, Result};
use crate::key::ServiceKey;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

/// A type-erased resolved service. The erased value is always an `Arc<T>`
/// (or `Arc<dyn Trait>`), so handing out another reference never needs to
/// know `T`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Box<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

pub(crate) fn erase<T: Any + Send + Sync>(value: T) -> Instance {
  Arc::new(Arc::new(value))
}

pub(crate) fn erase_shared<I: ?Sized + Any + Send + Sync>(value: Arc<I>) -> Instance {
  Arc::new(value)
}

pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(
  key: &ServiceKey,
  instance: &Instance,
) -> Result<Arc<T>> {
  instance
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or_else(|| Error::TypeMismatch {
      key: key.clone(),
      requested: std::any::type_name::<T>(),
    })
}

thread_local! {
  // Keys currently being resolved on this thread, tagged with the id of the
  // container resolving them. Nested guards push and pop in strict LIFO order.
  static RESOLVING_STACK: RefCell<Vec<(usize, ServiceKey)>> = RefCell::new(Vec::new());
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes the key onto the thread-local resolution stack, or fails
/// with [`Error::CircularDependency`] if the same container is already
/// resolving that key further up. Dropping the guard pops the key again, so
/// the stack is empty once a top-level resolution returns, whether it
/// succeeded or not.
pub(crate) struct ResolutionGuard {
  container: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(container: usize, key: &ServiceKey) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let first = stack
        .iter()
        .position(|(owner, resolving)| *owner == container && resolving == key);

      if let Some(first) = first {
        let mut cycle: Vec<ServiceKey> = stack[first..]
          .iter()
          .filter(|(owner, _)| *owner == container)
          .map(|(_, resolving)| resolving.clone())
          .collect();
        cycle.push(key.clone());
        return Err(Error::CircularDependency { cycle });
      }

      stack.push((container, key.clone()));
      Ok(Self { container })
    })
  }

  /// Keys of this container being resolved above the guarded one, outermost first.
  pub(crate) fn ancestors(&self) -> Vec<ServiceKey> {
    RESOLVING_STACK.with(|stack| {
      let stack = stack.borrow();
      let above = stack.len().saturating_sub(1);
      stack[..above]
        .iter()
        .filter(|(owner, _)| *owner == self.container)
        .map(|(_, key)| key.clone())
        .collect()
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

/// Cross-thread bookkeeping for singleton construction.
///
/// The thread-local stack only sees cycles that close on one thread. When two
/// threads each start a singleton whose factory needs the other's, both would
/// block on the other's cell forever. This tracker records which thread runs
/// each in-flight singleton factory and which key every blocked thread waits
/// on, so a thread about to block can follow the wait-for chain and fail with
/// [`Error::CircularDependency`] when the chain leads back to itself.
#[derive(Default)]
pub(crate) struct SingletonTracker {
  initializing: DashMap<ServiceKey, ThreadId>,
  waiting: DashMap<ThreadId, ServiceKey>,
}

impl SingletonTracker {
  /// Records that the current thread is about to wait on `key`, then fails if
  /// doing so would close a cycle with other threads.
  ///
  /// The wait is recorded before the chain is read. Of two threads closing a
  /// cycle, at least one therefore sees the other's record.
  fn wait_for(&self, key: &ServiceKey) -> Result<WaitGuard<'_>> {
    let current = thread::current().id();
    self.waiting.insert(current, key.clone());
    let guard = WaitGuard {
      tracker: self,
      thread: current,
    };

    let mut path = vec![key.clone()];
    let mut visited = HashSet::new();
    let mut next = key.clone();
    loop {
      let Some(owner) = self.initializing.get(&next).map(|entry| *entry.value()) else {
        return Ok(guard);
      };
      if owner == current {
        let mut cycle = Vec::with_capacity(path.len() + 1);
        cycle.push(next);
        cycle.extend(path);
        debug!(key = %key, "singleton wait would close a cycle across threads");
        return Err(Error::CircularDependency { cycle });
      }
      if !visited.insert(owner) {
        return Ok(guard);
      }
      let Some(blocked_on) = self.waiting.get(&owner).map(|entry| entry.value().clone()) else {
        return Ok(guard);
      };
      path.push(blocked_on.clone());
      next = blocked_on;
    }
  }

  /// Marks the current thread as the one running the factory for `key`.
  fn begin(&self, key: &ServiceKey) -> InitGuard<'_> {
    let current = thread::current().id();
    self.waiting.remove(&current);
    self.initializing.insert(key.clone(), current);
    InitGuard {
      tracker: self,
      key: key.clone(),
    }
  }
}

struct WaitGuard<'a> {
  tracker: &'a SingletonTracker,
  thread: ThreadId,
}

impl Drop for WaitGuard<'_> {
  fn drop(&mut self) {
    self.tracker.waiting.remove(&self.thread);
  }
}

struct InitGuard<'a> {
  tracker: &'a SingletonTracker,
  key: ServiceKey,
}

impl Drop for InitGuard<'_> {
  fn drop(&mut self) {
    self.tracker.initializing.remove(&self.key);
  }
}

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
  /// A fresh instance is constructed on every resolution.
  Transient,
  /// One instance is constructed on first resolution and shared afterwards.
  Singleton,
}

pub(crate) enum Provider {
  /// A literal value bound with `instance`.
  Instance { value: Instance },
  /// A factory run at most once; the cell holds its instance after success.
  Singleton {
    cell: OnceCell<Instance>,
    factory: Factory,
  },
  /// A factory run on every resolution.
  Transient { factory: Factory },
}

impl Provider {
  pub(crate) fn singleton(factory: Factory) -> Self {
    Provider::Singleton {
      cell: OnceCell::new(),
      factory,
    }
  }

  pub(crate) fn lifetime(&self) -> Lifetime {
    match self {
      Provider::Instance { .. } | Provider::Singleton { .. } => Lifetime::Singleton,
      Provider::Transient { .. } => Lifetime::Transient,
    }
  }

  pub(crate) fn provide(&self, container: &Container, key: &ServiceKey) -> Result<Instance> {
    match self {
      Provider::Instance { value } => {
        trace!(key = %key, "resolved bound instance");
        Ok(Arc::clone(value))
      }
      Provider::Singleton { cell, factory } => {
        if let Some(cached) = cell.get() {
          trace!(key = %key, "resolved cached singleton");
          return Ok(Arc::clone(cached));
        }
        let tracker = container.singletons();
        let _waiting = tracker.wait_for(key)?;
        // A failed factory leaves the cell empty so the next resolution retries.
        cell
          .get_or_try_init(|| -> Result<Instance> {
            let _init = tracker.begin(key);
            let instance = factory(container)?;
            debug!(key = %key, "singleton constructed and cached");
            Ok(instance)
          })
          .map(Arc::clone)
      }
      Provider::Transient { factory } => {
        trace!(key = %key, "constructing transient instance");
        factory(container)
      }
    }
  }
}
