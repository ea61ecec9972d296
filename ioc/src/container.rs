//! The main `Container` struct and its associated methods.

use crate::core::{
  downcast, erase, erase_shared, Factory, Lifetime, Provider, ResolutionGuard, SingletonTracker,
};
use crate::error::{BoxError, Error, Result};
use crate::injectable::{Arguments, Constructor, Injectable};
use crate::key::ServiceKey;
use dashmap::DashMap;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicUsize = AtomicUsize::new(1);

/// The Inversion of Control (IoC) container.
///
/// This struct holds the bindings for all services plus the constructor table
/// used to auto-wire unbound types. It is `Send + Sync`; registration and
/// resolution both take `&self` and may happen from any thread.
///
/// Factories receive the container as their argument, so they can resolve
/// their own dependencies:
///
/// ```
/// use std::sync::Arc;
/// use tether_ioc::Container;
///
/// struct Logger;
/// struct Publication {
///   logger: Arc<Logger>,
/// }
///
/// let container = Container::new();
/// container.singleton(|_| Logger);
/// container.try_bind(|c| -> tether_ioc::Result<Publication> {
///   Ok(Publication { logger: c.resolve()? })
/// });
///
/// let first = container.resolve::<Publication>().unwrap();
/// let second = container.resolve::<Publication>().unwrap();
/// assert!(!Arc::ptr_eq(&first, &second));
/// assert!(Arc::ptr_eq(&first.logger, &second.logger));
/// ```
pub struct Container {
  id: usize,
  providers: DashMap<ServiceKey, Arc<Provider>>,
  constructors: DashMap<ServiceKey, Arc<Constructor>>,
  singletons: SingletonTracker,
}

impl Default for Container {
  fn default() -> Self {
    Self {
      id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
      providers: DashMap::new(),
      constructors: DashMap::new(),
      singletons: SingletonTracker::default(),
    }
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  pub(crate) fn singletons(&self) -> &SingletonTracker {
    &self.singletons
  }

  fn insert(&self, key: ServiceKey, provider: Provider) {
    let lifetime = provider.lifetime();
    // Replacing the whole entry also drops any cached singleton of the old binding.
    let replaced = self.providers.insert(key.clone(), Arc::new(provider)).is_some();
    debug!(key = %key, ?lifetime, replaced, "binding registered");
  }

  fn infallible<T, F>(factory: F) -> Factory
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> T + Send + Sync + 'static,
  {
    Box::new(move |container| Ok(erase(factory(container))))
  }

  fn fallible<T, E, F>(key: ServiceKey, factory: F) -> Factory
  where
    T: Any + Send + Sync,
    E: Into<BoxError>,
    F: Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  {
    Box::new(move |container| {
      factory(container)
        .map(erase)
        .map_err(|err| Error::from_factory(&key, err.into()))
    })
  }

  fn shared<I, F>(factory: F) -> Factory
  where
    I: ?Sized + Any + Send + Sync,
    F: Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  {
    Box::new(move |container| Ok(erase_shared(factory(container))))
  }

  fn fallible_shared<I, E, F>(key: ServiceKey, factory: F) -> Factory
  where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
    F: Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  {
    Box::new(move |container| {
      factory(container)
        .map(erase_shared)
        .map_err(|err| Error::from_factory(&key, err.into()))
    })
  }

  fn bind_internal<T: Any + Send + Sync>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    let key = ServiceKey::for_name::<T>(name);
    self.insert(key, Provider::Transient {
      factory: Self::infallible(factory),
    });
  }

  fn try_bind_internal<T, E>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  ) where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    let key = ServiceKey::for_name::<T>(name);
    let factory = Self::fallible(key.clone(), factory);
    self.insert(key, Provider::Transient { factory });
  }

  fn singleton_internal<T: Any + Send + Sync>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    let key = ServiceKey::for_name::<T>(name);
    self.insert(key, Provider::singleton(Self::infallible(factory)));
  }

  fn try_singleton_internal<T, E>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  ) where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    let key = ServiceKey::for_name::<T>(name);
    let factory = Self::fallible(key.clone(), factory);
    self.insert(key, Provider::singleton(factory));
  }

  fn instance_internal<T: Any + Send + Sync>(&self, name: Option<&str>, value: T) {
    let key = ServiceKey::for_name::<T>(name);
    self.insert(key, Provider::Instance { value: erase(value) });
  }

  fn bind_trait_internal<I: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    let key = ServiceKey::for_name::<I>(name);
    self.insert(key, Provider::Transient {
      factory: Self::shared(factory),
    });
  }

  fn singleton_trait_internal<I: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    let key = ServiceKey::for_name::<I>(name);
    self.insert(key, Provider::singleton(Self::shared(factory)));
  }

  fn try_bind_trait_internal<I, E>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    let key = ServiceKey::for_name::<I>(name);
    let factory = Self::fallible_shared(key.clone(), factory);
    self.insert(key, Provider::Transient { factory });
  }

  fn try_singleton_trait_internal<I, E>(
    &self,
    name: Option<&str>,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    let key = ServiceKey::for_name::<I>(name);
    let factory = Self::fallible_shared(key.clone(), factory);
    self.insert(key, Provider::singleton(factory));
  }

  fn instance_trait_internal<I: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
    value: Arc<I>,
  ) {
    let key = ServiceKey::for_name::<I>(name);
    self.insert(key, Provider::Instance {
      value: erase_shared(value),
    });
  }

  // --- PUBLIC API ---

  // --- Transient Registration ---

  /// Binds `T` to a factory that runs on every resolution.
  pub fn bind<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    self.bind_internal(None, factory);
  }
  /// Like [`bind`](Self::bind), under `name`.
  pub fn bind_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    self.bind_internal(Some(name), factory);
  }

  /// Binds `T` to a fallible factory that runs on every resolution.
  ///
  /// The factory's error reaches the caller of `resolve` as
  /// [`Error::Factory`]; a container error returned through `?` on a nested
  /// resolution is passed through unchanged.
  pub fn try_bind<T, E>(&self, factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static)
  where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_bind_internal(None, factory);
  }
  /// Like [`try_bind`](Self::try_bind), under `name`.
  pub fn try_bind_with_name<T, E>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  ) where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_bind_internal(Some(name), factory);
  }

  // --- Singleton Registration ---

  /// Binds `T` to a factory that runs once; its instance is cached and shared.
  ///
  /// Registering again replaces the factory and discards the cached instance.
  pub fn singleton<T: Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    self.singleton_internal(None, factory);
  }
  /// Like [`singleton`](Self::singleton), under `name`.
  pub fn singleton_with_name<T: Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> T + Send + Sync + 'static,
  ) {
    self.singleton_internal(Some(name), factory);
  }

  /// Binds `T` to a fallible singleton factory.
  ///
  /// A failed attempt caches nothing and the next resolution runs the factory
  /// again. Whatever side effects a failed attempt leaves behind are the
  /// factory's own concern, so factories used here should be safe to retry.
  pub fn try_singleton<T, E>(
    &self,
    factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  ) where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_singleton_internal(None, factory);
  }
  /// Like [`try_singleton`](Self::try_singleton), under `name`.
  pub fn try_singleton_with_name<T, E>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Result<T, E> + Send + Sync + 'static,
  ) where
    T: Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_singleton_internal(Some(name), factory);
  }

  // --- Instance Registration ---

  /// Binds an already constructed value. Every resolution of `T` returns it.
  pub fn instance<T: Any + Send + Sync>(&self, value: T) {
    self.instance_internal(None, value);
  }
  /// Like [`instance`](Self::instance), under `name`.
  pub fn instance_with_name<T: Any + Send + Sync>(&self, name: &str, value: T) {
    self.instance_internal(Some(name), value);
  }

  // --- Trait Registration ---
  //
  // Trait objects are keyed by the `dyn Trait` type itself, so the factory
  // returns the `Arc<dyn Trait>` that resolution hands out.

  /// Binds the abstraction `I` (usually `dyn Trait`) to a transient factory.
  pub fn bind_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    self.bind_trait_internal(None, factory);
  }
  /// Like [`bind_trait`](Self::bind_trait), under `name`.
  pub fn bind_trait_with_name<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    self.bind_trait_internal(Some(name), factory);
  }

  /// Binds the abstraction `I` to a singleton factory.
  pub fn singleton_trait<I: ?Sized + Any + Send + Sync>(
    &self,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    self.singleton_trait_internal(None, factory);
  }
  /// Like [`singleton_trait`](Self::singleton_trait), under `name`.
  pub fn singleton_trait_with_name<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Arc<I> + Send + Sync + 'static,
  ) {
    self.singleton_trait_internal(Some(name), factory);
  }

  /// Fallible counterpart of [`bind_trait`](Self::bind_trait).
  pub fn try_bind_trait<I, E>(
    &self,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_bind_trait_internal(None, factory);
  }
  /// Like [`try_bind_trait`](Self::try_bind_trait), under `name`.
  pub fn try_bind_trait_with_name<I, E>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_bind_trait_internal(Some(name), factory);
  }

  /// Fallible counterpart of [`singleton_trait`](Self::singleton_trait),
  /// retried after a failure like [`try_singleton`](Self::try_singleton).
  pub fn try_singleton_trait<I, E>(
    &self,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_singleton_trait_internal(None, factory);
  }
  /// Like [`try_singleton_trait`](Self::try_singleton_trait), under `name`.
  pub fn try_singleton_trait_with_name<I, E>(
    &self,
    name: &str,
    factory: impl Fn(&Container) -> Result<Arc<I>, E> + Send + Sync + 'static,
  ) where
    I: ?Sized + Any + Send + Sync,
    E: Into<BoxError>,
  {
    self.try_singleton_trait_internal(Some(name), factory);
  }

  /// Binds an existing `Arc<I>` as the abstraction `I`.
  pub fn instance_trait<I: ?Sized + Any + Send + Sync>(&self, value: Arc<I>) {
    self.instance_trait_internal(None, value);
  }
  /// Like [`instance_trait`](Self::instance_trait), under `name`.
  pub fn instance_trait_with_name<I: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
    value: Arc<I>,
  ) {
    self.instance_trait_internal(Some(name), value);
  }

  // --- Auto-wiring ---

  /// Adds `T` to the constructor table, so resolving `T` without a binding
  /// builds it from its declared dependencies.
  ///
  /// Auto-wired instances are transient. An explicit binding for `T` always
  /// takes precedence.
  pub fn register<T: Injectable>(&self) {
    let key = ServiceKey::of::<T>();
    let constructor = Constructor::of::<T>();
    debug!(
      key = %key,
      dependencies = constructor.dependencies().len(),
      "constructor registered"
    );
    self.constructors.insert(key, Arc::new(constructor));
  }

  /// Constructs a fresh `T` from its declared dependencies.
  ///
  /// Neither a binding for `T` nor a prior [`register`](Self::register) is
  /// needed; only the dependencies are resolved through the container.
  pub fn build<T: Injectable>(&self) -> Result<T> {
    let key = ServiceKey::of::<T>();
    let _guard = ResolutionGuard::enter(self.id, &key)?;
    trace!(key = %key, "building injectable");
    let mut args = Arguments::resolve(self, key, &T::dependencies())?;
    T::construct(&mut args)
  }

  // --- Resolution ---

  /// Resolves the unnamed service `T`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve_key(&ServiceKey::of::<T>())
  }

  /// Resolves `T` registered under `name`.
  pub fn resolve_with_name<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve_key(&ServiceKey::named::<T>(name))
  }

  /// Resolves the service registered under `key` as a `T`.
  ///
  /// Fails with [`Error::TypeMismatch`] when `key` does not denote a `T`.
  pub fn resolve_key<T: ?Sized + Any + Send + Sync>(&self, key: &ServiceKey) -> Result<Arc<T>> {
    if !key.is::<T>() {
      return Err(Error::TypeMismatch {
        key: key.clone(),
        requested: std::any::type_name::<T>(),
      });
    }
    let instance = self.resolve_erased(key)?;
    downcast::<T>(key, &instance)
  }

  pub(crate) fn resolve_erased(&self, key: &ServiceKey) -> Result<crate::core::Instance> {
    let guard = ResolutionGuard::enter(self.id, key)?;

    // Clone the entry out so no shard lock is held while factories run.
    let provider = self.providers.get(key).map(|entry| Arc::clone(entry.value()));
    if let Some(provider) = provider {
      return provider.provide(self, key);
    }

    let constructor = self
      .constructors
      .get(key)
      .map(|entry| Arc::clone(entry.value()));
    match constructor {
      Some(constructor) => {
        trace!(key = %key, "auto-wiring unbound service");
        constructor.construct(self, key)
      }
      None => Err(Error::UnresolvableDependency {
        key: key.clone(),
        required_by: guard.ancestors(),
      }),
    }
  }

  // --- Introspection ---

  /// Whether an explicit binding exists for the unnamed `T`.
  pub fn is_bound<T: ?Sized + Any>(&self) -> bool {
    self.is_bound_key(&ServiceKey::of::<T>())
  }

  /// Whether an explicit binding exists under `key`.
  pub fn is_bound_key(&self, key: &ServiceKey) -> bool {
    self.providers.contains_key(key)
  }

  /// Whether `T` is in the constructor table.
  pub fn is_registered<T: Injectable>(&self) -> bool {
    self.constructors.contains_key(&ServiceKey::of::<T>())
  }

  /// The lifetime of the binding under `key`, if one exists.
  pub fn lifetime_of(&self, key: &ServiceKey) -> Option<Lifetime> {
    self.providers.get(key).map(|entry| entry.value().lifetime())
  }

  /// Removes the binding under `key`, discarding any cached instance.
  ///
  /// Returns `false` if nothing was bound.
  pub fn forget(&self, key: &ServiceKey) -> bool {
    let removed = self.providers.remove(key).is_some();
    if removed {
      debug!(key = %key, "binding forgotten");
    }
    removed
  }

  /// The number of explicit bindings.
  pub fn len(&self) -> usize {
    self.providers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.providers.is_empty()
  }
}
