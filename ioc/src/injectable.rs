//! Constructor signatures used to auto-wire types that have no explicit binding.

use crate::container::Container;
use crate::core::{downcast, erase, Instance};
use crate::error::{Error, Result};
use crate::key::ServiceKey;
use std::any::{type_name, Any};
use std::collections::VecDeque;
use std::sync::Arc;

/// A type the container can construct by itself.
///
/// `dependencies` declares the keys the constructor needs, in order. The
/// container resolves them depth-first, left to right, and hands them to
/// `construct` through [`Arguments`], which yields them in the same order.
///
/// Most implementations are generated by [`injectable!`](crate::injectable);
/// implement it by hand when a dependency is a named binding.
///
/// ```
/// use std::sync::Arc;
/// use tether_ioc::{Arguments, Container, Injectable, Result, ServiceKey};
///
/// struct Replica {
///   url: Arc<String>,
/// }
///
/// impl Injectable for Replica {
///   fn dependencies() -> Vec<ServiceKey> {
///     vec![ServiceKey::named::<String>("replica_url")]
///   }
///
///   fn construct(args: &mut Arguments) -> Result<Self> {
///     Ok(Replica { url: args.take()? })
///   }
/// }
///
/// let container = Container::new();
/// container.instance_with_name("replica_url", String::from("postgres://replica"));
/// let replica = container.build::<Replica>().unwrap();
/// assert_eq!(*replica.url, "postgres://replica");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
  /// The keys of the constructor's parameters, in declaration order.
  fn dependencies() -> Vec<ServiceKey>;

  /// Builds the instance from its resolved dependencies.
  fn construct(args: &mut Arguments) -> Result<Self>;
}

/// The resolved dependencies of a constructor, consumed positionally.
pub struct Arguments {
  target: ServiceKey,
  position: usize,
  values: VecDeque<(ServiceKey, Instance)>,
}

impl Arguments {
  /// Resolves every dependency of `target` through `container`, in order.
  pub(crate) fn resolve(
    container: &Container,
    target: ServiceKey,
    dependencies: &[ServiceKey],
  ) -> Result<Self> {
    let mut values = VecDeque::with_capacity(dependencies.len());
    for dependency in dependencies {
      let instance = container.resolve_erased(dependency)?;
      values.push_back((dependency.clone(), instance));
    }
    Ok(Self {
      target,
      position: 0,
      values,
    })
  }

  /// Takes the next dependency, which must have been declared as a `D`.
  pub fn take<D: ?Sized + Any + Send + Sync>(&mut self) -> Result<Arc<D>> {
    let position = self.position;
    let Some((key, instance)) = self.values.pop_front() else {
      return Err(Error::SignatureMismatch {
        target: self.target.clone(),
        position,
        declared: None,
        requested: type_name::<D>(),
      });
    };
    if !key.is::<D>() {
      return Err(Error::SignatureMismatch {
        target: self.target.clone(),
        position,
        declared: Some(key),
        requested: type_name::<D>(),
      });
    }
    self.position += 1;
    downcast::<D>(&key, &instance)
  }

  /// Number of dependencies not taken yet.
  pub fn remaining(&self) -> usize {
    self.values.len()
  }

  /// The type being constructed.
  pub fn target(&self) -> &ServiceKey {
    &self.target
  }
}

/// An entry of a container's constructor table.
pub(crate) struct Constructor {
  dependencies: Vec<ServiceKey>,
  construct: fn(&mut Arguments) -> Result<Instance>,
}

impl Constructor {
  pub(crate) fn of<T: Injectable>() -> Self {
    Self {
      dependencies: T::dependencies(),
      construct: construct_erased::<T>,
    }
  }

  pub(crate) fn dependencies(&self) -> &[ServiceKey] {
    &self.dependencies
  }

  pub(crate) fn construct(&self, container: &Container, target: &ServiceKey) -> Result<Instance> {
    let mut args = Arguments::resolve(container, target.clone(), &self.dependencies)?;
    (self.construct)(&mut args)
  }
}

fn construct_erased<T: Injectable>(args: &mut Arguments) -> Result<Instance> {
  T::construct(args).map(erase)
}
