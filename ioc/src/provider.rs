//! Service providers and the bootstrap phase that runs them.

use crate::container::Container;
use crate::error::{Error, Result};
use tracing::debug;

/// A unit of bootstrap logic that registers related services.
///
/// Providers run in two passes: every provider's `register` runs first, then
/// every provider's `boot`. `register` should only bind; `boot` may resolve
/// anything registered by any provider.
pub trait ServiceProvider: Send + Sync {
  /// A name used in diagnostics and in [`Error::Provider`].
  fn name(&self) -> &str {
    std::any::type_name::<Self>()
  }

  fn register(&self, container: &Container) -> Result<()>;

  fn boot(&self, _container: &Container) -> Result<()> {
    Ok(())
  }
}

/// Builds a container by running a list of [`ServiceProvider`]s.
///
/// ```
/// use tether_ioc::{Container, ContainerBuilder, Result, ServiceProvider};
///
/// struct ConfigProvider;
///
/// impl ServiceProvider for ConfigProvider {
///   fn register(&self, container: &Container) -> Result<()> {
///     container.instance_with_name("database_url", String::from("postgres://localhost/app"));
///     Ok(())
///   }
/// }
///
/// let container = ContainerBuilder::new().provider(ConfigProvider).build().unwrap();
/// let url = container.resolve_with_name::<String>("database_url").unwrap();
/// assert_eq!(*url, "postgres://localhost/app");
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
  container: Container,
  providers: Vec<Box<dyn ServiceProvider>>,
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs the providers against an existing container instead of a fresh one.
  pub fn with_container(container: Container) -> Self {
    Self {
      container,
      providers: Vec::new(),
    }
  }

  /// Appends a provider. Providers run in insertion order.
  pub fn provider(mut self, provider: impl ServiceProvider + 'static) -> Self {
    self.providers.push(Box::new(provider));
    self
  }

  /// Runs `register` on every provider, then `boot` on every provider, and
  /// returns the populated container.
  pub fn build(self) -> Result<Container> {
    for provider in &self.providers {
      debug!(provider = provider.name(), "registering service provider");
      provider
        .register(&self.container)
        .map_err(|err| provider_error(provider.as_ref(), "register", err))?;
    }

    for provider in &self.providers {
      debug!(provider = provider.name(), "booting service provider");
      provider
        .boot(&self.container)
        .map_err(|err| provider_error(provider.as_ref(), "boot", err))?;
    }

    debug!(
      providers = self.providers.len(),
      bindings = self.container.len(),
      "container bootstrapped"
    );
    Ok(self.container)
  }
}

fn provider_error(provider: &dyn ServiceProvider, phase: &'static str, source: Error) -> Error {
  Error::Provider {
    provider: provider.name().to_owned(),
    phase,
    source: Box::new(source),
  }
}
