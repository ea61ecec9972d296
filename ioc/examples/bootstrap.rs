//! A blog backend wired through service providers.
//!
//! Run with `RUST_LOG=tether_ioc=trace` to watch bindings being registered
//! and resolved.

use std::sync::Arc;
use tether_ioc::{injectable, Container, ContainerBuilder, Result, ServiceProvider};
use tracing_subscriber::EnvFilter;

struct Logger {
  prefix: String,
}

impl Logger {
  fn info(&self, message: &str) {
    println!("{} {}", self.prefix, message);
  }
}

struct Publication {
  logger: Arc<Logger>,
  title: String,
}

struct PublicationService {
  logger: Arc<Logger>,
}

impl PublicationService {
  fn new(logger: Arc<Logger>) -> Self {
    Self { logger }
  }

  fn publish(&self, publication: &Publication) {
    self.logger.info(&format!("publishing '{}'", publication.title));
  }
}

injectable!(PublicationService => PublicationService::new(Logger));

struct LoggingProvider;

impl ServiceProvider for LoggingProvider {
  fn name(&self) -> &str {
    "logging"
  }

  fn register(&self, container: &Container) -> Result<()> {
    container.singleton(|_| Logger {
      prefix: "[blog]".to_string(),
    });
    Ok(())
  }
}

struct PublicationProvider;

impl ServiceProvider for PublicationProvider {
  fn name(&self) -> &str {
    "publications"
  }

  fn register(&self, container: &Container) -> Result<()> {
    container.try_bind(|c| -> Result<Publication> {
      Ok(Publication {
        logger: c.resolve()?,
        title: "Building a container from scratch".to_string(),
      })
    });
    container.register::<PublicationService>();
    Ok(())
  }

  fn boot(&self, container: &Container) -> Result<()> {
    container.resolve::<Logger>()?.info("publication provider booted");
    Ok(())
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let container = ContainerBuilder::new()
    .provider(LoggingProvider)
    .provider(PublicationProvider)
    .build()?;

  let first = container.resolve::<Publication>()?;
  let second = container.resolve::<Publication>()?;
  assert!(!Arc::ptr_eq(&first, &second), "publications are transient");
  assert!(
    Arc::ptr_eq(&first.logger, &second.logger),
    "the logger is a singleton"
  );

  let service = container.resolve::<PublicationService>()?;
  service.publish(&first);
  Ok(())
}
