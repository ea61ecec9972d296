use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tether_ioc::{Container, ContainerBuilder, Error, Result, ServiceKey, ServiceProvider};

// --- Fixtures ---

type Journal = Arc<Mutex<Vec<String>>>;

struct DatabaseConfig {
  url: String,
}

struct Database {
  url: String,
}

struct ConfigProvider {
  journal: Journal,
}

impl ServiceProvider for ConfigProvider {
  fn name(&self) -> &str {
    "config"
  }

  fn register(&self, container: &Container) -> Result<()> {
    self.journal.lock().unwrap().push("config:register".into());
    container.instance(DatabaseConfig {
      url: "postgres://localhost/blog".into(),
    });
    Ok(())
  }

  fn boot(&self, _container: &Container) -> Result<()> {
    self.journal.lock().unwrap().push("config:boot".into());
    Ok(())
  }
}

struct DatabaseProvider {
  journal: Journal,
}

impl ServiceProvider for DatabaseProvider {
  fn name(&self) -> &str {
    "database"
  }

  fn register(&self, container: &Container) -> Result<()> {
    self.journal.lock().unwrap().push("database:register".into());
    container.try_singleton(|c| -> Result<Database> {
      let config = c.resolve::<DatabaseConfig>()?;
      Ok(Database {
        url: config.url.clone(),
      })
    });
    Ok(())
  }

  fn boot(&self, container: &Container) -> Result<()> {
    // Booting may resolve services registered by any provider.
    let database = container.resolve::<Database>()?;
    self
      .journal
      .lock()
      .unwrap()
      .push(format!("database:boot {}", database.url));
    Ok(())
  }
}

// --- Tests ---

#[test]
fn test_register_runs_for_all_providers_before_boot() {
  let journal = Journal::default();

  // The database provider comes first but depends on the config provider.
  let container = ContainerBuilder::new()
    .provider(DatabaseProvider {
      journal: Arc::clone(&journal),
    })
    .provider(ConfigProvider {
      journal: Arc::clone(&journal),
    })
    .build()
    .unwrap();

  assert_eq!(
    *journal.lock().unwrap(),
    vec![
      "database:register".to_string(),
      "config:register".to_string(),
      "database:boot postgres://localhost/blog".to_string(),
      "config:boot".to_string(),
    ]
  );
  assert_eq!(
    container.resolve::<Database>().unwrap().url,
    "postgres://localhost/blog"
  );
}

#[test]
fn test_boot_failure_names_the_provider() {
  let journal = Journal::default();

  let err = ContainerBuilder::new()
    .provider(DatabaseProvider {
      journal: Arc::clone(&journal),
    })
    .build()
    .err()
    .unwrap();

  match &err {
    Error::Provider {
      provider,
      phase,
      source,
    } => {
      assert_eq!(provider, "database");
      assert_eq!(*phase, "boot");
      assert!(matches!(
        **source,
        Error::UnresolvableDependency { .. }
      ));
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(err.key(), Some(&ServiceKey::of::<DatabaseConfig>()));
}

#[test]
fn test_register_failure_stops_the_build() {
  struct Failing;

  impl ServiceProvider for Failing {
    fn register(&self, container: &Container) -> Result<()> {
      container.resolve::<DatabaseConfig>()?;
      Ok(())
    }
  }

  let journal = Journal::default();
  let result = ContainerBuilder::new()
    .provider(Failing)
    .provider(ConfigProvider {
      journal: Arc::clone(&journal),
    })
    .build();

  match result {
    Err(Error::Provider {
      provider, phase, ..
    }) => {
      // The default name is the provider's type name.
      assert!(provider.ends_with("Failing"));
      assert_eq!(phase, "register");
    }
    _ => panic!("expected a provider error"),
  }
  assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn test_providers_can_extend_an_existing_container() {
  let journal = Journal::default();
  let container = Container::new();
  container.instance_with_name("environment", String::from("staging"));

  let container = ContainerBuilder::with_container(container)
    .provider(ConfigProvider {
      journal: Arc::clone(&journal),
    })
    .build()
    .unwrap();

  assert_eq!(
    *container.resolve_with_name::<String>("environment").unwrap(),
    "staging"
  );
  assert!(container.is_bound::<DatabaseConfig>());
}
