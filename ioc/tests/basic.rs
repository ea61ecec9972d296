use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tether_ioc::{Container, Error, Lifetime, ServiceKey};

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}

struct GermanGreeter;
impl Greeter for GermanGreeter {
  fn greet(&self) -> String {
    "Hallo!".to_string()
  }
}

#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}

// --- Basic Tests ---

#[test]
fn test_singleton_resolves_the_same_instance() {
  // Arrange
  let runs = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  let counter = Arc::clone(&runs);
  container.singleton(move |_| {
    counter.fetch_add(1, Ordering::SeqCst);
    SimpleService { id: 101 }
  });

  // Act
  let r1 = container.resolve::<SimpleService>().unwrap();
  let r2 = container.resolve::<SimpleService>().unwrap();
  let r3 = container.resolve::<SimpleService>().unwrap();

  // Assert
  assert_eq!(r1.id, 101);
  assert!(Arc::ptr_eq(&r1, &r2));
  assert!(Arc::ptr_eq(&r2, &r3));
  assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_resolves_distinct_instances() {
  // Arrange
  let runs = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  let counter = Arc::clone(&runs);
  container.bind(move |_| SimpleService {
    id: counter.fetch_add(1, Ordering::SeqCst) as u32,
  });

  // Act
  let r1 = container.resolve::<SimpleService>().unwrap();
  let r2 = container.resolve::<SimpleService>().unwrap();

  // Assert
  assert_eq!(r1.id, 0);
  assert_eq!(r2.id, 1);
  assert!(!Arc::ptr_eq(&r1, &r2));
  assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_named_instance_is_shared() {
  // Arrange
  let container = Container::new();
  container.instance_with_name("named_instance", SimpleService { id: 202 });

  // Act
  let r1 = container.resolve_with_name::<SimpleService>("named_instance").unwrap();
  let r2 = container.resolve_with_name::<SimpleService>("named_instance").unwrap();

  // Assert
  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
  // The unnamed key is a different binding.
  assert!(container.resolve::<SimpleService>().is_err());
}

#[test]
fn test_same_type_under_two_names_is_independent() {
  let container = Container::new();
  container.instance_with_name("primary", String::from("postgres://primary"));
  container.singleton_with_name("replica", |_| String::from("postgres://replica"));

  let primary = container.resolve_with_name::<String>("primary").unwrap();
  let replica = container.resolve_with_name::<String>("replica").unwrap();

  assert_eq!(*primary, "postgres://primary");
  assert_eq!(*replica, "postgres://replica");
  assert_eq!(container.len(), 2);
}

#[test]
fn test_unnamed_trait_resolution() {
  // Arrange
  let container = Container::new();
  container.singleton_trait::<dyn Greeter>(|_| Arc::new(EnglishGreeter));

  // Act
  let greeter = container.resolve::<dyn Greeter>().unwrap();

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
fn test_named_trait_resolution() {
  // Arrange
  let container = Container::new();
  container.singleton_trait::<dyn Greeter>(|_| Arc::new(EnglishGreeter));
  container.bind_trait_with_name::<dyn Greeter>("german", |_| Arc::new(GermanGreeter));

  // Act
  let english = container.resolve::<dyn Greeter>().unwrap();
  let german = container.resolve_with_name::<dyn Greeter>("german").unwrap();

  // Assert
  assert_eq!(english.greet(), "Hello!");
  assert_eq!(german.greet(), "Hallo!");
}

#[test]
fn test_instance_trait_resolution() {
  let container = Container::new();
  let greeter: Arc<dyn Greeter> = Arc::new(GermanGreeter);
  container.instance_trait(Arc::clone(&greeter));

  let resolved = container.resolve::<dyn Greeter>().unwrap();
  assert!(Arc::ptr_eq(&greeter, &resolved));
}

#[test]
fn test_named_fallible_and_instance_trait_bindings() {
  let container = Container::new();
  let fixed: Arc<dyn Greeter> = Arc::new(EnglishGreeter);
  container.instance_trait_with_name("fixed", Arc::clone(&fixed));
  container.try_singleton_trait_with_name::<dyn Greeter, Error>("cached", |_| {
    Ok(Arc::new(GermanGreeter) as Arc<dyn Greeter>)
  });
  container.try_bind_trait_with_name::<dyn Greeter, String>("fresh", |_| {
    Ok(Arc::new(GermanGreeter) as Arc<dyn Greeter>)
  });
  container.try_bind_trait_with_name::<dyn Greeter, String>("broken", |_| {
    Err("no greeting configured".to_string())
  });

  let resolved = container.resolve_with_name::<dyn Greeter>("fixed").unwrap();
  assert!(Arc::ptr_eq(&fixed, &resolved));

  let cached = container.resolve_with_name::<dyn Greeter>("cached").unwrap();
  assert!(Arc::ptr_eq(
    &cached,
    &container.resolve_with_name::<dyn Greeter>("cached").unwrap()
  ));

  let fresh = container.resolve_with_name::<dyn Greeter>("fresh").unwrap();
  assert_eq!(fresh.greet(), "Hallo!");
  assert!(!Arc::ptr_eq(
    &fresh,
    &container.resolve_with_name::<dyn Greeter>("fresh").unwrap()
  ));

  match container.resolve_with_name::<dyn Greeter>("broken") {
    Err(Error::Factory { key, source }) => {
      assert_eq!(key, ServiceKey::named::<dyn Greeter>("broken"));
      assert_eq!(source.to_string(), "no greeting configured");
    }
    _ => panic!("expected a factory error"),
  }

  // None of the named bindings stands in for the unnamed one.
  assert!(!container.is_bound::<dyn Greeter>());
  assert_eq!(
    container.lifetime_of(&ServiceKey::named::<dyn Greeter>("fresh")),
    Some(Lifetime::Transient)
  );
  assert_eq!(
    container.lifetime_of(&ServiceKey::named::<dyn Greeter>("cached")),
    Some(Lifetime::Singleton)
  );
}

#[test]
fn test_missing_concrete_service_is_unresolvable() {
  struct MissingService;
  let container = Container::new();

  let err = container.resolve::<MissingService>().err().unwrap();

  match &err {
    Error::UnresolvableDependency { key, required_by } => {
      assert_eq!(*key, ServiceKey::of::<MissingService>());
      assert!(required_by.is_empty());
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(err.to_string().contains("MissingService"));
}

#[test]
fn test_missing_trait_service_is_unresolvable() {
  trait MissingTrait: Send + Sync {}
  let container = Container::new();

  let err = container.resolve::<dyn MissingTrait>().err().unwrap();

  assert!(matches!(err, Error::UnresolvableDependency { .. }));
  assert_eq!(err.key(), Some(&ServiceKey::of::<dyn MissingTrait>()));
}

#[test]
fn test_resolve_key_checks_the_requested_type() {
  let container = Container::new();
  container.instance(7u32);

  let key = ServiceKey::of::<u32>();
  assert_eq!(*container.resolve_key::<u32>(&key).unwrap(), 7);
  assert!(matches!(
    container.resolve_key::<u64>(&key),
    Err(Error::TypeMismatch { .. })
  ));
}

#[test]
fn test_introspection_reports_bindings_and_lifetimes() {
  let container = Container::new();
  assert!(container.is_empty());

  container.bind(|_| SimpleService { id: 1 });
  container.singleton_with_name("cached", |_| SimpleService { id: 2 });
  container.instance(String::from("literal"));

  assert!(container.is_bound::<SimpleService>());
  assert!(!container.is_bound::<u8>());
  assert_eq!(
    container.lifetime_of(&ServiceKey::of::<SimpleService>()),
    Some(Lifetime::Transient)
  );
  assert_eq!(
    container.lifetime_of(&ServiceKey::named::<SimpleService>("cached")),
    Some(Lifetime::Singleton)
  );
  assert_eq!(
    container.lifetime_of(&ServiceKey::of::<String>()),
    Some(Lifetime::Singleton)
  );
  assert_eq!(container.lifetime_of(&ServiceKey::of::<u8>()), None);
  assert_eq!(container.len(), 3);
}

#[test]
fn test_forget_unbinds_a_service() {
  let container = Container::new();
  container.singleton(|_| SimpleService { id: 9 });
  let key = ServiceKey::of::<SimpleService>();
  container.resolve::<SimpleService>().unwrap();

  assert!(container.forget(&key));
  assert!(!container.forget(&key));
  assert!(!container.is_bound_key(&key));
  assert!(matches!(
    container.resolve::<SimpleService>(),
    Err(Error::UnresolvableDependency { .. })
  ));
}
