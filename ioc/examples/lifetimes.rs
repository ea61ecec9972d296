//! Transient, singleton and retried singleton bindings for a blog's storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tether_ioc::{Container, Error, Lifetime, ServiceKey};

struct Storage {
  attempt: usize,
}

struct Draft {
  storage: Arc<Storage>,
}

fn main() -> tether_ioc::Result<()> {
  let container = Container::new();

  // The first connection attempt fails; the failure is not cached.
  let attempts = AtomicUsize::new(0);
  container.try_singleton(move |_| -> Result<Storage, String> {
    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
    if attempt == 1 {
      return Err("storage is still starting".to_string());
    }
    Ok(Storage { attempt })
  });
  container.try_bind(|c| -> tether_ioc::Result<Draft> {
    Ok(Draft {
      storage: c.resolve()?,
    })
  });

  match container.resolve::<Draft>() {
    Err(Error::Factory { key, source }) => println!("{key} failed: {source}"),
    Err(other) => return Err(other),
    Ok(_) => panic!("the first attempt should fail"),
  }

  let first = container.resolve::<Draft>()?;
  let second = container.resolve::<Draft>()?;
  println!("storage connected on attempt {}", first.storage.attempt);
  assert!(!Arc::ptr_eq(&first, &second), "drafts are transient");
  assert!(Arc::ptr_eq(&first.storage, &second.storage), "storage is shared");

  let storage = ServiceKey::of::<Storage>();
  let drafts = ServiceKey::of::<Draft>();
  assert_eq!(container.lifetime_of(&storage), Some(Lifetime::Singleton));
  assert_eq!(container.lifetime_of(&drafts), Some(Lifetime::Transient));

  // Forgetting the storage drops the cached connection; drafts can no longer
  // be built until it is bound again.
  container.forget(&storage);
  match container.resolve::<Draft>() {
    Err(err) => println!("after forget: {err}"),
    Ok(_) => panic!("storage should be gone"),
  }

  container.instance(Storage { attempt: 0 });
  println!(
    "rebound storage, draft sees attempt {}",
    container.resolve::<Draft>()?.storage.attempt
  );
  Ok(())
}
