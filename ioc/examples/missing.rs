use tether_ioc::{Container, Error};

struct UnregisteredService;

struct Mailer;
struct Newsletter {
  _mailer: std::sync::Arc<Mailer>,
}

fn main() {
  let container = Container::new();

  println!("Attempting to resolve a service that was never registered...");
  match container.resolve::<UnregisteredService>() {
    Err(err @ Error::UnresolvableDependency { .. }) => println!("Correctly failed: {}", err),
    Err(other) => panic!("Unexpected error: {}", other),
    Ok(_) => panic!("Should not have found the service!"),
  }

  // A missing dependency deeper in the graph names the missing key and the
  // chain of services that needed it.
  container.try_bind(|c| -> tether_ioc::Result<Newsletter> {
    Ok(Newsletter {
      _mailer: c.resolve()?,
    })
  });

  println!("\nNow resolving a service whose dependency is missing...");
  match container.resolve::<Newsletter>() {
    Err(err) => println!("Correctly failed: {}", err),
    Ok(_) => panic!("Newsletter has no Mailer to use!"),
  }
}
