//! Several feeds of the same type, told apart by name.

use std::sync::Arc;
use tether_ioc::{Container, Result};

trait Feed: Send + Sync {
  fn render(&self, title: &str) -> String;
}

struct Rss;
impl Feed for Rss {
  fn render(&self, title: &str) -> String {
    format!("<item><title>{title}</title></item>")
  }
}

struct Atom;
impl Feed for Atom {
  fn render(&self, title: &str) -> String {
    format!("<entry><title>{title}</title></entry>")
  }
}

struct Syndication {
  feeds: Vec<Arc<dyn Feed>>,
}

fn main() -> Result<()> {
  let container = Container::new();

  container.instance_with_name("site_title", String::from("Notes on containers"));
  container.singleton_trait_with_name::<dyn Feed>("rss", |_| Arc::new(Rss));
  container.singleton_trait_with_name::<dyn Feed>("atom", |_| Arc::new(Atom));
  container.try_bind(|c| -> Result<Syndication> {
    Ok(Syndication {
      feeds: vec![
        c.resolve_with_name::<dyn Feed>("rss")?,
        c.resolve_with_name::<dyn Feed>("atom")?,
      ],
    })
  });

  let title = container.resolve_with_name::<String>("site_title")?;
  let syndication = container.resolve::<Syndication>()?;
  for feed in &syndication.feeds {
    println!("{}", feed.render(&title));
  }

  // The unnamed key is a separate binding and stays unbound.
  assert!(container.resolve::<dyn Feed>().is_err());
  Ok(())
}
