//! # Tether IoC
//!
//! A thread-safe Inversion of Control (IoC) container for Rust with transient
//! and singleton lifetimes, constructor auto-wiring and a service-provider
//! bootstrap phase.
//!
//! ## Core Concepts
//!
//! - **Container**: The registry of bindings. There is no global instance;
//!   whatever needs to resolve services receives the container explicitly, and
//!   every factory is handed the container as its argument.
//! - **Bindings**: `bind` registers a transient factory, `singleton` a factory
//!   whose first instance is cached, and `instance` an already-built value.
//!   Services can be bound as concrete types or as `dyn Trait` objects, and
//!   under an optional name.
//! - **Resolution**: `resolve` returns an `Arc` to the service or an [`Error`].
//!   Circular dependencies are reported as errors, never as stack overflows.
//! - **Auto-wiring**: Types implementing [`Injectable`] (usually through the
//!   [`injectable!`] macro) declare their constructor dependencies and can be
//!   resolved without an explicit binding once registered.
//! - **Service providers**: [`ContainerBuilder`] runs [`ServiceProvider`]s in a
//!   register pass followed by a boot pass.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tether_ioc::{Container, Error};
//!
//! // Define a trait and a concrete implementation.
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: Arc<String>,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     (*self.message).clone()
//!   }
//! }
//!
//! let container = Container::new();
//! container.instance_with_name("greeting_message", String::from("Hello, World!"));
//!
//! // The factory resolves its own dependency from the container it is given.
//! container.try_singleton_trait::<dyn Greeter, Error>(|c| {
//!   let message = c.resolve_with_name::<String>("greeting_message")?;
//!   Ok(Arc::new(EnglishGreeter { message }) as Arc<dyn Greeter>)
//! });
//!
//! let greeter = container.resolve::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//! ```

mod container;
mod core;
mod error;
mod injectable;
mod key;
mod macros;
mod provider;

pub use crate::core::Lifetime;
pub use container::Container;
pub use error::{BoxError, Error, Result};
pub use injectable::{Arguments, Injectable};
pub use key::ServiceKey;
pub use provider::{ContainerBuilder, ServiceProvider};
