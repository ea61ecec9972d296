use crate::key::ServiceKey;
use thiserror::Error;

/// A boxed error produced by a user-supplied factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by container operations.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Unresolvable dependency: no binding or constructor for {key}{}", required_by_suffix(.required_by))]
  UnresolvableDependency {
    key: ServiceKey,
    /// Keys that were being resolved when `key` was requested, outermost first.
    required_by: Vec<ServiceKey>,
  },

  #[error("Circular dependency detected: {}", display_path(.cycle))]
  CircularDependency {
    /// The resolution path from the first occurrence of the repeated key back to itself.
    cycle: Vec<ServiceKey>,
  },

  #[error("Factory for {key} failed: {source}")]
  Factory {
    key: ServiceKey,
    #[source]
    source: BoxError,
  },

  #[error("Requested {requested} from a binding registered as {key}")]
  TypeMismatch {
    key: ServiceKey,
    requested: &'static str,
  },

  #[error(
    "Constructor of {target} requested {requested} at position {position}, but its signature declares {}",
    display_declared(.declared)
  )]
  SignatureMismatch {
    target: ServiceKey,
    position: usize,
    declared: Option<ServiceKey>,
    requested: &'static str,
  },

  #[error("Service provider '{provider}' failed during {phase}: {source}")]
  Provider {
    provider: String,
    phase: &'static str,
    #[source]
    source: Box<Error>,
  },
}

impl Error {
  /// Wraps an error returned by the factory bound to `key`.
  ///
  /// A factory that used `?` on a nested resolution hands back a container
  /// error; that one is propagated as-is instead of being nested.
  pub(crate) fn from_factory(key: &ServiceKey, source: BoxError) -> Self {
    match source.downcast::<Error>() {
      Ok(inner) => *inner,
      Err(source) => Error::Factory {
        key: key.clone(),
        source,
      },
    }
  }

  /// The key this error is about, if any.
  pub fn key(&self) -> Option<&ServiceKey> {
    match self {
      Error::UnresolvableDependency { key, .. }
      | Error::Factory { key, .. }
      | Error::TypeMismatch { key, .. } => Some(key),
      Error::CircularDependency { cycle } => cycle.first(),
      Error::SignatureMismatch { target, .. } => Some(target),
      Error::Provider { source, .. } => source.key(),
    }
  }
}

/// A specialized `Result` type for container operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn display_path(path: &[ServiceKey]) -> String {
  path
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(" -> ")
}

fn display_declared(declared: &Option<ServiceKey>) -> String {
  match declared {
    Some(key) => key.to_string(),
    None => "no further dependency".to_string(),
  }
}

fn required_by_suffix(required_by: &[ServiceKey]) -> String {
  if required_by.is_empty() {
    String::new()
  } else {
    format!(" (required by {})", display_path(required_by))
  }
}
