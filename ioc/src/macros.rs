//! Public macros for declaring constructor signatures.

/// Implements [`Injectable`](crate::Injectable) for a type from its constructor.
///
/// The constructor is called with one `Arc` per listed dependency, in the
/// listed order. Dependencies may be concrete types or `dyn Trait` objects;
/// for named bindings implement `Injectable` by hand.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tether_ioc::{injectable, Container};
///
/// trait Clock: Send + Sync {
///   fn now(&self) -> u64;
/// }
/// struct FixedClock;
/// impl Clock for FixedClock {
///   fn now(&self) -> u64 { 42 }
/// }
///
/// struct Settings {
///   retries: u32,
/// }
///
/// struct Scheduler {
///   clock: Arc<dyn Clock>,
///   settings: Arc<Settings>,
/// }
///
/// impl Scheduler {
///   fn new(clock: Arc<dyn Clock>, settings: Arc<Settings>) -> Self {
///     Self { clock, settings }
///   }
/// }
///
/// injectable!(Scheduler => Scheduler::new(dyn Clock, Settings));
///
/// let container = Container::new();
/// container.singleton_trait::<dyn Clock>(|_| Arc::new(FixedClock));
/// container.instance(Settings { retries: 3 });
/// container.register::<Scheduler>();
///
/// let scheduler = container.resolve::<Scheduler>().unwrap();
/// assert_eq!(scheduler.clock.now(), 42);
/// assert_eq!(scheduler.settings.retries, 3);
/// ```
#[macro_export]
macro_rules! injectable {
  ($target:ty => $($ctor:ident)::+ ( $($dep:ty),* $(,)? )) => {
    impl $crate::Injectable for $target {
      fn dependencies() -> ::std::vec::Vec<$crate::ServiceKey> {
        ::std::vec![$($crate::ServiceKey::of::<$dep>()),*]
      }

      #[allow(unused_variables)]
      fn construct(args: &mut $crate::Arguments) -> $crate::Result<Self> {
        ::std::result::Result::Ok($($ctor)::+($(args.take::<$dep>()?),*))
      }
    }
  };
}
