use std::sync::Arc;
use tether_ioc::{injectable, Container};

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn new(logger: Arc<dyn Logger>) -> Self {
    Self { logger }
  }

  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

// ReportService declares its constructor dependency instead of being bound.
injectable!(ReportService => ReportService::new(dyn Logger));

fn main() -> tether_ioc::Result<()> {
  let container = Container::new();

  // --- Registration ---
  // The container stores Arc<ConsoleLogger> but serves it as Arc<dyn Logger>.
  container.singleton_trait::<dyn Logger>(|_| Arc::new(ConsoleLogger));
  container.register::<ReportService>();

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = container.resolve::<ReportService>()?;

  println!("Using the service...");
  report_service.generate_report();
  Ok(())
}
