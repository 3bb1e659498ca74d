pub mod observability;

pub use observability::ObservabilityMiddleware;
