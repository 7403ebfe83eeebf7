pub mod executor;
pub mod deployment_runner;

pub use deployment_runner::{DeploymentIterator, DeploymentRunner};
pub use executor::{AlwaysSucceedExecutor, Executor, FailAfterFirstExecutor};
