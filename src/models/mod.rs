pub mod enums;
pub mod operation;
pub mod deployment;

pub use deployment::{ComponentVersionLog, DeploymentLog, OperationLog};
pub use enums::{DeploymentStateEnum, DeploymentTypeEnum, FilterTypeEnum, OperationStateEnum};
pub use operation::Operation;
