pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

pub type DeploymentImpl = local_deployment::LocalDeployment;
