pub mod mapper;
pub mod quantity;
pub mod template;

pub use mapper::{deployment_to_container_group, pod_to_container_group, MapError};
pub use template::{generate_arm_template, ArmTemplate};
