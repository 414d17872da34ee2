pub mod instances;

pub use instances::InstancesDataSource;
