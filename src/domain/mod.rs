// Domain layer: monitor model and the ports the store/prober adapters implement.

pub mod model;
pub mod ports;
