// Domain layer: bouquet document model and the ports the session talks through.

pub mod model;
pub mod ports;
