// Domain layer: card configuration, the broadcast-service port and the stable selectors.

pub mod model;
pub mod ports;
