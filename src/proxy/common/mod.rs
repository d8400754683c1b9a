// Common helpers shared by the forwarder and middleware

pub mod headers;
pub mod whitelist;
