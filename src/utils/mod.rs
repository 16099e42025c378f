pub mod aws;
pub mod logging;
