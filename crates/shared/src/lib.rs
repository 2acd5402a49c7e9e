//! Mason wire shapes and error types shared by the admin client and the sensorhub fixture.

pub mod domain;
pub mod error;
pub mod protocol;
