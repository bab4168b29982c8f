//! Plain request / response data, independent of any transport.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
