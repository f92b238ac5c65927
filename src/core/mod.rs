// Core modules: row envelope, shape checks, remapping, cursor, and error modeling.
pub mod cursor;
pub mod decode;
pub mod error;
pub mod page;
pub mod request;
pub mod schema;
pub mod transform;
