//! External service integrations.

pub mod object_store {
    pub use crate::object_store::*;
}
