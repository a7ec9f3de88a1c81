// Domain-layer modules and shared errors/models
pub mod portfolio {
    pub use crate::portfolio::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod policy {
    pub use crate::policy::*;
}

pub mod errors {
    pub use crate::errors::*;
}
