// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod ficha {
    pub use crate::ficha::*;
}

pub mod lead_capture {
    pub use crate::lead_capture::*;
}
