/// Requests and read models exchanged with the UI layer.
pub mod round;
/// Validation helpers for DTOs.
pub mod validation;
