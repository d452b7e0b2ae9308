/// Round lifecycle glue used by the UI: start, resume, discard and history.
pub mod round_service;
/// Current-weather lookup at round start.
pub mod weather_service;
