pub mod buffered;
pub mod event_stream;

pub use buffered::{relay, relay_response};
pub use event_stream::{format_data_frame, format_error_frame, relay_as_event};
