pub mod packet;   // Telegram framing and message dispatch
pub mod requests; // Captured request telegrams and metric mapping
pub mod serial;   // RS485 transport
pub mod value;    // Field decoders (packed floats, version block)
