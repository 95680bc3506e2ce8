mod decoder_port;
mod work_source_port;

pub use decoder_port::Decoder;
pub use work_source_port::{Action, WorkSource};

#[cfg(test)]
pub mod mocks {
    pub use super::decoder_port::mock::{FakeImage, MockDecoder};
}
