mod byte_io;
mod wrap;

#[cfg(feature = "debug-tools")]
pub(crate) use byte_io::current_offset;
pub(crate) use byte_io::seek_abs;
pub(crate) use wrap::{persist_header, read_wrap, write_wrap};
