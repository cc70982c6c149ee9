pub mod read;
pub mod reader;

pub use read::{AlignedRead, CigarOp, ReadFlags};
pub use reader::AlignmentReader;
