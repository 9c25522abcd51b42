mod write;

pub(crate) use write::*;
