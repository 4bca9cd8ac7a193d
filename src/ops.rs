pub mod filter;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod scan;
pub mod start_with;
pub mod take;
pub mod tap;
