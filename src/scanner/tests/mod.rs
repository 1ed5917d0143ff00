//! Scanner tests over real directory trees

mod helpers;
