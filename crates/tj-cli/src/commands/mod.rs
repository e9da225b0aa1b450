//! CLI command implementations

pub(crate) mod common;
pub(crate) mod export;
pub(crate) mod import;
pub(crate) mod init;
pub(crate) mod migrate;
pub(crate) mod rollback;
pub(crate) mod status;
