//! Command handlers grouped by concern.

pub(crate) mod alerts;
pub(crate) mod login;
pub(crate) mod parsers;
pub(crate) mod repos;
pub(crate) mod search;
pub(crate) mod status;
pub(crate) mod tokens;
pub(crate) mod users;
