//! Service test support.

mod context;
mod db;

pub(crate) use context::TestContext;
