pub(crate) mod artifact;
pub(crate) mod decision;
pub(crate) mod intent;
pub(crate) mod manager;
pub(crate) mod opts;
