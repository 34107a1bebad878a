pub(crate) mod backend;
pub(crate) mod capture;
pub(crate) mod damage;
pub(crate) mod hardware;
pub(crate) mod headless;
