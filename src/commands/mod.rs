pub(crate) mod build;
pub(crate) mod clean;
pub(crate) mod completion;
pub(crate) mod doctor;
pub(crate) mod plan;
