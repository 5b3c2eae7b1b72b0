pub mod run;
pub mod show;
pub mod validate;
pub mod version;
