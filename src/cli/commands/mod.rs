pub mod schemas;
pub mod token;
