mod build;
mod locate;

pub use build::run as build;
pub use locate::run as locate;
