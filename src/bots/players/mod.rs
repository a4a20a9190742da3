pub mod randy;
pub mod sweeper;
