pub mod botmodels;
pub mod line;
pub mod main_module;
pub mod shared;
